//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the benefit
//! scheme's rate configuration from YAML files.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{EngineError, EngineResult};

use super::types::{BaseUnitConfig, RateTable, SchemeConfig, SchemeMetadata};

/// Loads and provides access to the rate configuration.
///
/// # Directory Structure
///
/// The configuration directory should have the following structure:
/// ```text
/// config/supplementary/
/// ├── scheme.yaml          # Scheme metadata and rate factors
/// └── base_units/
///     └── 2020-05-01.yaml  # Base unit and guarantee pension from this date
/// ```
///
/// # Example
///
/// ```no_run
/// use benefit_engine::config::ConfigLoader;
/// use benefit_engine::models::RateCategory;
/// use chrono::NaiveDate;
///
/// let loader = ConfigLoader::load("./config/supplementary").unwrap();
/// let date = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
/// let rate = loader.rate_table().monthly_rate(RateCategory::High, date).unwrap();
/// println!("Monthly high rate: {}", rate);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    rate_table: RateTable,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` on success, or an error if:
    /// - Any required file or directory is missing (`ConfigNotFound`)
    /// - Any file contains invalid YAML or misses a field (`ConfigParseError`)
    /// - Two entries share an effective date (`DuplicateRateEntry`)
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let scheme = Self::load_yaml::<SchemeConfig>(&path.join("scheme.yaml"))?;
        let base_units = Self::load_base_units(&path.join("base_units"))?;

        debug!(
            scheme = %scheme.scheme.code,
            base_units = base_units.len(),
            rate_factors = scheme.rate_factors.len(),
            "Loaded rate configuration"
        );

        let rate_table = RateTable::new(scheme.scheme, scheme.rate_factors, base_units)?;
        Ok(Self { rate_table })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Loads all base unit files from the base units directory.
    fn load_base_units(dir: &Path) -> EngineResult<Vec<BaseUnitConfig>> {
        let dir_str = dir.display().to_string();

        let entries = fs::read_dir(dir).map_err(|_| EngineError::ConfigNotFound {
            path: dir_str.clone(),
        })?;

        let mut base_units = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: dir_str.clone(),
            })?;

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                base_units.push(Self::load_yaml::<BaseUnitConfig>(&path)?);
            }
        }

        if base_units.is_empty() {
            return Err(EngineError::ConfigNotFound {
                path: format!("{} (no base unit files found)", dir_str),
            });
        }

        Ok(base_units)
    }

    /// Returns the loaded rate table.
    pub fn rate_table(&self) -> &RateTable {
        &self.rate_table
    }

    /// Consumes the loader, returning the rate table.
    pub fn into_rate_table(self) -> RateTable {
        self.rate_table
    }

    /// Returns the scheme metadata.
    pub fn scheme(&self) -> &SchemeMetadata {
        self.rate_table.scheme()
    }
}
