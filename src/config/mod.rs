//! Configuration loading and management for the benefit engine.
//!
//! This module provides functionality to load the scheme's rate configuration
//! from YAML files: scheme metadata, rate factors, base units and guarantee
//! pension amounts.
//!
//! # Example
//!
//! ```no_run
//! use benefit_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/supplementary").unwrap();
//! println!("Loaded scheme: {}", config.scheme().name);
//! ```

mod loader;
mod types;

#[cfg(test)]
pub(crate) use types::fixtures;

pub use loader::ConfigLoader;
pub use types::{
    BaseUnitConfig, GuaranteePension, GuaranteePensionLevel, RateFactorConfig, RateTable,
    SchemeConfig, SchemeMetadata,
};
