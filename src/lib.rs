//! Supplementary Benefit Calculation Engine
//!
//! This crate calculates a means-tested monthly supplementary benefit over a
//! period: periodizing deductions under household rules, applying the payout
//! minimum and deciding from which month a changed amount takes effect.

#![warn(missing_docs)]

pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
