//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod indicator_helpers;
pub mod features;
pub mod confidence;
pub mod position;
pub mod strategy;
pub mod backtest;
pub mod metrics;
pub mod config_validation;
pub mod error;
