//! Core domain types and labeling logic.

pub mod barrier;
pub mod candle;
pub mod config_validation;
pub mod error;
pub mod indicator;
pub mod labeling;
pub mod labeling_config;
pub mod metrics;
pub mod pnl;
pub mod position;
pub mod returns;
pub mod signal;
pub mod strategy;
pub mod volatility;
