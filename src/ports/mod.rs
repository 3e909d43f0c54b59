//! Port traits the labeling core depends on.

pub mod candle_port;
pub mod config_port;
pub mod report_port;
pub mod signal_port;
