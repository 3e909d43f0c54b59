//! Labeling run parameters.
//!
//! `LabelingConfig` carries everything the triple-barrier core needs:
//! volatility window, barrier multipliers, holding limit, trade cost and
//! account sizing. Defaults match the backtesting dashboard defaults.

use chrono::Duration;

use super::error::LabError;

/// Longest accepted holding period: one hundred years.
pub const MAX_TIME_LIMIT_MINUTES: i64 = 100 * 365 * 24 * 60;

#[derive(Debug, Clone, PartialEq)]
pub struct LabelingConfig {
    pub volatility_window: usize,
    pub tp_multiplier: f64,
    pub sl_multiplier: f64,
    pub time_limit: Duration,
    pub trade_cost: f64,
    pub initial_capital: f64,
    pub leverage: f64,
    pub portfolio_value: f64,
}

impl Default for LabelingConfig {
    fn default() -> Self {
        LabelingConfig {
            volatility_window: 100,
            tp_multiplier: 1.5,
            sl_multiplier: 0.75,
            time_limit: Duration::minutes(500),
            trade_cost: 0.0006,
            initial_capital: 15.0,
            leverage: 20.0,
            portfolio_value: 150.0,
        }
    }
}

impl LabelingConfig {
    /// Take-profit multiplier, or `None` when the barrier is disabled.
    pub fn take_profit(&self) -> Option<f64> {
        (self.tp_multiplier > 0.0).then_some(self.tp_multiplier)
    }

    /// Stop-loss multiplier, or `None` when the barrier is disabled.
    pub fn stop_loss(&self) -> Option<f64> {
        (self.sl_multiplier > 0.0).then_some(self.sl_multiplier)
    }

    /// Check the numeric invariants of a run. Negative or zero multipliers
    /// are not errors; they disable the corresponding barrier.
    pub fn validate(&self) -> Result<(), LabError> {
        if self.volatility_window < 2 {
            return Err(LabError::invalid(
                "labeling",
                "volatility_window",
                "volatility_window must be at least 2",
            ));
        }
        if self.tp_multiplier.is_nan() {
            return Err(LabError::invalid(
                "labeling",
                "tp_multiplier",
                "tp_multiplier must be a number",
            ));
        }
        if self.sl_multiplier.is_nan() {
            return Err(LabError::invalid(
                "labeling",
                "sl_multiplier",
                "sl_multiplier must be a number",
            ));
        }
        if self.time_limit <= Duration::zero() {
            return Err(LabError::invalid(
                "labeling",
                "time_limit_minutes",
                "time limit must be positive",
            ));
        }
        if self.time_limit > Duration::minutes(MAX_TIME_LIMIT_MINUTES) {
            return Err(LabError::invalid(
                "labeling",
                "time_limit_minutes",
                format!("time limit must not exceed {MAX_TIME_LIMIT_MINUTES} minutes"),
            ));
        }
        if !(self.trade_cost.is_finite() && self.trade_cost >= 0.0) {
            return Err(LabError::invalid(
                "labeling",
                "trade_cost",
                "trade_cost must be non-negative",
            ));
        }
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(LabError::invalid(
                "account",
                "initial_capital",
                "initial_capital must be positive",
            ));
        }
        if !(self.leverage.is_finite() && self.leverage > 0.0) {
            return Err(LabError::invalid(
                "account",
                "leverage",
                "leverage must be positive",
            ));
        }
        if !(self.portfolio_value.is_finite() && self.portfolio_value > 0.0) {
            return Err(LabError::invalid(
                "account",
                "portfolio_value",
                "portfolio_value must be positive",
            ));
        }
        Ok(())
    }
}
