//! Configuration validation.
//!
//! Validates INI fields before any candle data is read. Missing numeric keys
//! fall back to their defaults; present keys must parse and be in range.

use crate::domain::error::LabError;
use crate::domain::labeling_config::MAX_TIME_LIMIT_MINUTES;
use crate::ports::config_port::ConfigPort;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), LabError> {
    match config.get_string("data", "candles") {
        Some(s) if !s.trim().is_empty() => {}
        _ => {
            return Err(LabError::ConfigMissing {
                section: "data".to_string(),
                key: "candles".to_string(),
            });
        }
    }
    validate_bounds(config)
}

pub fn validate_labeling_config(config: &dyn ConfigPort) -> Result<(), LabError> {
    validate_volatility_window(config)?;
    validate_multipliers(config)?;
    validate_time_limit(config)?;
    validate_trade_cost(config)?;
    validate_account(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), LabError> {
    let name = config
        .get_string("strategy", "name")
        .unwrap_or_else(|| "bollinger_macd".to_string());
    match name.trim() {
        "column" => Ok(()),
        "bollinger_macd" => {
            for key in [
                "bollinger_period",
                "macd_fast",
                "macd_slow",
                "macd_signal",
            ] {
                if let Some(v) = parse_int(config, "strategy", key)? {
                    if v < 1 {
                        return Err(LabError::invalid(
                            "strategy",
                            key,
                            format!("{key} must be at least 1"),
                        ));
                    }
                }
            }
            for key in ["bollinger_stddev", "lower_band", "upper_band"] {
                parse_double(config, "strategy", key)?;
            }
            Ok(())
        }
        other => Err(LabError::invalid(
            "strategy",
            "name",
            format!("unknown strategy '{other}', expected bollinger_macd or column"),
        )),
    }
}

/// Parse an optional time bound. Accepts RFC 3339, `YYYY-MM-DD HH:MM[:SS]`
/// (UTC) and `YYYY-MM-DD` (midnight UTC).
pub fn parse_bound(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Read an optional `[data]` bound, rejecting text that does not parse.
pub fn read_bound(config: &dyn ConfigPort, key: &str) -> Result<Option<DateTime<Utc>>, LabError> {
    match config.get_string("data", key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_bound(&s).map(Some).ok_or_else(|| {
            LabError::invalid(
                "data",
                key,
                format!("invalid {key} '{s}', expected RFC 3339 or YYYY-MM-DD"),
            )
        }),
    }
}

fn validate_bounds(config: &dyn ConfigPort) -> Result<(), LabError> {
    let start = read_bound(config, "start")?;
    let end = read_bound(config, "end")?;
    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(LabError::invalid(
                "data",
                "start",
                "start must be before end",
            ));
        }
    }
    Ok(())
}

fn validate_volatility_window(config: &dyn ConfigPort) -> Result<(), LabError> {
    if let Some(v) = parse_int(config, "labeling", "volatility_window")? {
        if v < 2 {
            return Err(LabError::invalid(
                "labeling",
                "volatility_window",
                "volatility_window must be at least 2",
            ));
        }
    }
    Ok(())
}

fn validate_multipliers(config: &dyn ConfigPort) -> Result<(), LabError> {
    parse_double(config, "labeling", "tp_multiplier")?;
    parse_double(config, "labeling", "sl_multiplier")?;
    Ok(())
}

fn validate_time_limit(config: &dyn ConfigPort) -> Result<(), LabError> {
    if let Some(v) = parse_int(config, "labeling", "time_limit_minutes")? {
        if v <= 0 {
            return Err(LabError::invalid(
                "labeling",
                "time_limit_minutes",
                "time_limit_minutes must be positive",
            ));
        }
        if v > MAX_TIME_LIMIT_MINUTES {
            return Err(LabError::invalid(
                "labeling",
                "time_limit_minutes",
                format!("time_limit_minutes must not exceed {MAX_TIME_LIMIT_MINUTES}"),
            ));
        }
    }
    Ok(())
}

fn validate_trade_cost(config: &dyn ConfigPort) -> Result<(), LabError> {
    if let Some(v) = parse_double(config, "labeling", "trade_cost")? {
        if v < 0.0 {
            return Err(LabError::invalid(
                "labeling",
                "trade_cost",
                "trade_cost must be non-negative",
            ));
        }
    }
    Ok(())
}

fn validate_account(config: &dyn ConfigPort) -> Result<(), LabError> {
    for key in ["initial_capital", "leverage", "portfolio_value"] {
        if let Some(v) = parse_double(config, "account", key)? {
            if v <= 0.0 {
                return Err(LabError::invalid(
                    "account",
                    key,
                    format!("{key} must be positive"),
                ));
            }
        }
    }
    Ok(())
}

fn parse_int(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<i64>, LabError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(s) => s.trim().parse::<i64>().map(Some).map_err(|_| {
            LabError::invalid(section, key, format!("{key} must be an integer, got '{s}'"))
        }),
    }
}

fn parse_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, LabError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(s) => match s.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(LabError::invalid(
                section,
                key,
                format!("{key} must be a number, got '{s}'"),
            )),
        },
    }
}
