//! Candle representation and sequence checks.

use chrono::{DateTime, TimeZone, Utc};

use super::error::LabError;

/// Exchange open-time in epoch milliseconds as a UTC timestamp.
pub fn timestamp_from_ms(ms: i64) -> Result<DateTime<Utc>, LabError> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| LabError::MalformedInput {
            reason: format!("open_time {} is out of range", ms),
        })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Build a candle from an exchange open-time in epoch milliseconds.
    pub fn from_open_time_ms(
        open_time_ms: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, LabError> {
        Ok(Candle {
            timestamp: timestamp_from_ms(open_time_ms)?,
            open,
            high,
            low,
            close,
            volume,
        })
    }

    pub fn open_time_ms(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }
}

/// Reject sequences the labeling core cannot work with: non-increasing
/// timestamps and closes that are not finite and positive.
pub fn check_candles(candles: &[Candle]) -> Result<(), LabError> {
    for (i, candle) in candles.iter().enumerate() {
        if !candle.close.is_finite() || candle.close <= 0.0 {
            return Err(LabError::MalformedInput {
                reason: format!(
                    "close at {} must be finite and positive, got {}",
                    candle.timestamp, candle.close
                ),
            });
        }
        if i > 0 && candle.timestamp <= candles[i - 1].timestamp {
            return Err(LabError::MalformedInput {
                reason: format!(
                    "timestamps must be strictly increasing: {} follows {}",
                    candle.timestamp,
                    candles[i - 1].timestamp
                ),
            });
        }
    }
    Ok(())
}

/// Index of the last candle at or before `at`, if any.
pub fn index_at_or_before(candles: &[Candle], at: DateTime<Utc>) -> Option<usize> {
    let after = candles.partition_point(|c| c.timestamp <= at);
    after.checked_sub(1)
}
