//! Directional strategy signals.

use chrono::{DateTime, Utc};
use std::fmt;

use super::candle::Candle;
use super::error::LabError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Signal {
    Long,
    Short,
    Flat,
}

impl Signal {
    /// +1 for long, -1 for short, 0 for flat.
    pub fn direction(self) -> f64 {
        match self {
            Signal::Long => 1.0,
            Signal::Short => -1.0,
            Signal::Flat => 0.0,
        }
    }

    pub fn is_flat(self) -> bool {
        self == Signal::Flat
    }

    pub fn as_i8(self) -> i8 {
        match self {
            Signal::Long => 1,
            Signal::Short => -1,
            Signal::Flat => 0,
        }
    }

    /// Parse a signal column value. Only -1, 0 and +1 are accepted; float
    /// text such as `1.0` is allowed because cached candle files store
    /// every column as float.
    pub fn from_value(value: f64) -> Result<Self, LabError> {
        if value == 1.0 {
            Ok(Signal::Long)
        } else if value == -1.0 {
            Ok(Signal::Short)
        } else if value == 0.0 {
            Ok(Signal::Flat)
        } else {
            Err(LabError::MalformedInput {
                reason: format!("signal must be -1, 0 or 1, got {}", value),
            })
        }
    }
}

impl TryFrom<i64> for Signal {
    type Error = LabError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Signal::Long),
            -1 => Ok(Signal::Short),
            0 => Ok(Signal::Flat),
            other => Err(LabError::MalformedInput {
                reason: format!("signal must be -1, 0 or 1, got {}", other),
            }),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Long => write!(f, "LONG"),
            Signal::Short => write!(f, "SHORT"),
            Signal::Flat => write!(f, "FLAT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalPoint {
    pub timestamp: DateTime<Utc>,
    pub signal: Signal,
}

/// Check that a signal series lines up bar for bar with the candles.
pub fn check_alignment(candles: &[Candle], signals: &[SignalPoint]) -> Result<(), LabError> {
    if candles.len() != signals.len() {
        return Err(LabError::MisalignedInput {
            reason: format!(
                "{} candles but {} signals",
                candles.len(),
                signals.len()
            ),
        });
    }
    for (candle, point) in candles.iter().zip(signals) {
        if candle.timestamp != point.timestamp {
            return Err(LabError::MisalignedInput {
                reason: format!(
                    "signal at {} does not match candle at {}",
                    point.timestamp, candle.timestamp
                ),
            });
        }
    }
    Ok(())
}

/// Attach a plain signal vector to the candle timestamps.
pub fn align_to_candles(candles: &[Candle], signals: &[Signal]) -> Vec<SignalPoint> {
    candles
        .iter()
        .zip(signals)
        .map(|(candle, &signal)| SignalPoint {
            timestamp: candle.timestamp,
            signal,
        })
        .collect()
}
