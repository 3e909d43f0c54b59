//! Volatility target estimation.
//!
//! target[i] = sample stddev of the last `span` closes / close[i].
//! The first `span - 1` bars have no target and are cut from the run.

use super::candle::Candle;
use super::error::LabError;
use super::indicator::rolling_stddev;

#[derive(Debug, Clone, PartialEq)]
pub struct VolatilityTargets {
    /// Number of leading bars without a target.
    pub warmup: usize,
    /// One target per bar from index `warmup` onward.
    pub targets: Vec<f64>,
}

pub fn estimate_targets(candles: &[Candle], span: usize) -> Result<VolatilityTargets, LabError> {
    if span == 0 || candles.len() < span {
        return Err(LabError::InsufficientData {
            bars: candles.len(),
            minimum: span.max(1),
        });
    }

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let warmup = span - 1;

    let targets: Vec<f64> = rolling_stddev(&closes, span, 1)
        .into_iter()
        .zip(&closes)
        .skip(warmup)
        .map(|(stddev, close)| stddev.map(|s| s / close))
        .collect::<Option<Vec<f64>>>()
        .ok_or(LabError::InsufficientData {
            bars: candles.len(),
            minimum: span.max(2),
        })?;

    Ok(VolatilityTargets { warmup, targets })
}
