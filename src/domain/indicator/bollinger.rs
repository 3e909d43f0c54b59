//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1).
//! Warmup: first (period-1) bars are invalid.

use crate::domain::candle::Candle;
use crate::domain::indicator::{
    IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue, rolling_stddev,
};

pub fn calculate_bollinger(
    candles: &[Candle],
    period: usize,
    stddev_mult_x100: u32,
) -> IndicatorSeries {
    let mult = stddev_mult_x100 as f64 / 100.0;
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let deviations = rolling_stddev(&closes, period, 0);

    let values = candles
        .iter()
        .enumerate()
        .map(|(i, candle)| {
            let (upper, middle, lower) = match deviations[i] {
                Some(stddev) => {
                    let window = &closes[i + 1 - period..=i];
                    let middle = window.iter().sum::<f64>() / period as f64;
                    (middle + mult * stddev, middle, middle - mult * stddev)
                }
                None => (0.0, 0.0, 0.0),
            };
            IndicatorPoint {
                timestamp: candle.timestamp,
                valid: deviations[i].is_some(),
                value: IndicatorValue::Bollinger {
                    upper,
                    middle,
                    lower,
                },
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Bollinger {
            period,
            stddev_mult_x100,
        },
        values,
    }
}

/// Position of `close` inside the bands: 0 at the lower band, 1 at the upper.
/// `None` when the bands have collapsed to a single price.
pub fn percent_b(close: f64, upper: f64, lower: f64) -> Option<f64> {
    let width = upper - lower;
    (width > 0.0).then(|| (close - lower) / width)
}
