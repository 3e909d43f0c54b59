//! Built-in Bollinger %B / MACD signal strategy.
//!
//! Long when price sits just above the lower band while MACD is below zero
//! but turning up; short in the mirrored situation near the upper band.

use crate::domain::candle::Candle;
use crate::domain::error::LabError;
use crate::domain::indicator::bollinger::percent_b;
use crate::domain::indicator::{IndicatorValue, calculate_bollinger, calculate_macd};
use crate::domain::signal::{Signal, SignalPoint, align_to_candles};
use crate::ports::signal_port::SignalPort;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerMacdStrategy {
    pub bollinger_period: usize,
    pub bollinger_stddev: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    /// %B ceiling for long entries.
    pub lower_band: f64,
    /// %B floor for short entries.
    pub upper_band: f64,
}

impl Default for BollingerMacdStrategy {
    fn default() -> Self {
        BollingerMacdStrategy {
            bollinger_period: 100,
            bollinger_stddev: 2.0,
            macd_fast: 45,
            macd_slow: 90,
            macd_signal: 9,
            lower_band: 0.2,
            upper_band: 0.8,
        }
    }
}

impl BollingerMacdStrategy {
    pub fn name(&self) -> String {
        format!(
            "BB({},{}) + MACD({},{},{})",
            self.bollinger_period,
            self.bollinger_stddev,
            self.macd_fast,
            self.macd_slow,
            self.macd_signal
        )
    }

    pub fn validate(&self) -> Result<(), LabError> {
        if self.bollinger_period < 2 {
            return Err(LabError::invalid(
                "strategy",
                "bollinger_period",
                "bollinger_period must be at least 2",
            ));
        }
        if !(self.bollinger_stddev.is_finite() && self.bollinger_stddev > 0.0) {
            return Err(LabError::invalid(
                "strategy",
                "bollinger_stddev",
                "bollinger_stddev must be positive",
            ));
        }
        if self.macd_fast == 0 || self.macd_signal == 0 || self.macd_fast > self.macd_slow {
            return Err(LabError::invalid(
                "strategy",
                "macd_fast",
                "MACD periods must be positive with fast <= slow",
            ));
        }
        if !(0.0..=1.0).contains(&self.lower_band)
            || !(0.0..=1.0).contains(&self.upper_band)
            || self.lower_band > self.upper_band
        {
            return Err(LabError::invalid(
                "strategy",
                "lower_band",
                "bands must lie in [0, 1] with lower_band <= upper_band",
            ));
        }
        Ok(())
    }

    /// Classify one bar from its %B and MACD line/histogram.
    pub fn classify(&self, pct_b: f64, macd_line: f64, histogram: f64) -> Signal {
        if pct_b > 0.0 && pct_b < self.lower_band && histogram > 0.0 && macd_line < 0.0 {
            Signal::Long
        } else if pct_b > self.upper_band && pct_b < 1.0 && histogram < 0.0 && macd_line > 0.0 {
            Signal::Short
        } else {
            Signal::Flat
        }
    }

    /// One signal per candle; flat while either indicator is warming up.
    pub fn signals(&self, candles: &[Candle]) -> Vec<Signal> {
        let mult_x100 = (self.bollinger_stddev * 100.0).round() as u32;
        let bands = calculate_bollinger(candles, self.bollinger_period, mult_x100);
        let macd = calculate_macd(candles, self.macd_fast, self.macd_slow, self.macd_signal);

        candles
            .iter()
            .enumerate()
            .map(|(i, candle)| {
                let (Some(b), Some(m)) = (bands.values.get(i), macd.values.get(i)) else {
                    return Signal::Flat;
                };
                if !b.valid || !m.valid {
                    return Signal::Flat;
                }
                match (&b.value, &m.value) {
                    (
                        IndicatorValue::Bollinger { upper, lower, .. },
                        IndicatorValue::Macd {
                            line, histogram, ..
                        },
                    ) => percent_b(candle.close, *upper, *lower)
                        .map_or(Signal::Flat, |pb| self.classify(pb, *line, *histogram)),
                    _ => Signal::Flat,
                }
            })
            .collect()
    }
}

impl SignalPort for BollingerMacdStrategy {
    fn generate(&self, candles: &[Candle]) -> Result<Vec<SignalPoint>, LabError> {
        self.validate()?;
        let signals = self.signals(candles);
        log::debug!(
            "{}: {} long, {} short over {} bars",
            self.name(),
            signals.iter().filter(|s| **s == Signal::Long).count(),
            signals.iter().filter(|s| **s == Signal::Short).count(),
            candles.len()
        );
        Ok(align_to_candles(candles, &signals))
    }
}
