//! Triple-barrier resolution.
//!
//! For a bar `i` with a directional signal the forward path is
//! `path(t) = (close[t] / close[i] - 1) * direction` for every bar `t` with
//! `ts[i] <= ts[t] <= ts[i] + time_limit`. The exit is the earliest of:
//! - take-profit: first `t` with `path(t) > target * tp_multiplier`
//! - stop-loss: first `t` with `path(t) < -target * sl_multiplier`
//! - time-limit: `ts[i] + time_limit`
//!
//! Ties resolve take-profit, then stop-loss, then time-limit. A barrier whose
//! multiplier is not positive never triggers. When neither price barrier
//! fires and the time limit lies beyond the last candle, the exit is left
//! unresolved.

use chrono::{DateTime, Utc};
use std::fmt;

use super::candle::Candle;
use super::labeling_config::LabelingConfig;
use super::signal::Signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExitKind {
    TakeProfit,
    StopLoss,
    TimeLimit,
}

impl ExitKind {
    pub const ALL: [ExitKind; 3] = [ExitKind::TakeProfit, ExitKind::StopLoss, ExitKind::TimeLimit];

    /// Short column label: `tp`, `sl` or `tl`.
    pub fn label(self) -> &'static str {
        match self {
            ExitKind::TakeProfit => "tp",
            ExitKind::StopLoss => "sl",
            ExitKind::TimeLimit => "tl",
        }
    }
}

impl fmt::Display for ExitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitKind::TakeProfit => write!(f, "TP"),
            ExitKind::StopLoss => write!(f, "SL"),
            ExitKind::TimeLimit => write!(f, "TL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: ExitKind,
}

/// Price levels and deadline for one entry. Disabled barriers carry no level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarrierSet {
    pub direction: Signal,
    pub take_profit: Option<f64>,
    pub stop_loss: Option<f64>,
    pub time_limit: DateTime<Utc>,
    entry_close: f64,
    profit_threshold: Option<f64>,
    loss_threshold: Option<f64>,
}

impl BarrierSet {
    /// Barriers for an entry at `candle`, or `None` for a flat signal.
    pub fn new(
        candle: &Candle,
        signal: Signal,
        target: f64,
        config: &LabelingConfig,
    ) -> Option<Self> {
        if signal.is_flat() {
            return None;
        }
        let direction = signal.direction();
        Some(BarrierSet {
            direction: signal,
            take_profit: config
                .take_profit()
                .map(|m| candle.close * (1.0 + target * m * direction)),
            stop_loss: config
                .stop_loss()
                .map(|m| candle.close * (1.0 - target * m * direction)),
            // a deadline past the representable range is never reached
            time_limit: candle
                .timestamp
                .checked_add_signed(config.time_limit)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            entry_close: candle.close,
            profit_threshold: config.take_profit().map(|m| m * target),
            loss_threshold: config.stop_loss().map(|m| -m * target),
        })
    }

    /// Signed return from entry to `close`.
    pub fn path(&self, close: f64) -> f64 {
        (close / self.entry_close - 1.0) * self.direction.direction()
    }

    /// Price barrier touched by a bar closing at `close`, take-profit first.
    pub fn touched(&self, close: f64) -> Option<ExitKind> {
        let path = self.path(close);
        if self.profit_threshold.is_some_and(|p| path > p) {
            Some(ExitKind::TakeProfit)
        } else if self.loss_threshold.is_some_and(|l| path < l) {
            Some(ExitKind::StopLoss)
        } else {
            None
        }
    }

    /// Whether a bar closing at `close` on `timestamp` ends a position
    /// opened with these barriers.
    pub fn is_crossed(&self, close: f64, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.time_limit || self.touched(close).is_some()
    }
}

/// Resolve the exit of the entry at `index`. Returns `None` for flat bars
/// and for entries whose outcome is still open when the data ends.
pub fn resolve_exit(
    candles: &[Candle],
    index: usize,
    signal: Signal,
    target: f64,
    config: &LabelingConfig,
) -> Option<ExitEvent> {
    let barriers = BarrierSet::new(&candles[index], signal, target, config)?;
    // candles are sorted, so bars past the deadline are never scanned
    let window_end = candles.partition_point(|c| c.timestamp <= barriers.time_limit);

    let touched = candles[index..window_end]
        .iter()
        .find_map(|c| barriers.touched(c.close).map(|kind| (c.timestamp, kind)));
    if let Some((timestamp, kind)) = touched {
        return Some(ExitEvent { timestamp, kind });
    }

    let last = candles.last()?;
    (barriers.time_limit <= last.timestamp).then_some(ExitEvent {
        timestamp: barriers.time_limit,
        kind: ExitKind::TimeLimit,
    })
}

/// Resolve every bar. Per-bar scans are independent, so with the `parallel`
/// feature they run on the rayon pool; the output order is the bar order.
pub fn resolve_barriers(
    candles: &[Candle],
    signals: &[Signal],
    targets: &[f64],
    config: &LabelingConfig,
) -> Vec<Option<ExitEvent>> {
    debug_assert_eq!(candles.len(), signals.len());
    debug_assert_eq!(candles.len(), targets.len());

    let resolve = |i: usize| resolve_exit(candles, i, signals[i], targets[i], config);

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        (0..candles.len()).into_par_iter().map(resolve).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        (0..candles.len()).map(resolve).collect()
    }
}
