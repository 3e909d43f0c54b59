//! Single-position execution policy.
//!
//! Bars are scanned in time order with an explicit two-state machine. While
//! `Idle`, a directional signal opens a position and its bar is marked as an
//! active order. While `Open`, each bar's close is checked against the
//! captured barriers; once crossed the machine returns to `Idle` and the
//! same bar's signal is evaluated again, so a position can close and a new
//! one open on one bar. Signals arriving while a position is open are
//! dropped. A position still open at the last bar stays open.

use chrono::{DateTime, Duration, Utc};

use super::barrier::BarrierSet;
use super::candle::Candle;
use super::signal::Signal;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionState {
    Idle,
    Open {
        direction: Signal,
        barriers: BarrierSet,
    },
}

impl PositionState {
    /// Advance the machine by one bar. Returns the next state and whether
    /// this bar opened a position.
    pub fn step(self, candle: &Candle, signal: Signal, barriers: Option<BarrierSet>) -> (Self, bool) {
        if let PositionState::Open { barriers: open, .. } = self {
            if !open.is_crossed(candle.close, candle.timestamp) {
                return (self, false);
            }
        }

        match barriers {
            Some(barriers) if !signal.is_flat() => (
                PositionState::Open {
                    direction: signal,
                    barriers,
                },
                true,
            ),
            _ => (PositionState::Idle, false),
        }
    }
}

/// Flag the bars that open a position under the one-at-a-time policy.
pub fn filter_active_positions(
    candles: &[Candle],
    signals: &[Signal],
    barriers: &[Option<BarrierSet>],
) -> Vec<bool> {
    debug_assert_eq!(candles.len(), signals.len());
    debug_assert_eq!(candles.len(), barriers.len());

    let mut state = PositionState::Idle;
    candles
        .iter()
        .zip(signals)
        .zip(barriers)
        .map(|((candle, &signal), &set)| {
            let (next, opened) = state.step(candle, signal, set);
            state = next;
            opened
        })
        .collect()
}

/// An executed position, from its opening bar to its resolved exit.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub open_timestamp: DateTime<Utc>,
    /// `None` while the outcome is unresolved at the end of the data.
    pub close_timestamp: Option<DateTime<Utc>>,
    pub direction: Signal,
    pub take_profit: Option<f64>,
    pub stop_loss: Option<f64>,
    pub time_limit: DateTime<Utc>,
    pub amount: f64,
    pub margin: f64,
}

impl Position {
    pub fn holding_time(&self) -> Option<Duration> {
        self.close_timestamp.map(|close| close - self.open_timestamp)
    }

    /// Whether the half-open intervals `[open, close)` of two positions
    /// intersect. An unresolved position extends to infinity.
    pub fn overlaps(&self, other: &Position) -> bool {
        let ends_after = |p: &Position, t: DateTime<Utc>| p.close_timestamp.is_none_or(|c| c > t);
        ends_after(self, other.open_timestamp) && ends_after(other, self.open_timestamp)
    }
}
