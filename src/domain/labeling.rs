//! Full labeling run.
//!
//! Stages, in order: volatility targets, warm-up truncation, barrier
//! resolution, trade returns, position filtering and PnL accounting. The
//! first four are per-bar; the last two are a single forward pass.

use chrono::{DateTime, Utc};

use super::barrier::{BarrierSet, ExitKind, resolve_barriers};
use super::candle::{Candle, check_candles};
use super::error::LabError;
use super::labeling_config::LabelingConfig;
use super::pnl;
use super::position::{Position, filter_active_positions};
use super::returns::calculate_returns;
use super::signal::{Signal, SignalPoint, check_alignment};
use super::volatility::estimate_targets;

/// One output row per labeled bar.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub signal: Signal,
    pub target: f64,
    pub tp_level: Option<f64>,
    pub sl_level: Option<f64>,
    /// Take-profit level as a multiple of the entry close.
    pub tp_pct: Option<f64>,
    /// Stop-loss level as a multiple of the entry close.
    pub sl_pct: Option<f64>,
    pub time_limit: Option<DateTime<Utc>>,
    pub exit_timestamp: Option<DateTime<Utc>>,
    pub exit_kind: Option<ExitKind>,
    pub ret: Option<f64>,
    pub ret_sign: Option<i8>,
    pub ret_over_target: Option<f64>,
    pub active_order: bool,
    pub amount: Option<f64>,
    pub margin: Option<f64>,
    pub ret_usd: Option<f64>,
    pub cumulative_pnl: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledRun {
    pub bars: Vec<LabeledBar>,
    /// Leading bars cut because they had no volatility target.
    pub dropped_warmup: usize,
}

impl LabeledRun {
    /// Positions opened by the state machine, in time order.
    pub fn positions(&self) -> Vec<Position> {
        self.bars
            .iter()
            .filter(|bar| bar.active_order)
            .filter_map(|bar| {
                Some(Position {
                    open_timestamp: bar.timestamp,
                    close_timestamp: bar.exit_timestamp,
                    direction: bar.signal,
                    take_profit: bar.tp_level,
                    stop_loss: bar.sl_level,
                    time_limit: bar.time_limit?,
                    amount: bar.amount?,
                    margin: bar.margin?,
                })
            })
            .collect()
    }

    /// Cumulative PnL at the last bar, 0 when nothing was realized.
    pub fn final_pnl(&self) -> f64 {
        self.bars
            .last()
            .and_then(|bar| bar.cumulative_pnl)
            .unwrap_or(0.0)
    }
}

/// Label a candle series against an aligned signal series.
pub fn label(
    candles: &[Candle],
    signals: &[SignalPoint],
    config: &LabelingConfig,
) -> Result<LabeledRun, LabError> {
    config.validate()?;
    check_candles(candles)?;
    check_alignment(candles, signals)?;

    let volatility = estimate_targets(candles, config.volatility_window)?;
    let warmup = volatility.warmup;
    log::info!(
        "volatility window {} drops {} warm-up bars, {} remain",
        config.volatility_window,
        warmup,
        volatility.targets.len()
    );

    let signals: Vec<Signal> = signals[warmup..].iter().map(|p| p.signal).collect();
    let mut run = label_checked(&candles[warmup..], &signals, &volatility.targets, config)?;
    run.dropped_warmup = warmup;
    Ok(run)
}

/// Label bars whose volatility targets are already known.
pub fn label_with_targets(
    candles: &[Candle],
    signals: &[Signal],
    targets: &[f64],
    config: &LabelingConfig,
) -> Result<LabeledRun, LabError> {
    config.validate()?;
    if candles.is_empty() {
        return Err(LabError::InsufficientData {
            bars: 0,
            minimum: 1,
        });
    }
    if signals.len() != candles.len() || targets.len() != candles.len() {
        return Err(LabError::MisalignedInput {
            reason: format!(
                "{} candles, {} signals, {} targets",
                candles.len(),
                signals.len(),
                targets.len()
            ),
        });
    }
    check_candles(candles)?;
    label_checked(candles, signals, targets, config)
}

/// Labeling over inputs already validated and aligned by the caller.
fn label_checked(
    candles: &[Candle],
    signals: &[Signal],
    targets: &[f64],
    config: &LabelingConfig,
) -> Result<LabeledRun, LabError> {
    let barriers: Vec<Option<BarrierSet>> = candles
        .iter()
        .zip(signals)
        .zip(targets)
        .map(|((candle, &signal), &target)| BarrierSet::new(candle, signal, target, config))
        .collect();

    let exits = resolve_barriers(candles, signals, targets, config);
    let returns = calculate_returns(candles, signals, &exits, config.trade_cost);
    let active = filter_active_positions(candles, signals, &barriers);
    let net_returns: Vec<Option<f64>> = returns.iter().map(|r| r.map(|r| r.ret)).collect();
    let pnl_rows = pnl::account(&active, &net_returns, config)?;

    log::debug!(
        "{} bars, {} signals, {} resolved exits, {} active orders",
        candles.len(),
        signals.iter().filter(|s| !s.is_flat()).count(),
        exits.iter().flatten().count(),
        active.iter().filter(|a| **a).count()
    );

    let bars = candles
        .iter()
        .enumerate()
        .map(|(i, candle)| {
            let signal = signals[i];
            let target = targets[i];
            let set = barriers[i];
            let exit = exits[i];
            let trade = returns[i];
            let row = pnl_rows[i];
            let level_pct = |level: Option<f64>| level.map(|l| l / candle.close);

            LabeledBar {
                timestamp: candle.timestamp,
                open: candle.open,
                high: candle.high,
                low: candle.low,
                close: candle.close,
                volume: candle.volume,
                signal,
                target,
                tp_level: set.and_then(|s| s.take_profit),
                sl_level: set.and_then(|s| s.stop_loss),
                tp_pct: level_pct(set.and_then(|s| s.take_profit)),
                sl_pct: level_pct(set.and_then(|s| s.stop_loss)),
                time_limit: set.map(|s| s.time_limit),
                exit_timestamp: exit.map(|e| e.timestamp),
                exit_kind: exit.map(|e| e.kind),
                ret: trade.map(|t| t.ret),
                ret_sign: trade.map(|t| t.sign),
                ret_over_target: trade.and_then(|t| (target > 0.0).then(|| t.ret / target)),
                active_order: active[i],
                amount: row.amount,
                margin: row.margin,
                ret_usd: row.ret_usd,
                cumulative_pnl: row.cumulative_pnl,
            }
        })
        .collect();

    Ok(LabeledRun {
        bars,
        dropped_warmup: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_candles;
    use crate::domain::signal::align_to_candles;
    use approx::assert_relative_eq;
    use chrono::Duration;

    use Signal::{Flat, Long, Short};

    fn fixture_config(minutes: i64) -> LabelingConfig {
        LabelingConfig {
            tp_multiplier: 1.5,
            sl_multiplier: 0.75,
            time_limit: Duration::minutes(minutes),
            trade_cost: 0.0,
            ..LabelingConfig::default()
        }
    }

    #[test]
    fn five_bar_take_profit_fixture() {
        let candles = make_candles(&[100.0, 101.0, 103.0, 99.0, 100.0]);
        let signals = [Long, Flat, Flat, Flat, Flat];
        let run = label_with_targets(&candles, &signals, &[0.01; 5], &fixture_config(4)).unwrap();

        let first = &run.bars[0];
        assert_eq!(first.exit_kind, Some(ExitKind::TakeProfit));
        assert_eq!(first.exit_timestamp, Some(candles[2].timestamp));
        assert_relative_eq!(first.ret.unwrap(), 0.03, epsilon = 1e-12);
        assert_eq!(first.ret_sign, Some(1));
        assert_relative_eq!(first.ret_over_target.unwrap(), 3.0, epsilon = 1e-9);
        assert_relative_eq!(first.tp_pct.unwrap(), 1.015, epsilon = 1e-12);
        assert_relative_eq!(first.sl_pct.unwrap(), 0.9925, epsilon = 1e-12);

        let active: Vec<bool> = run.bars.iter().map(|b| b.active_order).collect();
        assert_eq!(active, vec![true, false, false, false, false]);
        assert_relative_eq!(run.final_pnl(), 15.0 * 0.03, epsilon = 1e-12);
    }

    #[test]
    fn flat_bars_carry_no_trade_fields() {
        let candles = make_candles(&[100.0, 101.0, 103.0]);
        let run =
            label_with_targets(&candles, &[Flat, Flat, Flat], &[0.01; 3], &fixture_config(2))
                .unwrap();

        for bar in &run.bars {
            assert!(!bar.active_order);
            assert_eq!(bar.tp_level, None);
            assert_eq!(bar.exit_kind, None);
            assert_eq!(bar.ret, None);
            assert_eq!(bar.cumulative_pnl, None);
        }
        assert_eq!(run.final_pnl(), 0.0);
        assert!(run.positions().is_empty());
    }

    #[test]
    fn positions_follow_active_bars() {
        let candles = make_candles(&[100.0, 101.0, 103.0, 102.0, 102.5, 102.2]);
        let signals = [Long, Flat, Short, Long, Flat, Flat];
        let run = label_with_targets(&candles, &signals, &[0.01; 6], &fixture_config(10)).unwrap();

        let positions = run.positions();
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0].direction, Long);
        assert_eq!(positions[0].close_timestamp, Some(candles[2].timestamp));
        assert_eq!(positions[1].direction, Short);
        assert_eq!(positions[1].open_timestamp, candles[2].timestamp);
        // short from 103 never reaches 101.455 or 103.7725 before the data ends
        assert_eq!(positions[1].close_timestamp, None);
        assert_eq!(positions[1].margin, 0.75);
    }

    #[test]
    fn label_truncates_warmup() {
        let closes = [100.0, 102.0, 101.0, 103.0, 104.0, 102.0, 101.0];
        let candles = make_candles(&closes);
        let signals = align_to_candles(&candles, &[Flat, Flat, Long, Flat, Flat, Flat, Flat]);
        let config = LabelingConfig {
            volatility_window: 3,
            time_limit: Duration::minutes(3),
            ..LabelingConfig::default()
        };
        let run = label(&candles, &signals, &config).unwrap();

        assert_eq!(run.dropped_warmup, 2);
        assert_eq!(run.bars.len(), 5);
        assert_eq!(run.bars[0].timestamp, candles[2].timestamp);
        assert!(run.bars[0].active_order);
        assert!(run.bars[0].target > 0.0);
    }

    #[test]
    fn label_rejects_zero_leverage() {
        let candles = make_candles(&[100.0; 5]);
        let signals = align_to_candles(&candles, &[Long; 5]);
        let config = LabelingConfig {
            volatility_window: 2,
            leverage: 0.0,
            ..LabelingConfig::default()
        };
        let err = label(&candles, &signals, &config).unwrap_err();
        assert!(matches!(err, LabError::ConfigInvalid { .. }));
    }

    #[test]
    fn label_rejects_short_series() {
        let candles = make_candles(&[100.0, 101.0]);
        let signals = align_to_candles(&candles, &[Flat, Flat]);
        let err = label(&candles, &signals, &LabelingConfig::default()).unwrap_err();
        assert!(matches!(err, LabError::InsufficientData { .. }));
    }

    #[test]
    fn label_rejects_misaligned_signals() {
        let candles = make_candles(&[100.0, 101.0, 102.0]);
        let signals = align_to_candles(&candles[..2], &[Flat, Flat]);
        let config = LabelingConfig {
            volatility_window: 2,
            ..LabelingConfig::default()
        };
        let err = label(&candles, &signals, &config).unwrap_err();
        assert!(matches!(err, LabError::MisalignedInput { .. }));
    }

    #[test]
    fn label_with_targets_rejects_length_mismatch() {
        let candles = make_candles(&[100.0, 101.0]);
        let err = label_with_targets(&candles, &[Flat, Flat], &[0.01], &fixture_config(2))
            .unwrap_err();
        assert!(matches!(err, LabError::MisalignedInput { .. }));
    }

    #[test]
    fn out_of_range_time_limit_rejected_before_labeling() {
        let candles = make_candles(&[100.0, 101.0, 102.0, 103.0]);
        let config = LabelingConfig {
            volatility_window: 2,
            time_limit: Duration::minutes(200_000_000_000),
            ..LabelingConfig::default()
        };
        let is_time_limit =
            |err: &LabError| matches!(err, LabError::ConfigInvalid { key, .. } if key == "time_limit_minutes");

        let signals = align_to_candles(&candles, &[Long; 4]);
        let err = label(&candles, &signals, &config).unwrap_err();
        assert!(is_time_limit(&err), "{err}");

        let err = label_with_targets(&candles, &[Long; 4], &[0.01; 4], &config).unwrap_err();
        assert!(is_time_limit(&err), "{err}");
    }

    #[test]
    fn longest_time_limit_labels_open_outcomes() {
        let candles = make_candles(&[100.0, 100.1, 100.2]);
        let config = LabelingConfig {
            time_limit: Duration::minutes(crate::domain::labeling_config::MAX_TIME_LIMIT_MINUTES),
            ..fixture_config(1)
        };
        let run = label_with_targets(&candles, &[Long, Flat, Flat], &[0.01; 3], &config).unwrap();
        assert_eq!(run.bars[0].exit_kind, None);
        assert!(run.bars[0].active_order);
    }
}
