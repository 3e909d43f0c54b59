//! Run statistics over a labeled bar sequence.

use std::collections::BTreeMap;

use super::barrier::ExitKind;
use super::labeling::{LabeledBar, LabeledRun};
use super::signal::Signal;

/// Exit counts by (exit kind, direction).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExitBreakdown {
    counts: BTreeMap<(ExitKind, Signal), usize>,
    /// Signals whose exit was still open when the data ended.
    pub unresolved: usize,
}

impl ExitBreakdown {
    fn from_bars<'a>(bars: impl Iterator<Item = &'a LabeledBar>) -> Self {
        let mut breakdown = ExitBreakdown::default();
        for bar in bars.filter(|b| !b.signal.is_flat()) {
            match bar.exit_kind {
                Some(kind) => *breakdown.counts.entry((kind, bar.signal)).or_insert(0) += 1,
                None => breakdown.unresolved += 1,
            }
        }
        breakdown
    }

    pub fn count(&self, kind: ExitKind, signal: Signal) -> usize {
        self.counts.get(&(kind, signal)).copied().unwrap_or(0)
    }

    pub fn by_kind(&self, kind: ExitKind) -> usize {
        self.count(kind, Signal::Long) + self.count(kind, Signal::Short)
    }

    pub fn resolved(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ExitKind, Signal, usize)> + '_ {
        self.counts.iter().map(|(&(kind, signal), &n)| (kind, signal, n))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelMetrics {
    pub total_bars: usize,
    pub total_signals: usize,
    pub profitable_signals: usize,
    pub executed_signals: usize,
    pub executed_profitable: usize,
    /// Percent of signals with a positive net return. NaN without signals.
    pub accuracy: f64,
    /// Percent of executed signals with a positive net return. NaN without
    /// executions.
    pub execution_accuracy: f64,
    pub global_pnl: f64,
    /// `global_pnl` as a percent of the portfolio value.
    pub return_pct: f64,
    pub max_amount: Option<f64>,
    pub max_margin: Option<f64>,
    /// Largest peak-to-trough fall of the cumulative PnL, in account currency.
    pub max_drawdown: f64,
    pub exits: ExitBreakdown,
    pub executed_exits: ExitBreakdown,
}

impl LabelMetrics {
    pub fn compute(run: &LabeledRun, portfolio_value: f64) -> Self {
        let bars = &run.bars;
        let signals = || bars.iter().filter(|b| !b.signal.is_flat());
        let executed = || bars.iter().filter(|b| b.active_order);
        let profitable = |b: &&LabeledBar| b.ret_sign == Some(1);

        let total_signals = signals().count();
        let profitable_signals = signals().filter(profitable).count();
        let executed_signals = executed().count();
        let executed_profitable = executed().filter(profitable).count();

        let global_pnl = run.final_pnl();
        let return_pct = if portfolio_value > 0.0 {
            global_pnl / portfolio_value * 100.0
        } else {
            f64::NAN
        };

        LabelMetrics {
            total_bars: bars.len(),
            total_signals,
            profitable_signals,
            executed_signals,
            executed_profitable,
            accuracy: percent(profitable_signals, total_signals),
            execution_accuracy: percent(executed_profitable, executed_signals),
            global_pnl,
            return_pct,
            max_amount: max_of(bars.iter().filter_map(|b| b.amount)),
            max_margin: max_of(bars.iter().filter_map(|b| b.margin)),
            max_drawdown: compute_drawdown(bars.iter().filter_map(|b| b.cumulative_pnl)),
            exits: ExitBreakdown::from_bars(signals()),
            executed_exits: ExitBreakdown::from_bars(executed()),
        }
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        f64::NAN
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn max_of(values: impl Iterator<Item = f64>) -> Option<f64> {
    values.fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.max(v))))
}

/// Drawdown measured from a zero starting balance.
fn compute_drawdown(curve: impl Iterator<Item = f64>) -> f64 {
    let mut peak = 0.0_f64;
    let mut max_dd = 0.0_f64;
    for value in curve {
        peak = peak.max(value);
        max_dd = max_dd.max(peak - value);
    }
    max_dd
}
