//! Table formatting for reports.
//!
//! Provides functions to generate Typst markup for:
//! - Run parameters
//! - Signal and PnL metrics
//! - Exit breakdown by barrier and direction
//! - Trade log of executed positions

use crate::domain::barrier::ExitKind;
use crate::domain::labeling::{LabeledBar, LabeledRun};
use crate::domain::labeling_config::LabelingConfig;
use crate::domain::metrics::{ExitBreakdown, LabelMetrics};
use crate::domain::signal::Signal;

/// Escape characters that carry markup meaning inside Typst content blocks.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '#' | '[' | ']' | '*' | '_' | '$' | '@' | '<' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn format_pct(value: f64) -> String {
    if value.is_nan() {
        "n/a".to_string()
    } else {
        format!("{:.2}%", value)
    }
}

fn format_multiplier(m: Option<f64>) -> String {
    m.map_or_else(|| "disabled".to_string(), |m| format!("{}", m))
}

fn pnl_cell(value: f64) -> String {
    let color = if value >= 0.0 { "green" } else { "red" };
    format!("text(fill: {}, [{:.4}])", color, value)
}

pub fn render_run_summary(run: &LabeledRun, config: &LabelingConfig, strategy: &str) -> String {
    let range = match (run.bars.first(), run.bars.last()) {
        (Some(first), Some(last)) => format!(
            "{} to {}",
            first.timestamp.format("%Y-%m-%d %H:%M"),
            last.timestamp.format("%Y-%m-%d %H:%M")
        ),
        _ => "empty".to_string(),
    };

    let rows = [
        ("Strategy", escape(strategy)),
        ("Period", range),
        ("Warm-up bars dropped", run.dropped_warmup.to_string()),
        ("Volatility window", config.volatility_window.to_string()),
        ("Take-profit multiplier", format_multiplier(config.take_profit())),
        ("Stop-loss multiplier", format_multiplier(config.stop_loss())),
        (
            "Time limit",
            format!("{} min", config.time_limit.num_minutes()),
        ),
        ("Trade cost", format!("{:.4}%", config.trade_cost * 100.0)),
        ("Amount per trade", format!("{:.2}", config.initial_capital)),
        ("Leverage", format!("{}x", config.leverage)),
        ("Portfolio value", format!("{:.2}", config.portfolio_value)),
    ];

    let mut out = String::from("#table(\n  columns: 2,\n  [*Parameter*], [*Value*],\n");
    for (name, value) in rows {
        out.push_str(&format!("  [{}], [{}],\n", name, value));
    }
    out.push_str(")\n");
    out
}

pub fn render_metrics_table(metrics: &LabelMetrics) -> String {
    let optional = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v));

    let rows = [
        ("Bars", metrics.total_bars.to_string()),
        ("Signals", metrics.total_signals.to_string()),
        ("Profitable signals", metrics.profitable_signals.to_string()),
        ("Accuracy", format_pct(metrics.accuracy)),
        ("Executed signals", metrics.executed_signals.to_string()),
        (
            "Executed profitable",
            metrics.executed_profitable.to_string(),
        ),
        ("Execution accuracy", format_pct(metrics.execution_accuracy)),
        ("Global PnL", format!("{:.4}", metrics.global_pnl)),
        ("Return", format_pct(metrics.return_pct)),
        ("Max drawdown", format!("{:.4}", metrics.max_drawdown)),
        ("Max amount", optional(metrics.max_amount)),
        ("Max margin", optional(metrics.max_margin)),
    ];

    let mut out = String::from("#table(\n  columns: 2,\n  [*Metric*], [*Value*],\n");
    for (name, value) in rows {
        out.push_str(&format!("  [{}], [{}],\n", name, value));
    }
    out.push_str(")\n");
    out
}

fn breakdown_rows(out: &mut String, label: &str, breakdown: &ExitBreakdown) {
    for kind in ExitKind::ALL {
        out.push_str(&format!(
            "  [{}], [{}], [{}], [{}], [{}],\n",
            label,
            kind,
            breakdown.count(kind, Signal::Long),
            breakdown.count(kind, Signal::Short),
            breakdown.by_kind(kind)
        ));
    }
    out.push_str(&format!(
        "  [{}], [open], [-], [-], [{}],\n",
        label, breakdown.unresolved
    ));
}

pub fn render_exit_breakdown(metrics: &LabelMetrics) -> String {
    let mut out = String::from(
        "#table(\n  columns: 5,\n  [*Set*], [*Exit*], [*Long*], [*Short*], [*Total*],\n",
    );
    breakdown_rows(&mut out, "All signals", &metrics.exits);
    breakdown_rows(&mut out, "Executed", &metrics.executed_exits);
    out.push_str(")\n");
    out
}

/// Executed positions in time order.
pub fn render_trade_log(bars: &[LabeledBar]) -> String {
    let trades: Vec<&LabeledBar> = bars.iter().filter(|b| b.active_order).collect();
    if trades.is_empty() {
        return "_No trades executed._\n".to_string();
    }

    let mut out = String::from(
        "#table(\n  columns: 8,\n  align: (right, left, left, right, left, left, right, right),\n",
    );
    out.push_str(
        "  [*\\#*], [*Opened*], [*Side*], [*Entry*], [*Exit*], [*Closed*], [*Return*], [*PnL*],\n",
    );

    for (i, bar) in trades.iter().enumerate() {
        let exit = bar
            .exit_kind
            .map_or_else(|| "open".to_string(), |k| k.to_string());
        let closed = bar.exit_timestamp.map_or_else(
            || "-".to_string(),
            |t| t.format("%Y-%m-%d %H:%M").to_string(),
        );
        let ret = bar
            .ret
            .map_or_else(|| "-".to_string(), |r| format!("{:+.3}%", r * 100.0));
        let pnl = bar.ret_usd.map_or_else(|| "[-]".to_string(), pnl_cell);

        out.push_str(&format!(
            "  [{}], [{}], [{}], [{:.2}], [{}], [{}], [{}], {},\n",
            i + 1,
            bar.timestamp.format("%Y-%m-%d %H:%M"),
            bar.signal,
            bar.close,
            exit,
            closed,
            ret,
            pnl
        ));
    }

    out.push_str(")\n");
    out
}
