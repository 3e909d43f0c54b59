//! Position sizing and realized PnL.
//!
//! Only bars that opened a position carry an amount. Every trade is sized at
//! `initial_capital`; capital does not compound across trades.

use super::error::LabError;
use super::labeling_config::LabelingConfig;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PnlRow {
    pub amount: Option<f64>,
    pub margin: Option<f64>,
    /// `None` for non-active bars and for active bars whose exit is unresolved.
    pub ret_usd: Option<f64>,
    /// Running sum of `ret_usd`, carried forward. `None` before the first
    /// realized trade.
    pub cumulative_pnl: Option<f64>,
}

/// Compute sizing and PnL for every bar. `returns[i]` is the net return of
/// the entry at bar `i`, if resolved.
pub fn account(
    active: &[bool],
    returns: &[Option<f64>],
    config: &LabelingConfig,
) -> Result<Vec<PnlRow>, LabError> {
    if !(config.leverage.is_finite() && config.leverage > 0.0) {
        return Err(LabError::invalid(
            "account",
            "leverage",
            "leverage must be positive",
        ));
    }
    if !(config.initial_capital.is_finite() && config.initial_capital > 0.0) {
        return Err(LabError::invalid(
            "account",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    debug_assert_eq!(active.len(), returns.len());

    let amount = config.initial_capital;
    let margin = amount / config.leverage;
    let mut cumulative: Option<f64> = None;

    let rows = active
        .iter()
        .zip(returns)
        .map(|(&is_active, ret)| {
            if !is_active {
                return PnlRow {
                    cumulative_pnl: cumulative,
                    ..PnlRow::default()
                };
            }
            let ret_usd = ret.map(|r| amount * r);
            if let Some(usd) = ret_usd {
                cumulative = Some(cumulative.unwrap_or(0.0) + usd);
            }
            PnlRow {
                amount: Some(amount),
                margin: Some(margin),
                ret_usd,
                cumulative_pnl: cumulative,
            }
        })
        .collect();

    Ok(rows)
}
