//! Trade return calculation.
//!
//! ret = (exit_close / entry_close - 1) * direction - trade_cost
//!
//! The exit close is forward-filled: a time-limit exit that falls between
//! two candles takes the close of the last candle at or before it.

use super::barrier::ExitEvent;
use super::candle::{Candle, index_at_or_before};
use super::signal::Signal;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeReturn {
    pub exit_close: f64,
    pub ret: f64,
    pub sign: i8,
}

/// -1, 0 or +1. A zero return is not profitable.
pub fn return_sign(ret: f64) -> i8 {
    if ret > 0.0 {
        1
    } else if ret < 0.0 {
        -1
    } else {
        0
    }
}

pub fn trade_return(
    candles: &[Candle],
    index: usize,
    signal: Signal,
    exit: &ExitEvent,
    trade_cost: f64,
) -> Option<TradeReturn> {
    if signal.is_flat() {
        return None;
    }
    let exit_index = index_at_or_before(candles, exit.timestamp)?;
    let exit_close = candles[exit_index].close;
    let ret = (exit_close / candles[index].close - 1.0) * signal.direction() - trade_cost;
    Some(TradeReturn {
        exit_close,
        ret,
        sign: return_sign(ret),
    })
}

pub fn calculate_returns(
    candles: &[Candle],
    signals: &[Signal],
    exits: &[Option<ExitEvent>],
    trade_cost: f64,
) -> Vec<Option<TradeReturn>> {
    exits
        .iter()
        .enumerate()
        .map(|(i, exit)| {
            exit.as_ref()
                .and_then(|e| trade_return(candles, i, signals[i], e, trade_cost))
        })
        .collect()
}
