//! Candle source port trait.

use crate::domain::candle::Candle;
use crate::domain::error::LabError;
use chrono::{DateTime, Utc};

pub trait CandlePort {
    /// Candles in ascending time order with unique timestamps, restricted to
    /// the inclusive `[start, end]` range when bounds are given.
    fn fetch_candles(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Candle>, LabError>;

    /// First timestamp, last timestamp and bar count, or `None` when empty.
    fn get_data_range(&self) -> Result<Option<(DateTime<Utc>, DateTime<Utc>, usize)>, LabError> {
        let candles = self.fetch_candles(None, None)?;
        Ok(match (candles.first(), candles.last()) {
            (Some(first), Some(last)) => Some((first.timestamp, last.timestamp, candles.len())),
            _ => None,
        })
    }
}
