//! Signal source port trait.

use crate::domain::candle::Candle;
use crate::domain::error::LabError;
use crate::domain::signal::SignalPoint;

/// A strategy seen from the labeling core: one signal per candle, same
/// timestamps, same order.
pub trait SignalPort {
    fn generate(&self, candles: &[Candle]) -> Result<Vec<SignalPoint>, LabError>;
}
