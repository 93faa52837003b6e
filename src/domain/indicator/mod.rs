//! Technical indicator implementations.
//!
//! Pure functions over plain numeric sequences; no knowledge of [`Series`]
//! or strategies. Each indicator defines its own warm-up semantics: SMA
//! averages whatever prefix is available, EMA/MACD emit `None` until seeded,
//! RSI front-fills with its first computed value.
//!
//! [`Series`]: crate::domain::ohlcv::Series

pub mod candle;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stochastic;

use crate::domain::error::StratsimError;

/// Per-day candle coloring, green when the close is at or above the open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandleColor {
    Green,
    Red,
}

pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Per-day rate of change of an indicator between two sampled points,
/// `(y2 - y1) / length`, rounded to 2 decimals.
pub fn slope(y2: f64, y1: f64, length: u32) -> Result<f64, StratsimError> {
    if length < 2 {
        return Err(StratsimError::Indicator {
            reason: format!("slope length must be at least 2, got {length}"),
        });
    }
    Ok(round2((y2 - y1) / length as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slope_basic() {
        assert_eq!(slope(110.0, 100.0, 10).unwrap(), 1.0);
        assert_eq!(slope(100.0, 110.0, 4).unwrap(), -2.5);
    }

    #[test]
    fn slope_rounds_to_two_decimals() {
        assert_eq!(slope(101.0, 100.0, 3).unwrap(), 0.33);
    }

    #[test]
    fn slope_rejects_short_length() {
        assert!(slope(110.0, 100.0, 1).is_err());
        assert!(slope(110.0, 100.0, 0).is_err());
        assert!(slope(110.0, 100.0, 2).is_ok());
    }
}
