//! Candle coloring.

use super::CandleColor;

/// Green when the close is at or above the open, red otherwise.
pub fn candle_color(opens: &[f64], closes: &[f64]) -> Vec<CandleColor> {
    opens
        .iter()
        .zip(closes)
        .map(|(open, close)| {
            if close >= open {
                CandleColor::Green
            } else {
                CandleColor::Red
            }
        })
        .collect()
}
