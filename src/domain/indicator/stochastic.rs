//! Stochastic oscillator (%K).
//!
//! `(close - lowest low) / (highest high - lowest low) * 100` over a
//! trailing window that accumulates from day 0 and caps at `length`.

use super::round3;

pub fn stochastic_oscillator(
    length: usize,
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
) -> Vec<f64> {
    let mut values = Vec::with_capacity(closes.len());

    for i in 0..closes.len() {
        let start = (i + 1).saturating_sub(length.max(1));
        let low = lows[start..=i].iter().cloned().fold(f64::INFINITY, f64::min);
        let high = highs[start..=i]
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);

        let value = if high == low {
            0.0
        } else {
            (closes[i] - low) / (high - low) * 100.0
        };
        values.push(round3(value));
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stochastic_close_at_high_is_100() {
        let highs = [110.0, 112.0, 115.0];
        let lows = [100.0, 101.0, 102.0];
        let closes = [105.0, 106.0, 115.0];
        let values = stochastic_oscillator(3, &highs, &lows, &closes);
        assert_eq!(values[2], 100.0);
    }

    #[test]
    fn stochastic_close_at_low_is_0() {
        let highs = [110.0, 112.0, 115.0];
        let lows = [100.0, 101.0, 102.0];
        let closes = [105.0, 106.0, 100.0];
        let values = stochastic_oscillator(3, &highs, &lows, &closes);
        assert_eq!(values[2], 0.0);
    }

    #[test]
    fn stochastic_partial_window_from_day_0() {
        let highs = [110.0, 120.0];
        let lows = [100.0, 100.0];
        let closes = [105.0, 110.0];
        let values = stochastic_oscillator(14, &highs, &lows, &closes);
        // day 0 window is just day 0: (105 - 100) / (110 - 100) * 100
        assert_eq!(values[0], 50.0);
        // day 1 window is days 0..=1: (110 - 100) / (120 - 100) * 100
        assert_eq!(values[1], 50.0);
    }

    #[test]
    fn stochastic_window_slides() {
        let highs = [200.0, 110.0, 110.0];
        let lows = [90.0, 100.0, 100.0];
        let closes = [100.0, 105.0, 105.0];
        let values = stochastic_oscillator(2, &highs, &lows, &closes);
        // day 2 window excludes day 0's extremes
        assert_eq!(values[2], 50.0);
    }

    #[test]
    fn stochastic_flat_range_is_0() {
        let values = stochastic_oscillator(3, &[100.0], &[100.0], &[100.0]);
        assert_eq!(values[0], 0.0);
    }
}
