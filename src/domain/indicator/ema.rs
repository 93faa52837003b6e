//! Exponential Moving Average.
//!
//! The first `length` entries are null. The smoothing seed is the SMA of
//! the first `length` prices; from index `length` onward,
//! `ema[i] = k * (price[i] - prev) + prev` with `k = 2 / (length + 1)`.

use super::round3;

pub fn ema(length: usize, prices: &[f64]) -> Vec<Option<f64>> {
    let mut values: Vec<Option<f64>> = vec![None; prices.len().min(length)];
    if length == 0 || prices.len() <= length {
        values.resize(prices.len(), None);
        return values;
    }

    let k = 2.0 / (length as f64 + 1.0);
    let mut prev = prices[..length].iter().sum::<f64>() / length as f64;

    for price in &prices[length..] {
        prev = k * (price - prev) + prev;
        values.push(Some(round3(prev)));
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_warmup_is_null() {
        let prices = [10.0, 20.0, 30.0, 40.0, 50.0];
        let values = ema(3, &prices);
        assert_eq!(values.len(), 5);
        assert_eq!(values[0], None);
        assert_eq!(values[1], None);
        assert_eq!(values[2], None);
        assert!(values[3].is_some());
    }

    #[test]
    fn ema_first_value_uses_sma_seed() {
        let prices = [10.0, 20.0, 30.0, 40.0];
        let values = ema(3, &prices);
        // seed = 20, k = 0.5, ema = 0.5 * (40 - 20) + 20 = 30
        assert_eq!(values[3], Some(30.0));
    }

    #[test]
    fn ema_chains_from_previous() {
        let prices = [10.0, 20.0, 30.0, 40.0, 50.0];
        let values = ema(3, &prices);
        // prev = 30 (see above), ema = 0.5 * (50 - 30) + 30 = 40
        assert_eq!(values[4], Some(40.0));
    }

    #[test]
    fn ema_short_input_all_null() {
        let values = ema(5, &[1.0, 2.0, 3.0]);
        assert_eq!(values, vec![None, None, None]);
    }
}
