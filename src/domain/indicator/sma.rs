//! Simple Moving Average.
//!
//! For index `i < length - 1` the window is the whole available prefix, so
//! the output carries no nulls. Rules over an SMA can therefore fire before
//! the window fills, unlike rules over an EMA.

use super::round3;

pub fn sma(length: usize, prices: &[f64]) -> Vec<f64> {
    let mut values = Vec::with_capacity(prices.len());
    let mut sum = 0.0;

    for (i, price) in prices.iter().enumerate() {
        sum += price;
        if i >= length {
            sum -= prices[i - length];
        }
        let window = (i + 1).min(length);
        values.push(round3(sum / window as f64));
    }

    values
}
