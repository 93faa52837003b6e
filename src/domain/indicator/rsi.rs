//! Relative Strength Index.
//!
//! Rolling average of gains against losses over a trailing window. The
//! rolling gain/loss buffers are hard-capped at [`RSI_WINDOW_CAP`]
//! observations regardless of the requested length; the length parameter
//! only governs how much warm-up data a strategy fetches.
//!
//! The output is front-filled with the first computed value so its length
//! equals the input length.

use super::round3;
use std::collections::VecDeque;

pub const RSI_WINDOW_CAP: usize = 14;

pub fn rsi(_length: usize, prices: &[f64]) -> Vec<f64> {
    if prices.len() < 2 {
        return vec![0.0; prices.len()];
    }

    let mut gains: VecDeque<f64> = VecDeque::with_capacity(RSI_WINDOW_CAP);
    let mut losses: VecDeque<f64> = VecDeque::with_capacity(RSI_WINDOW_CAP);
    let mut values = Vec::with_capacity(prices.len());

    for i in 1..prices.len() {
        let change = prices[i] - prices[i - 1];
        if gains.len() == RSI_WINDOW_CAP {
            gains.pop_front();
            losses.pop_front();
        }
        gains.push_back(change.max(0.0));
        losses.push_back((-change).max(0.0));

        let avg_gain = gains.iter().sum::<f64>() / gains.len() as f64;
        let avg_loss = losses.iter().sum::<f64>() / losses.len() as f64;

        let value = if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
        };
        values.push(round3(value));
    }

    // Front-fill so day 0 carries the first computed value.
    values.insert(0, values[0]);
    values
}
