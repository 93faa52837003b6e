//! Moving Average Convergence Divergence.
//!
//! `macd[i] = ema(12)[i] - ema(26)[i]`, null wherever either EMA is null.

use super::ema::ema;
use super::round3;

pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;

pub fn macd(prices: &[f64]) -> Vec<Option<f64>> {
    let fast = ema(MACD_FAST, prices);
    let slow = ema(MACD_SLOW, prices);

    fast.into_iter()
        .zip(slow)
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(round3(f - s)),
            _ => None,
        })
        .collect()
}
