//! Trade archive analytics, computed once over the closed positions.

use serde::Serialize;

use crate::domain::indicator::round3;
use crate::domain::position::Position;

/// Aggregate statistics over a simulation's closed trades. Built by
/// [`Analysis::compute`]; every field is final after construction.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    /// Share of trades closed at or above break-even, as a percentage.
    pub effectiveness: f64,
    pub total_profit_loss: f64,
    pub avg_profit_loss: f64,
    pub median_profit_loss: f64,
    pub stddev_profit_loss: f64,
    pub total_profit_loss_pct: f64,
    pub avg_profit_loss_pct: f64,
    pub median_profit_loss_pct: f64,
    pub stddev_profit_loss_pct: f64,
}

impl Analysis {
    pub fn compute(archive: &[Position]) -> Self {
        let absolute: Vec<f64> = archive
            .iter()
            .filter_map(Position::lifetime_profit_loss)
            .collect();
        let percent: Vec<f64> = archive
            .iter()
            .filter_map(Position::lifetime_profit_loss_pct)
            .collect();

        let winners = percent.iter().filter(|&&pl| pl >= 0.0).count();
        let effectiveness = if percent.is_empty() {
            0.0
        } else {
            round3(winners as f64 / percent.len() as f64 * 100.0)
        };

        Analysis {
            effectiveness,
            total_profit_loss: round3(absolute.iter().sum()),
            avg_profit_loss: round3(mean(&absolute)),
            median_profit_loss: round3(median(&absolute)),
            stddev_profit_loss: round3(stddev(&absolute)),
            total_profit_loss_pct: round3(percent.iter().sum()),
            avg_profit_loss_pct: round3(mean(&percent)),
            median_profit_loss_pct: round3(median(&percent)),
            stddev_profit_loss_pct: round3(stddev(&percent)),
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Population standard deviation.
fn stddev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
