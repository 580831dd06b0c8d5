//! RSI (Relative Strength Index).
//!
//! Average gain/loss are simple rolling means of the positive/negative price
//! deltas, not Wilder's exponential smoothing. This matches the scoring model
//! the confidence weights were fitted against, so it is kept as-is.
//!
//! Formula: RSI = 100 - 100 / (1 + mean(up) / (mean(down) + 1e-12))
//! Warmup: first `period` bars are undefined (the first delta is undefined).

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::{diff, rolling_mean};

const RSI_EPS: f64 = 1e-12;

pub fn calculate_rsi(closes: &[f64], period: usize) -> IndicatorSeries {
    let delta = diff(closes);
    let up: Vec<Option<f64>> = delta.iter().map(|d| d.map(|v| v.max(0.0))).collect();
    let down: Vec<Option<f64>> = delta.iter().map(|d| d.map(|v| (-v).max(0.0))).collect();

    let avg_up = rolling_mean(&up, period);
    let avg_down = rolling_mean(&down, period);

    let values = avg_up
        .iter()
        .zip(&avg_down)
        .map(|(u, d)| {
            let rs = (*u)? / ((*d)? + RSI_EPS);
            Some(100.0 - 100.0 / (1.0 + rs))
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}
