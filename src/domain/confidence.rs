//! Directional confidence in [0, 1] from feature rows.
//!
//! Scoring runs in two stages:
//! 1. [`width_ranks`] ranks each row's Bollinger width within the batch the
//!    caller passes in. This is the only batch-dependent input.
//! 2. [`row_score`] combines one row with its rank into a raw score using
//!    bounded (tanh) transforms; [`confidence_from_score`] squashes it to [0, 1].
//!
//! [`score_batch`] runs both stages over a slice. Undefined (non-finite)
//! feature values are treated as 0 before any transform.

use crate::domain::features::FeatureRow;
use crate::domain::indicator_helpers::percentile_rank;

const W_MOMENTUM: f64 = 0.35;
const W_MACD: f64 = 0.25;
const W_SQUEEZE: f64 = 0.15;
const W_RSI: f64 = 0.15;
const W_VOL_PENALTY: f64 = 0.20;
const VOL_RATIO_EPS: f64 = 1e-9;

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

/// Percentile rank of each row's band width within `rows`.
pub fn width_ranks(rows: &[FeatureRow]) -> Vec<f64> {
    let widths: Vec<f64> = rows.iter().map(|r| finite_or_zero(r.bb_width)).collect();
    percentile_rank(&widths)
}

/// Raw score for one row given its batch-relative width rank.
pub fn row_score(row: &FeatureRow, width_rank: f64) -> f64 {
    let z_mom5 = finite_or_zero(row.z_mom5);
    let macd_hist = finite_or_zero(row.macd_hist);
    let rank = finite_or_zero(width_rank);
    let rsi = finite_or_zero(row.rsi14);
    let vol10 = finite_or_zero(row.vol10);
    let vol20 = finite_or_zero(row.vol20);

    let momentum = W_MOMENTUM * z_mom5.tanh();
    let trend = W_MACD * (5.0 * macd_hist).tanh();
    // narrow bands (low width rank) lean bullish
    let squeeze = W_SQUEEZE * (3.0 * (0.5 - rank)).tanh();
    let oscillator = W_RSI * ((rsi - 50.0) / 10.0).tanh();
    let vol_ratio = vol10 / (vol20 + VOL_RATIO_EPS);
    let penalty = W_VOL_PENALTY * (3.0 * vol_ratio - 1.0).tanh().max(0.0);

    momentum + trend + squeeze + oscillator - penalty
}

pub fn confidence_from_score(score: f64) -> f64 {
    (0.5 + 0.5 * finite_or_zero(score).tanh()).clamp(0.0, 1.0)
}

/// Confidence for every row, with width ranks taken over exactly `rows`.
pub fn score_batch(rows: &[FeatureRow]) -> Vec<f64> {
    width_ranks(rows)
        .iter()
        .zip(rows)
        .map(|(&rank, row)| confidence_from_score(row_score(row, rank)))
        .collect()
}
