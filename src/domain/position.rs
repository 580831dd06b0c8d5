//! Position sizing: confidence → probability, volatility targeting, Kelly cap.

use crate::domain::features::FeatureRow;
use chrono::NaiveDateTime;

/// Win/loss payoff ratio assumed by the Kelly cap.
pub const PAYOFF_RATIO: f64 = 1.2;
/// Realized volatility used when neither vol20 nor vol10 is defined.
pub const VOL_FLOOR: f64 = 0.01;
/// At or below this realized volatility the vol-target scale is disabled.
pub const MIN_REALIZED_VOL: f64 = 1e-6;
const PAYOFF_EPS: f64 = 1e-9;
const KELLY_CAP_EPS: f64 = 1e-6;

/// Target exposure for one bar, taken at its close.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub timestamp: NaiveDateTime,
    pub close: f64,
    pub prob_up: f64,
    pub confidence: f64,
    /// Leverage multiplier in [0, max_leverage].
    pub size: f64,
}

/// Monotone map from confidence to probability of an up move, in [0.5, 0.99].
pub fn prob_up(confidence: f64) -> f64 {
    (0.5 + 0.5 * confidence).clamp(0.5, 0.99)
}

/// Unclipped Kelly fraction p - (1 - p) / payoff.
pub fn kelly_fraction(p: f64, payoff_ratio: f64) -> f64 {
    p - (1.0 - p) / (payoff_ratio + PAYOFF_EPS)
}

/// vol20, else vol10, else [`VOL_FLOOR`].
pub fn realized_vol(row: &FeatureRow) -> f64 {
    [row.vol20, row.vol10]
        .into_iter()
        .find(|v| v.is_finite())
        .unwrap_or(VOL_FLOOR)
}

/// confidence × max_leverage, scaled by target/realized volatility and clipped
/// to [0, max_leverage].
pub fn vol_targeted_size(
    confidence: f64,
    realized_vol: f64,
    vol_target: f64,
    max_leverage: f64,
) -> f64 {
    let base = confidence * max_leverage;
    let scale = if realized_vol > MIN_REALIZED_VOL {
        vol_target / realized_vol
    } else {
        1.0
    };
    (base * scale).clamp(0.0, max_leverage)
}

/// Caps a vol-targeted size by the Kelly fraction of `prob_up`.
pub fn kelly_capped_size(size: f64, prob_up: f64, kelly_cap: f64, max_leverage: f64) -> f64 {
    let kelly = kelly_fraction(prob_up, PAYOFF_RATIO).clamp(0.0, 1.0);
    size.min(kelly * kelly_cap * max_leverage + KELLY_CAP_EPS)
}
