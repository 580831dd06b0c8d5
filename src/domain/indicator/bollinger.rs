//! Bollinger Bands with %B and band width.
//!
//! - Middle: rolling mean over n periods
//! - Upper/Lower: middle ± multiplier × rolling sample stdev
//! - %B: (close - lower) / (upper - lower + 1e-12)
//! - Width: (upper - lower) / (middle + 1e-12)
//!
//! Default parameters: period=20, multiplier=2.0. Warmup: first (period-1) bars.

use crate::domain::indicator::{calculate_stddev, IndicatorType};
use crate::domain::indicator_helpers::{defined, rolling_mean};

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULT_X100: u32 = 200;

const BAND_EPS: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerSeries {
    pub indicator_type: IndicatorType,
    pub middle: Vec<Option<f64>>,
    pub upper: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
    pub percent_b: Vec<Option<f64>>,
    pub width: Vec<Option<f64>>,
}

pub fn calculate_bollinger(closes: &[f64], period: usize, stddev_mult_x100: u32) -> BollingerSeries {
    let mult = stddev_mult_x100 as f64 / 100.0;
    let series = defined(closes);
    let middle = rolling_mean(&series, period);
    let sd = calculate_stddev(&series, period).values;

    let n = closes.len();
    let mut upper = Vec::with_capacity(n);
    let mut lower = Vec::with_capacity(n);
    let mut percent_b = Vec::with_capacity(n);
    let mut width = Vec::with_capacity(n);

    for i in 0..n {
        match (middle[i], sd[i]) {
            (Some(m), Some(s)) => {
                let up = m + mult * s;
                let lo = m - mult * s;
                upper.push(Some(up));
                lower.push(Some(lo));
                percent_b.push(Some((closes[i] - lo) / (up - lo + BAND_EPS)));
                width.push(Some((up - lo) / (m + BAND_EPS)));
            }
            _ => {
                upper.push(None);
                lower.push(None);
                percent_b.push(None);
                width.push(None);
            }
        }
    }

    BollingerSeries {
        indicator_type: IndicatorType::Bollinger {
            period,
            stddev_mult_x100,
        },
        middle,
        upper,
        lower,
        percent_b,
        width,
    }
}
