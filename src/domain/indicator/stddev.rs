//! Rolling standard deviation.
//!
//! Sample standard deviation (divides by n-1) over a trailing window of n
//! defined values. Positions whose window contains an undefined value are
//! undefined.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::{sample_std, window_at};

pub fn calculate_stddev(values: &[Option<f64>], period: usize) -> IndicatorSeries {
    let values = (0..values.len())
        .map(|i| window_at(values, i, period).and_then(|w| sample_std(&w)))
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Stddev(period),
        values,
    }
}
