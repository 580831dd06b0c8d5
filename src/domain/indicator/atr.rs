//! Average True Range: simple rolling mean of the true range.
//!
//! The first bar has no previous close, so its true range is high - low.
//! Warmup: first (period-1) bars are undefined.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::rolling_mean;
use crate::domain::ohlcv::{PriceBar, PriceField};

pub fn calculate_atr(bars: &[PriceBar], price: PriceField, period: usize) -> IndicatorSeries {
    let tr: Vec<Option<f64>> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            Some(if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].price(price))
            })
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values: rolling_mean(&tr, period),
    }
}
