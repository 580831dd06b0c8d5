//! Per-bar feature table built from a price history.
//!
//! Rows whose trailing windows are incomplete are dropped, so the table starts
//! at the first bar where every feature is defined. The binding constraint is
//! the 100-bar z-score of Bollinger %B, which itself needs 20 bars of history:
//! the first usable row is bar index [`WARMUP_BARS`].

use crate::domain::indicator::{
    bollinger, calculate_atr, calculate_bollinger, calculate_macd, calculate_rsi,
    calculate_stddev, macd,
};
use crate::domain::indicator_helpers::{pct_change, rolling_zscore};
use crate::domain::ohlcv::{PriceField, PriceSeries};
use chrono::NaiveDateTime;

pub const RSI_PERIOD: usize = 14;
pub const ATR_PERIOD: usize = 14;
pub const SHORT_VOL_WINDOW: usize = 10;
pub const LONG_VOL_WINDOW: usize = 20;
pub const ZSCORE_WINDOW: usize = 100;
const ZSCORE_EPS: f64 = 1e-9;

/// Number of leading bars dropped before the first complete feature row.
pub const WARMUP_BARS: usize = ZSCORE_WINDOW + bollinger::DEFAULT_PERIOD - 2;

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub timestamp: NaiveDateTime,
    pub close: f64,
    pub ret1: f64,
    pub ret5: f64,
    pub ret20: f64,
    pub rsi14: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_hist: f64,
    pub bb_pct_b: f64,
    pub bb_width: f64,
    pub atr14: f64,
    pub vol10: f64,
    pub vol20: f64,
    pub z_mom5: f64,
    pub z_bbp: f64,
}

pub fn build_features(series: &PriceSeries, price: PriceField) -> Vec<FeatureRow> {
    let bars = series.bars();
    let closes = series.prices(price);

    let ret1 = pct_change(&closes, 1);
    let ret5 = pct_change(&closes, 5);
    let ret20 = pct_change(&closes, 20);

    let rsi = calculate_rsi(&closes, RSI_PERIOD);
    let macd_series = calculate_macd(
        &closes,
        macd::DEFAULT_FAST,
        macd::DEFAULT_SLOW,
        macd::DEFAULT_SIGNAL,
    );
    let bands = calculate_bollinger(
        &closes,
        bollinger::DEFAULT_PERIOD,
        bollinger::DEFAULT_MULT_X100,
    );
    let atr = calculate_atr(bars, price, ATR_PERIOD);
    let vol10 = calculate_stddev(&ret1, SHORT_VOL_WINDOW);
    let vol20 = calculate_stddev(&ret1, LONG_VOL_WINDOW);
    for series in [&rsi, &atr, &vol10, &vol20] {
        tracing::trace!(
            indicator = %series.indicator_type,
            first_valid = ?series.first_valid(),
            "indicator computed"
        );
    }
    tracing::trace!(
        macd = %macd_series.indicator_type,
        bands = %bands.indicator_type,
        "indicator computed"
    );

    let z_mom5 = rolling_zscore(&ret5, ZSCORE_WINDOW, ZSCORE_EPS);
    let z_bbp = rolling_zscore(&bands.percent_b, ZSCORE_WINDOW, ZSCORE_EPS);

    let rows: Vec<FeatureRow> = (0..bars.len())
        .filter_map(|i| {
            Some(FeatureRow {
                timestamp: bars[i].timestamp,
                close: closes[i],
                ret1: ret1[i]?,
                ret5: ret5[i]?,
                ret20: ret20[i]?,
                rsi14: rsi.get(i)?,
                macd: macd_series.line[i]?,
                macd_signal: macd_series.signal[i]?,
                macd_hist: macd_series.histogram[i]?,
                bb_pct_b: bands.percent_b[i]?,
                bb_width: bands.width[i]?,
                atr14: atr.get(i)?,
                vol10: vol10.get(i)?,
                vol20: vol20.get(i)?,
                z_mom5: z_mom5[i]?,
                z_bbp: z_bbp[i]?,
            })
        })
        .collect();

    tracing::debug!(
        bars = bars.len(),
        rows = rows.len(),
        price = %price,
        "built feature rows"
    );
    rows
}
