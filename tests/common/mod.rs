#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use conftrader::domain::error::ConftraderError;
pub use conftrader::domain::ohlcv::{PriceBar, PriceField, PriceSeries};
use conftrader::ports::data_port::DataPort;
use std::collections::HashMap;
use std::f64::consts::TAU;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(&self, symbol: &str, _price: PriceField) -> Result<Vec<PriceBar>, ConftraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(ConftraderError::Data {
                reason: reason.clone(),
            });
        }
        self.data
            .get(symbol)
            .cloned()
            .ok_or_else(|| ConftraderError::Data {
                reason: format!("no data for {symbol}"),
            })
    }

    fn list_symbols(&self) -> Result<Vec<String>, ConftraderError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, ConftraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(ConftraderError::Data {
                reason: reason.clone(),
            });
        }
        match self.data.get(symbol) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.timestamp).min().unwrap();
                let max = bars.iter().map(|b| b.timestamp).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn day(i: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::days(i as i64)
}

/// Daily close-only bars.
pub fn close_bars(closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| PriceBar::from_close(day(i), c))
        .collect()
}

/// Daily bars with a symmetric intrabar range of `range_pct` around the close.
pub fn ranged_bars(closes: &[f64], range_pct: f64) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| PriceBar {
            timestamp: day(i),
            open: c,
            high: c * (1.0 + range_pct),
            low: c * (1.0 - range_pct),
            close: c,
            volume: 1000.0,
        })
        .collect()
}

/// 100 · (1 + 0.05 · sin(2π·i/20)).
pub fn sinusoid(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 100.0 * (1.0 + 0.05 * (TAU * i as f64 / 20.0).sin()))
        .collect()
}

pub fn constant(n: usize, price: f64) -> Vec<f64> {
    vec![price; n]
}

pub fn series(bars: Vec<PriceBar>) -> PriceSeries {
    PriceSeries::new(bars).unwrap()
}

/// Bars as a `timestamp,open,high,low,close,volume` CSV document.
pub fn bars_to_csv(bars: &[PriceBar]) -> String {
    let mut out = String::from("timestamp,open,high,low,close,volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.timestamp.format("%Y-%m-%d"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    out
}
