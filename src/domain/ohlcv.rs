//! OHLCV bar representation and validated price history.

use crate::domain::error::ConftraderError;
use chrono::{Duration, NaiveDateTime};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// A bar carrying only a close; open/high/low default to the close.
    pub fn from_close(timestamp: NaiveDateTime, close: f64) -> Self {
        Self {
            timestamp,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
        }
    }

    pub fn price(&self, field: PriceField) -> f64 {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
        }
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    fn check(&self, index: usize) -> Result<(), ConftraderError> {
        let malformed = |reason: String| ConftraderError::MalformedBar { index, reason };

        for (name, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(malformed(format!("{name} must be a positive number, got {value}")));
            }
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(malformed(format!(
                "volume must be non-negative, got {}",
                self.volume
            )));
        }
        if self.high < self.open.max(self.close) {
            return Err(malformed(format!(
                "high {} below max(open, close)",
                self.high
            )));
        }
        if self.low > self.open.min(self.close) {
            return Err(malformed(format!(
                "low {} above min(open, close)",
                self.low
            )));
        }
        Ok(())
    }
}

/// The bar field used as "the price" by features and the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceField {
    Open,
    High,
    Low,
    #[default]
    Close,
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PriceField::Open => "open",
            PriceField::High => "high",
            PriceField::Low => "low",
            PriceField::Close => "close",
        };
        f.write_str(name)
    }
}

impl FromStr for PriceField {
    type Err = ConftraderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(PriceField::Open),
            "high" => Ok(PriceField::High),
            "low" => Ok(PriceField::Low),
            "close" => Ok(PriceField::Close),
            other => Err(ConftraderError::ConfigInvalid {
                section: "backtest".into(),
                key: "price_col".into(),
                reason: format!("unknown price column '{other}'"),
            }),
        }
    }
}

/// Price history sorted by ascending, unique timestamps with consistent OHLC.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(mut bars: Vec<PriceBar>) -> Result<Self, ConftraderError> {
        bars.sort_by_key(|b| b.timestamp);

        for (i, bar) in bars.iter().enumerate() {
            if i > 0 && bars[i - 1].timestamp == bar.timestamp {
                return Err(ConftraderError::DuplicateTimestamp {
                    timestamp: bar.timestamp,
                });
            }
            bar.check(i)?;
        }

        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn prices(&self, field: PriceField) -> Vec<f64> {
        self.bars.iter().map(|b| b.price(field)).collect()
    }

    /// Bars strictly after `last timestamp - days`.
    pub fn last_days(&self, days: u32) -> PriceSeries {
        let Some(last) = self.bars.last() else {
            return self.clone();
        };
        let cutoff = last.timestamp - Duration::days(i64::from(days));
        let start = self.bars.partition_point(|b| b.timestamp <= cutoff);
        PriceSeries {
            bars: self.bars[start..].to_vec(),
        }
    }

    pub fn first_and_last(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        Some((self.bars.first()?.timestamp, self.bars.last()?.timestamp))
    }
}
