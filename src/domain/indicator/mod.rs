//! Technical indicator implementations.
//!
//! Every indicator is a pure function over a price slice and returns series
//! aligned with its input, with `None` in the warm-up positions:
//! - `IndicatorType`: indicator identity + parameters
//! - `IndicatorSeries`: a single-output aligned series
//! - multi-output indicators (MACD, Bollinger) return their own structs

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod stddev;

pub use atr::calculate_atr;
pub use bollinger::{calculate_bollinger, BollingerSeries};
pub use ema::calculate_ema;
pub use macd::{calculate_macd, MacdSeries};
pub use rsi::calculate_rsi;
pub use stddev::calculate_stddev;

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Ema(usize),
    Rsi(usize),
    Atr(usize),
    Stddev(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<f64> {
        self.values.get(i).copied().flatten()
    }

    /// Index of the first defined value.
    pub fn first_valid(&self) -> Option<usize> {
        self.values.iter().position(Option::is_some)
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Stddev(period) => write!(f, "STDDEV({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_type_display_macd() {
        let macd = IndicatorType::Macd {
            fast: 12,
            slow: 26,
            signal: 9,
        };
        assert_eq!(macd.to_string(), "MACD(12,26,9)");
    }

    #[test]
    fn indicator_type_display_bollinger() {
        let boll = IndicatorType::Bollinger {
            period: 20,
            stddev_mult_x100: 200,
        };
        assert_eq!(boll.to_string(), "BOLLINGER(20,2)");
    }

    #[test]
    fn indicator_type_display_simple() {
        assert_eq!(IndicatorType::Rsi(14).to_string(), "RSI(14)");
        assert_eq!(IndicatorType::Atr(14).to_string(), "ATR(14)");
    }

    #[test]
    fn series_first_valid() {
        let series = IndicatorSeries {
            indicator_type: IndicatorType::Stddev(3),
            values: vec![None, None, Some(1.0), Some(2.0)],
        };
        assert_eq!(series.first_valid(), Some(2));
        assert_eq!(series.get(3), Some(2.0));
        assert_eq!(series.get(0), None);
        assert_eq!(series.get(10), None);
    }
}
