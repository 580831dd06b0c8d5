//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Built on the unadjusted EMA, so all three outputs are defined from the first bar.

use crate::domain::indicator::{calculate_ema, IndicatorType};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub indicator_type: IndicatorType,
    pub line: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

pub fn calculate_macd(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> MacdSeries {
    let indicator_type = IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    };

    if closes.is_empty() || fast == 0 || slow == 0 || signal_period == 0 {
        return MacdSeries {
            indicator_type,
            line: Vec::new(),
            signal: Vec::new(),
            histogram: Vec::new(),
        };
    }

    let ema_fast = calculate_ema(closes, fast);
    let ema_slow = calculate_ema(closes, slow);

    let line: Vec<f64> = ema_fast
        .values
        .iter()
        .zip(&ema_slow.values)
        .map(|(f, s)| f.unwrap_or(0.0) - s.unwrap_or(0.0))
        .collect();

    let signal = calculate_ema(&line, signal_period).values;
    let histogram = line
        .iter()
        .zip(&signal)
        .map(|(l, s)| s.map(|s| l - s))
        .collect();

    MacdSeries {
        indicator_type,
        line: line.into_iter().map(Some).collect(),
        signal,
        histogram,
    }
}
