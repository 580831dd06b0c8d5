//! Bar-by-bar simulation with intrabar stop-loss / take-profit.
//!
//! Positions are taken at a bar's close and realized over the next bar, so
//! each bar's P&L uses the previous bar's size. On every bar after the first,
//! the previous close sets two thresholds checked against this bar's range:
//! - high ≥ prev_close × (1 + take_profit_pct) realizes exactly +take_profit_pct
//! - low ≤ prev_close × (1 − stop_loss_pct) realizes exactly −stop_loss_pct
//!
//! When both trigger on the same bar the stop-loss wins.

use crate::domain::metrics::SummaryStatistics;
use crate::domain::ohlcv::PriceBar;
use crate::domain::position::Position;
use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestBar {
    pub timestamp: NaiveDateTime,
    pub close: f64,
    pub prob_up: f64,
    pub confidence: f64,
    pub size: f64,
    /// Close-to-close return.
    pub ret_bar: f64,
    /// Return after the stop/take override.
    pub realized: f64,
    pub pnl: f64,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub bars: Vec<BacktestBar>,
    pub summary: SummaryStatistics,
}

impl BacktestResult {
    pub fn from_bars(bars: Vec<BacktestBar>) -> Self {
        let summary = SummaryStatistics::compute(&bars);
        Self { bars, summary }
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// Stop/take thresholds as fractions of the previous close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitRule {
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
}

impl ExitRule {
    /// Realized return for a bar given the previous close and this bar's range.
    pub fn apply(&self, ret_bar: f64, prev_close: f64, high: f64, low: f64) -> f64 {
        let mut realized = ret_bar;
        if high >= prev_close * (1.0 + self.take_profit_pct) {
            realized = self.take_profit_pct;
        }
        if low <= prev_close * (1.0 - self.stop_loss_pct) {
            realized = -self.stop_loss_pct;
        }
        realized
    }
}

/// Simulates `positions` against the aligned `bars` (same length, same order).
pub fn simulate(positions: &[Position], bars: &[PriceBar], exits: ExitRule) -> Vec<BacktestBar> {
    debug_assert_eq!(positions.len(), bars.len());

    let mut out = Vec::with_capacity(positions.len());
    let mut equity = 1.0;

    for (i, (pos, bar)) in positions.iter().zip(bars).enumerate() {
        let (ret_bar, realized, lagged_size) = if i == 0 {
            (0.0, 0.0, 0.0)
        } else {
            let prev = &positions[i - 1];
            let ret_bar = if prev.close != 0.0 {
                (pos.close - prev.close) / prev.close
            } else {
                0.0
            };
            let realized = exits.apply(ret_bar, prev.close, bar.high, bar.low);
            (ret_bar, realized, prev.size)
        };

        let pnl = lagged_size * realized;
        equity *= 1.0 + pnl;

        out.push(BacktestBar {
            timestamp: pos.timestamp,
            close: pos.close,
            prob_up: pos.prob_up,
            confidence: pos.confidence,
            size: pos.size,
            ret_bar,
            realized,
            pnl,
            equity,
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    const EXITS: ExitRule = ExitRule {
        stop_loss_pct: 0.02,
        take_profit_pct: 0.04,
    };

    fn ts(i: usize) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::days(i as i64)
    }

    fn inputs(ohlc: &[(f64, f64, f64)], size: f64) -> (Vec<Position>, Vec<PriceBar>) {
        let positions = ohlc
            .iter()
            .enumerate()
            .map(|(i, &(_, _, close))| Position {
                timestamp: ts(i),
                close,
                prob_up: 0.75,
                confidence: 0.5,
                size,
            })
            .collect();
        let bars = ohlc
            .iter()
            .enumerate()
            .map(|(i, &(high, low, close))| PriceBar {
                timestamp: ts(i),
                open: close,
                high,
                low,
                close,
                volume: 0.0,
            })
            .collect();
        (positions, bars)
    }

    #[test]
    fn first_bar_is_flat() {
        let (p, b) = inputs(&[(120.0, 80.0, 100.0)], 1.0);
        let out = simulate(&p, &b, EXITS);
        assert_eq!(out[0].ret_bar, 0.0);
        assert_eq!(out[0].realized, 0.0);
        assert_eq!(out[0].pnl, 0.0);
        assert_eq!(out[0].equity, 1.0);
    }

    #[test]
    fn pnl_uses_previous_size() {
        let (mut p, b) = inputs(&[(100.0, 100.0, 100.0), (101.0, 101.0, 101.0)], 1.0);
        p[0].size = 2.0;
        p[1].size = 0.0;
        let out = simulate(&p, &b, EXITS);
        assert!((out[1].ret_bar - 0.01).abs() < 1e-12);
        assert!((out[1].pnl - 0.02).abs() < 1e-12);
        assert!((out[1].equity - 1.02).abs() < 1e-12);
    }

    #[test]
    fn take_profit_overrides_close_return() {
        let (p, b) = inputs(&[(100.0, 100.0, 100.0), (105.0, 100.5, 101.0)], 1.0);
        let out = simulate(&p, &b, EXITS);
        assert_eq!(out[1].realized, 0.04);
        assert!((out[1].ret_bar - 0.01).abs() < 1e-12);
    }

    #[test]
    fn stop_loss_overrides_close_return() {
        let (p, b) = inputs(&[(100.0, 100.0, 100.0), (100.5, 97.0, 100.2)], 1.0);
        let out = simulate(&p, &b, EXITS);
        assert_eq!(out[1].realized, -0.02);
    }

    #[test]
    fn stop_loss_wins_when_both_trigger() {
        let (p, b) = inputs(&[(100.0, 100.0, 100.0), (110.0, 90.0, 104.0)], 1.0);
        let out = simulate(&p, &b, EXITS);
        assert_eq!(out[1].realized, -0.02);
        assert!((out[1].pnl + 0.02).abs() < 1e-12);
    }

    #[test]
    fn thresholds_are_inclusive() {
        let rule = ExitRule {
            stop_loss_pct: 0.5,
            take_profit_pct: 0.5,
        };
        assert_eq!(rule.apply(0.1, 100.0, 150.0, 100.0), 0.5);
        assert_eq!(rule.apply(0.1, 100.0, 100.0, 50.0), -0.5);
        assert_eq!(rule.apply(0.1, 100.0, 149.0, 51.0), 0.1);
    }

    #[test]
    fn equity_compounds() {
        let (p, b) = inputs(
            &[
                (100.0, 100.0, 100.0),
                (101.0, 101.0, 101.0),
                (101.0, 99.99, 99.99),
            ],
            1.0,
        );
        let out = simulate(&p, &b, EXITS);
        let expected = (1.0 + out[1].pnl) * (1.0 + out[2].pnl);
        assert!((out[2].equity - expected).abs() < 1e-12);
    }

    #[test]
    fn empty_input() {
        assert!(simulate(&[], &[], EXITS).is_empty());
        let result = BacktestResult::from_bars(vec![]);
        assert!(result.is_empty());
        assert_eq!(result.summary, SummaryStatistics::default());
    }
}
