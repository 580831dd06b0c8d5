//! Summary statistics for a simulated equity curve.

use super::backtest::BacktestBar;
use super::indicator_helpers::{mean, quantile, sample_std};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const SHARPE_EPS: f64 = 1e-12;

/// Fixed-key summary of one backtest. Every field is 0 for an empty run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryStatistics {
    pub bars: usize,
    pub final_equity: f64,
    pub weekly_mean: f64,
    pub weekly_median: f64,
    pub weekly_p05: f64,
    pub weekly_p95: f64,
    pub sharpe_daily: f64,
    pub hit_rate: f64,
}

impl SummaryStatistics {
    pub fn compute(bars: &[BacktestBar]) -> Self {
        let Some(last) = bars.last() else {
            return Self::default();
        };

        let pnl: Vec<f64> = bars.iter().map(|b| b.pnl).collect();
        let weekly = weekly_returns(bars);

        let (weekly_mean, weekly_median, weekly_p05, weekly_p95) = if weekly.is_empty() {
            (0.0, 0.0, 0.0, 0.0)
        } else {
            (
                mean(&weekly),
                quantile(&weekly, 0.5),
                quantile(&weekly, 0.05),
                quantile(&weekly, 0.95),
            )
        };

        let hits = pnl.iter().filter(|&&p| p > 0.0).count();

        SummaryStatistics {
            bars: bars.len(),
            final_equity: last.equity,
            weekly_mean,
            weekly_median,
            weekly_p05,
            weekly_p95,
            sharpe_daily: sharpe_daily(&pnl),
            hit_rate: hits as f64 / bars.len() as f64,
        }
    }
}

/// √252 × mean / stdev of per-bar P&L; 0 when the stdev is zero or undefined.
pub fn sharpe_daily(pnl: &[f64]) -> f64 {
    match sample_std(pnl) {
        Some(sd) if sd > 0.0 => TRADING_DAYS_PER_YEAR.sqrt() * mean(pnl) / (sd + SHARPE_EPS),
        _ => 0.0,
    }
}

/// The Friday closing the week that contains `ts`.
pub fn week_ending_friday(ts: NaiveDateTime) -> NaiveDate {
    let date = ts.date();
    let from_monday = date.weekday().num_days_from_monday() as i64;
    date + Duration::days((4 - from_monday).rem_euclid(7))
}

/// Week-over-week change of the last equity in each Friday-ending week.
///
/// Weeks without bars carry the previous week's equity forward, contributing
/// a zero return. The first week has no prior value and is dropped.
pub fn weekly_returns(bars: &[BacktestBar]) -> Vec<f64> {
    let mut closes: Vec<(NaiveDate, f64)> = Vec::new();
    for bar in bars {
        let week = week_ending_friday(bar.timestamp);
        match closes.last_mut() {
            Some((w, equity)) if *w == week => *equity = bar.equity,
            _ => closes.push((week, bar.equity)),
        }
    }

    let mut returns = Vec::new();
    for pair in closes.windows(2) {
        let (prev_week, prev_equity) = pair[0];
        let (week, equity) = pair[1];

        let empty_weeks = (week - prev_week).num_days() / 7 - 1;
        returns.extend(std::iter::repeat_n(0.0, empty_weeks.max(0) as usize));

        returns.push(if prev_equity != 0.0 {
            (equity - prev_equity) / prev_equity
        } else {
            0.0
        });
    }
    returns
}
