//! CSV report adapter implementing ReportPort.
//!
//! Writes one row per simulated bar:
//! timestamp, close, prob_up, confidence, size, ret_bar, realized, pnl, equity
//!
//! and, via [`CsvReportAdapter::write_summary`], one row of summary statistics
//! per symbol.

use crate::domain::backtest::{BacktestBar, BacktestResult};
use crate::domain::error::ConftraderError;
use crate::domain::metrics::SummaryStatistics;
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Serialize)]
struct BarRow {
    timestamp: String,
    close: f64,
    prob_up: f64,
    confidence: f64,
    size: f64,
    ret_bar: f64,
    realized: f64,
    pnl: f64,
    equity: f64,
}

impl From<&BacktestBar> for BarRow {
    fn from(bar: &BacktestBar) -> Self {
        Self {
            timestamp: bar.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            close: bar.close,
            prob_up: bar.prob_up,
            confidence: bar.confidence,
            size: bar.size,
            ret_bar: bar.ret_bar,
            realized: bar.realized,
            pnl: bar.pnl,
            equity: bar.equity,
        }
    }
}

#[derive(Serialize)]
struct SummaryRow<'a> {
    symbol: &'a str,
    bars: usize,
    final_equity: f64,
    weekly_mean: f64,
    weekly_median: f64,
    weekly_p05: f64,
    weekly_p95: f64,
    sharpe_daily: f64,
    hit_rate: f64,
}

impl<'a> SummaryRow<'a> {
    fn new(symbol: &'a str, s: &SummaryStatistics) -> Self {
        Self {
            symbol,
            bars: s.bars,
            final_equity: s.final_equity,
            weekly_mean: s.weekly_mean,
            weekly_median: s.weekly_median,
            weekly_p05: s.weekly_p05,
            weekly_p95: s.weekly_p95,
            sharpe_daily: s.sharpe_daily,
            hit_rate: s.hit_rate,
        }
    }
}

fn report_err(e: impl std::fmt::Display) -> ConftraderError {
    ConftraderError::Report {
        reason: e.to_string(),
    }
}

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Per-bar rows as a CSV string, header included.
    pub fn render_bars(&self, bars: &[BacktestBar]) -> Result<String, ConftraderError> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        if bars.is_empty() {
            wtr.write_record([
                "timestamp",
                "close",
                "prob_up",
                "confidence",
                "size",
                "ret_bar",
                "realized",
                "pnl",
                "equity",
            ])
            .map_err(report_err)?;
        }
        for bar in bars {
            wtr.serialize(BarRow::from(bar)).map_err(report_err)?;
        }
        let data = wtr.into_inner().map_err(report_err)?;
        String::from_utf8(data).map_err(report_err)
    }

    /// One summary row per symbol as a CSV string, header included.
    pub fn render_summary(
        &self,
        results: &[(String, BacktestResult)],
    ) -> Result<String, ConftraderError> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for (symbol, result) in results {
            wtr.serialize(SummaryRow::new(symbol, &result.summary))
                .map_err(report_err)?;
        }
        let data = wtr.into_inner().map_err(report_err)?;
        String::from_utf8(data).map_err(report_err)
    }

    pub fn write_summary(
        &self,
        results: &[(String, BacktestResult)],
        output_path: &str,
    ) -> Result<(), ConftraderError> {
        let content = self.render_summary(results)?;
        write_file(Path::new(output_path), &content)
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), ConftraderError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ConftraderError::Report {
            reason: format!("failed to create {}: {}", parent.display(), e),
        })?;
    }
    let mut file = fs::File::create(path).map_err(|e| ConftraderError::Report {
        reason: format!("failed to create {}: {}", path.display(), e),
    })?;
    file.write_all(content.as_bytes())
        .map_err(|e| ConftraderError::Report {
            reason: format!("failed to write {}: {}", path.display(), e),
        })
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        symbol: &str,
        output_path: &str,
    ) -> Result<(), ConftraderError> {
        let content = self.render_bars(&result.bars)?;
        write_file(Path::new(output_path), &content)?;
        tracing::debug!(symbol, rows = result.bars.len(), path = output_path, "wrote bar report");
        Ok(())
    }
}
