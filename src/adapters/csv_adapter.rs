//! CSV file data adapter: one `<dir>/<SYMBOL>.csv` per symbol.
//!
//! Columns are matched by header name (case-insensitive). A `timestamp` or
//! `date` column and the designated price column are required; missing
//! open/high/low default to that price and missing volume to 0.

use crate::domain::error::ConftraderError;
use crate::domain::ohlcv::{PriceBar, PriceField};
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct CsvAdapter {
    base_path: PathBuf,
}

/// Header positions of the recognised columns.
struct Columns {
    timestamp: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    close: Option<usize>,
    volume: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, ConftraderError> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        };

        let timestamp = find(&["timestamp", "date", "datetime"]).ok_or_else(|| {
            ConftraderError::Data {
                reason: "missing timestamp column".into(),
            }
        })?;

        Ok(Self {
            timestamp,
            open: find(&["open"]),
            high: find(&["high"]),
            low: find(&["low"]),
            close: find(&["close"]),
            volume: find(&["volume"]),
        })
    }

    fn price(&self, field: PriceField) -> Option<usize> {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
        }
    }
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_value(
    record: &csv::StringRecord,
    column: usize,
    name: &str,
    row: usize,
) -> Result<f64, ConftraderError> {
    let raw = record.get(column).ok_or_else(|| ConftraderError::MalformedBar {
        index: row,
        reason: format!("missing {} value", name),
    })?;
    raw.trim()
        .parse()
        .map_err(|e| ConftraderError::MalformedBar {
            index: row,
            reason: format!("invalid {} value '{}': {}", name, raw, e),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(&self, symbol: &str, price: PriceField) -> Result<Vec<PriceBar>, ConftraderError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| ConftraderError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| ConftraderError::Data {
            reason: format!("CSV header error in {}: {}", path.display(), e),
        })?;
        let columns = Columns::from_headers(headers)?;
        let price_col = columns.price(price).ok_or_else(|| ConftraderError::Data {
            reason: format!("{} has no '{}' column", path.display(), price),
        })?;

        let mut bars = Vec::new();
        for (row, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| ConftraderError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let raw_ts = record.get(columns.timestamp).unwrap_or_default();
            let timestamp = parse_timestamp(raw_ts).ok_or_else(|| ConftraderError::MalformedBar {
                index: row,
                reason: format!("invalid timestamp '{}'", raw_ts),
            })?;

            let base = parse_value(&record, price_col, &price.to_string(), row)?;
            let optional = |column: Option<usize>, name: &str, default: f64| match column {
                Some(c) => parse_value(&record, c, name, row),
                None => Ok(default),
            };

            bars.push(PriceBar {
                timestamp,
                open: optional(columns.open, "open", base)?,
                high: optional(columns.high, "high", base)?,
                low: optional(columns.low, "low", base)?,
                close: optional(columns.close, "close", base)?,
                volume: optional(columns.volume, "volume", 0.0)?,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        tracing::debug!(symbol, bars = bars.len(), path = %path.display(), "loaded price history");
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, ConftraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| ConftraderError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ConftraderError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, ConftraderError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| ConftraderError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| ConftraderError::Data {
            reason: format!("CSV header error in {}: {}", path.display(), e),
        })?;
        let columns = Columns::from_headers(headers)?;

        let mut range: Option<(NaiveDateTime, NaiveDateTime, usize)> = None;
        for (row, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| ConftraderError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;
            let raw_ts = record.get(columns.timestamp).unwrap_or_default();
            let ts = parse_timestamp(raw_ts).ok_or_else(|| ConftraderError::MalformedBar {
                index: row,
                reason: format!("invalid timestamp '{}'", raw_ts),
            })?;
            range = Some(match range {
                None => (ts, ts, 1),
                Some((first, last, n)) => (first.min(ts), last.max(ts), n + 1),
            });
        }
        Ok(range)
    }
}
