//! Data access port trait.

use crate::domain::error::ConftraderError;
use crate::domain::ohlcv::{PriceBar, PriceField};
use chrono::NaiveDateTime;

/// Supplies a price history per symbol.
pub trait DataPort {
    /// Bars for `symbol` in ascending time order. `price` names the column
    /// that must be present in the source.
    fn fetch_ohlcv(&self, symbol: &str, price: PriceField) -> Result<Vec<PriceBar>, ConftraderError>;

    fn list_symbols(&self) -> Result<Vec<String>, ConftraderError>;

    /// First timestamp, last timestamp and bar count, or `None` when the
    /// symbol has no bars.
    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, ConftraderError>;
}
