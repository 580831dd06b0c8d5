//! Report generation port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::ConftraderError;

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(
        &self,
        result: &BacktestResult,
        symbol: &str,
        output_path: &str,
    ) -> Result<(), ConftraderError>;

    /// Default implementation: one `write` per symbol into `<output_dir>/<SYMBOL>.csv`.
    fn write_many(
        &self,
        results: &[(String, BacktestResult)],
        output_dir: &str,
    ) -> Result<(), ConftraderError> {
        for (symbol, result) in results {
            let path = std::path::Path::new(output_dir).join(format!("{symbol}.csv"));
            self.write(result, symbol, &path.to_string_lossy())?;
        }
        Ok(())
    }
}
