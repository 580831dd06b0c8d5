//! Domain error types.

use chrono::NaiveDateTime;

/// Top-level error type for conftrader.
///
/// Empty or too-short price histories are not errors: the backtest returns an
/// empty result with all-zero statistics instead.
#[derive(Debug, thiserror::Error)]
pub enum ConftraderError {
    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("malformed bar at index {index}: {reason}")]
    MalformedBar { index: usize, reason: String },

    #[error("duplicate timestamp {timestamp}")]
    DuplicateTimestamp { timestamp: NaiveDateTime },

    #[error("invalid strategy parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&ConftraderError> for std::process::ExitCode {
    fn from(err: &ConftraderError) -> Self {
        let code: u8 = match err {
            ConftraderError::Io(_) => 1,
            ConftraderError::ConfigParse { .. }
            | ConftraderError::ConfigMissing { .. }
            | ConftraderError::ConfigInvalid { .. } => 2,
            ConftraderError::InvalidParameter { .. } => 3,
            ConftraderError::Data { .. }
            | ConftraderError::MalformedBar { .. }
            | ConftraderError::DuplicateTimestamp { .. } => 5,
            ConftraderError::Report { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
