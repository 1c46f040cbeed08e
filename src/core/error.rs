use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed {what} JSON: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("unsupported {what} version {found}, expected {expected}")]
    UnsupportedVersion {
        what: &'static str,
        found: u32,
        expected: u32,
    },
    #[error("historical return series is empty")]
    EmptySeries,
    #[error("historical years must be contiguous: {previous} is followed by {next}")]
    NonContiguousYears { previous: i32, next: i32 },
    #[error("invalid {asset} return {value} for {year}")]
    InvalidReturn {
        year: i32,
        asset: &'static str,
        value: f64,
    },
    #[error("duplicate crisis id {0:?}")]
    DuplicateCrisisId(String),
}

/// Raised once at startup; per-call operations never fail.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("historical dataset unavailable: {0}")]
    History(#[source] DatasetError),
    #[error("crisis catalog unavailable: {0}")]
    Crises(#[source] DatasetError),
}
