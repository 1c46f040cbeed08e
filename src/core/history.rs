use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use super::allocation::blend;
use super::error::DatasetError;

const EMBEDDED_HISTORY: &str = include_str!("../../data/market_history.json");
const SUPPORTED_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AnnualReturn {
    pub year: i32,
    pub equity: f64,
    pub bonds: f64,
}

impl AnnualReturn {
    pub fn blended(&self, equity_fraction: f64) -> f64 {
        blend(self.bonds, self.equity, equity_fraction)
    }
}

#[derive(Debug, Deserialize)]
struct HistoryDocument {
    version: u32,
    #[serde(default)]
    source: String,
    series: Vec<AnnualReturn>,
}

/// Recorded yearly returns, contiguous and ascending by year.
#[derive(Debug, Clone)]
pub struct HistoricalDataset {
    source: String,
    series: Vec<AnnualReturn>,
}

impl HistoricalDataset {
    pub fn embedded() -> Result<Self, DatasetError> {
        Self::from_json(EMBEDDED_HISTORY)
    }

    pub fn from_path(path: &Path) -> Result<Self, DatasetError> {
        let raw = fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, DatasetError> {
        let doc: HistoryDocument =
            serde_json::from_str(raw).map_err(|source| DatasetError::Parse {
                what: "historical dataset",
                source,
            })?;
        if doc.version != SUPPORTED_VERSION {
            return Err(DatasetError::UnsupportedVersion {
                what: "historical dataset",
                found: doc.version,
                expected: SUPPORTED_VERSION,
            });
        }
        Self::from_series(doc.source, doc.series)
    }

    pub fn from_series(source: String, series: Vec<AnnualReturn>) -> Result<Self, DatasetError> {
        if series.is_empty() {
            return Err(DatasetError::EmptySeries);
        }
        for pair in series.windows(2) {
            if pair[0].year.checked_add(1) != Some(pair[1].year) {
                return Err(DatasetError::NonContiguousYears {
                    previous: pair[0].year,
                    next: pair[1].year,
                });
            }
        }
        for row in &series {
            validate_return(row.year, "equity", row.equity)?;
            validate_return(row.year, "bonds", row.bonds)?;
        }

        let dataset = Self { source, series };
        info!(
            first_year = dataset.first_year(),
            last_year = dataset.last_year(),
            "historical dataset loaded"
        );
        Ok(dataset)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn first_year(&self) -> i32 {
        self.series[0].year
    }

    pub fn last_year(&self) -> i32 {
        self.series[self.series.len() - 1].year
    }

    pub fn get(&self, year: i32) -> Option<&AnnualReturn> {
        let offset = usize::try_from(year.checked_sub(self.first_year())?).ok()?;
        self.series.get(offset)
    }

    pub fn series(&self) -> &[AnnualReturn] {
        &self.series
    }
}

fn validate_return(year: i32, asset: &'static str, value: f64) -> Result<(), DatasetError> {
    if value.is_finite() && value >= -1.0 {
        Ok(())
    } else {
        Err(DatasetError::InvalidReturn { year, asset, value })
    }
}
