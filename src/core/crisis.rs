use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use super::error::DatasetError;
use super::types::CrisisEvent;

const EMBEDDED_CRISES: &str = include_str!("../../data/crises.json");
const SUPPORTED_VERSION: u32 = 1;

#[derive(Debug, Deserialize)]
struct CrisisDocument {
    version: u32,
    events: Vec<CrisisEvent>,
}

/// Read-only table of named market crises, ordered by year.
#[derive(Debug, Clone)]
pub struct CrisisCatalog {
    events: Vec<CrisisEvent>,
}

impl CrisisCatalog {
    pub fn embedded() -> Result<Self, DatasetError> {
        Self::from_json(EMBEDDED_CRISES)
    }

    pub fn from_path(path: &Path) -> Result<Self, DatasetError> {
        let raw = fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, DatasetError> {
        let doc: CrisisDocument =
            serde_json::from_str(raw).map_err(|source| DatasetError::Parse {
                what: "crisis catalog",
                source,
            })?;
        if doc.version != SUPPORTED_VERSION {
            return Err(DatasetError::UnsupportedVersion {
                what: "crisis catalog",
                found: doc.version,
                expected: SUPPORTED_VERSION,
            });
        }
        Self::from_events(doc.events)
    }

    pub fn from_events(mut events: Vec<CrisisEvent>) -> Result<Self, DatasetError> {
        let mut seen = HashSet::new();
        for event in &events {
            if !seen.insert(event.id.as_str()) {
                return Err(DatasetError::DuplicateCrisisId(event.id.clone()));
            }
        }
        // Stable, so same-year events keep their file order.
        events.sort_by_key(|event| event.year);
        info!(events = events.len(), "crisis catalog loaded");
        Ok(Self { events })
    }

    /// First recorded crisis for `year`.
    pub fn lookup(&self, year: i32) -> Option<&CrisisEvent> {
        self.events.iter().find(|event| event.year == year)
    }

    pub fn crisis_name(&self, year: i32) -> Option<&str> {
        self.lookup(year).map(|event| event.name.as_str())
    }

    /// Events inside `[start_year, end_year]`, for annotating a chart window.
    pub fn between(&self, start_year: i32, end_year: i32) -> impl Iterator<Item = &CrisisEvent> {
        self.events
            .iter()
            .filter(move |event| event.year >= start_year && event.year <= end_year)
    }

    pub fn events(&self) -> &[CrisisEvent] {
        &self.events
    }
}
