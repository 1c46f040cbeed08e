mod allocation;
mod backtest;
mod crisis;
mod engine;
mod error;
mod history;
mod random;
mod statistics;
mod types;

use std::path::PathBuf;

pub use allocation::{BOND_PROFILE, EQUITY_PROFILE, blended_profile};
pub use backtest::{YearWindow, run_historical_backtest, summarize_backtest};
pub use crisis::CrisisCatalog;
pub use engine::{
    NUM_SIMULATIONS, ProjectionOptions, run_forward_projection, run_forward_projection_seeded,
};
pub use error::{DatasetError, InitError};
pub use history::{AnnualReturn, HistoricalDataset};
pub use random::{SeededRng, UniformSource, sample_normal};
pub use statistics::{annotate_statistics, compute_scenario_statistics, statistics_from_trajectory};
pub use types::{
    BacktestSummary, CrisisEvent, MAX_HORIZON_YEARS, PercentileBands, ProjectionResult,
    ProjectionSummary, ReturnProfile, ScenarioParameters, ScenarioStatistics,
    StatisticsAnnotation, Trajectory, YearValue,
};

/// Where to read the reference datasets from; `None` uses the bundled copy.
#[derive(Debug, Clone, Default)]
pub struct CoreConfig {
    pub history_path: Option<PathBuf>,
    pub crises_path: Option<PathBuf>,
}

/// Reference data loaded once at startup and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct ProjectionCore {
    history: HistoricalDataset,
    crises: CrisisCatalog,
}

impl ProjectionCore {
    pub fn load(config: &CoreConfig) -> Result<Self, InitError> {
        let history = match &config.history_path {
            Some(path) => HistoricalDataset::from_path(path),
            None => HistoricalDataset::embedded(),
        }
        .map_err(InitError::History)?;
        let crises = match &config.crises_path {
            Some(path) => CrisisCatalog::from_path(path),
            None => CrisisCatalog::embedded(),
        }
        .map_err(InitError::Crises)?;
        Ok(Self::new(history, crises))
    }

    pub fn embedded() -> Result<Self, InitError> {
        Self::load(&CoreConfig::default())
    }

    pub fn new(history: HistoricalDataset, crises: CrisisCatalog) -> Self {
        Self { history, crises }
    }

    pub fn history(&self) -> &HistoricalDataset {
        &self.history
    }

    pub fn crises(&self) -> &CrisisCatalog {
        &self.crises
    }

    pub fn run_historical_backtest(
        &self,
        params: &ScenarioParameters,
        start_year: i32,
        end_year: i32,
    ) -> Trajectory {
        run_historical_backtest(&self.history, params, start_year, end_year)
    }

    pub fn compute_scenario_statistics(
        &self,
        equity_percentage: f64,
        horizon_years: i64,
    ) -> ScenarioStatistics {
        compute_scenario_statistics(&self.history, equity_percentage, horizon_years)
    }

    pub fn lookup_crisis(&self, year: i32) -> Option<&CrisisEvent> {
        self.crises.lookup(year)
    }
}
