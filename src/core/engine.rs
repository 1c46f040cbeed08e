use std::time::Instant;

use tracing::debug;

use super::allocation::blended_profile;
use super::random::{SeededRng, UniformSource, sample_normal};
use super::types::{PercentileBands, ProjectionResult, ProjectionSummary, ScenarioParameters};

pub const NUM_SIMULATIONS: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionOptions {
    pub simulations: u32,
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self {
            simulations: NUM_SIMULATIONS,
        }
    }
}

/// Column-per-year store of every path's value, sorted in place when the
/// bands are extracted.
struct YearlyAccumulator {
    values: Vec<Vec<f64>>,
}

impl YearlyAccumulator {
    fn new(horizon_years: u32, expected_samples: usize) -> Self {
        let values = (0..=horizon_years)
            .map(|_| Vec::with_capacity(expected_samples))
            .collect();
        Self { values }
    }

    fn push(&mut self, year_index: usize, value: f64) {
        self.values[year_index].push(value);
    }

    fn into_bands(mut self) -> PercentileBands {
        let year_count = self.values.len();
        let mut bands = PercentileBands {
            years: (0..year_count as u32).collect(),
            p10: Vec::with_capacity(year_count),
            p50: Vec::with_capacity(year_count),
            p90: Vec::with_capacity(year_count),
        };
        for column in &mut self.values {
            column.sort_by(|a, b| a.total_cmp(b));
            bands.p10.push(order_statistic(column, 0.1));
            bands.p50.push(order_statistic(column, 0.5));
            bands.p90.push(order_statistic(column, 0.9));
        }
        bands
    }
}

pub fn run_forward_projection<S: UniformSource + ?Sized>(
    params: &ScenarioParameters,
    options: ProjectionOptions,
    source: &mut S,
) -> ProjectionResult {
    let started = Instant::now();
    let profile = blended_profile(params.equity_fraction());
    let simulations = options.simulations.max(1);
    let annual_contribution = params.annual_contribution();

    let mut acc = YearlyAccumulator::new(params.horizon_years, simulations as usize);
    for _ in 0..simulations {
        let mut value = params.initial_investment;
        acc.push(0, value);
        for year in 1..=params.horizon_years {
            let yearly_return = sample_normal(
                source,
                profile.mean_annual_return,
                profile.annual_volatility,
            );
            value = compound_year(value, yearly_return, annual_contribution);
            acc.push(year as usize, value);
        }
    }

    let trajectory = acc.into_bands();
    let final_value = trajectory
        .p50
        .last()
        .copied()
        .unwrap_or(params.initial_investment);
    let total_investment =
        params.initial_investment + annual_contribution * params.horizon_years as f64;

    debug!(
        initial = params.initial_investment,
        monthly = params.monthly_contribution,
        equity = params.equity_percentage,
        horizon = params.horizon_years,
        simulations,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "forward projection finished"
    );

    ProjectionResult {
        trajectory,
        summary: ProjectionSummary {
            total_investment,
            final_value,
            total_return: final_value - total_investment,
            yield_percent: profile.mean_annual_return * 100.0,
        },
    }
}

pub fn run_forward_projection_seeded(
    params: &ScenarioParameters,
    options: ProjectionOptions,
    seed: u64,
) -> ProjectionResult {
    let mut rng = SeededRng::new(seed);
    run_forward_projection(params, options, &mut rng)
}

/// One year of growth followed by the year's contributions, floored at zero.
pub(crate) fn compound_year(value: f64, yearly_return: f64, annual_contribution: f64) -> f64 {
    (value * (1.0 + yearly_return) + annual_contribution).max(0.0)
}

/// Rank `floor(n * p)` of an ascending slice, without interpolation.
fn order_statistic(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (sorted.len() as f64 * p).floor() as usize;
    sorted[rank.min(sorted.len() - 1)]
}
