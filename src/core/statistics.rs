use super::backtest::{YearWindow, replay};
use super::crisis::CrisisCatalog;
use super::history::HistoricalDataset;
use super::types::{ScenarioParameters, ScenarioStatistics, StatisticsAnnotation, YearValue};

/// Statistics are computed on a contribution-free path so that deposits never
/// show up as returns.
const UNIT_INVESTMENT: f64 = 10_000.0;

/// Risk/return figures for the `horizon_years` ending at the dataset's last
/// recorded year.
pub fn compute_scenario_statistics(
    dataset: &HistoricalDataset,
    equity_percentage: f64,
    horizon_years: i64,
) -> ScenarioStatistics {
    let params = ScenarioParameters::new(UNIT_INVESTMENT, 0.0, equity_percentage, horizon_years);
    let reference_year = dataset.last_year();
    let start_year = reference_year
        .saturating_sub(i32::try_from(params.horizon_years).unwrap_or(i32::MAX));
    let window = YearWindow::clamped(dataset, start_year, reference_year);
    let trajectory = replay(dataset, &params, window);
    statistics_from_trajectory(&trajectory, reference_year)
}

/// Extremes break ties toward the earliest year.
pub fn statistics_from_trajectory(
    trajectory: &[YearValue],
    fallback_year: i32,
) -> ScenarioStatistics {
    let changes: Vec<(i32, f64)> = trajectory
        .windows(2)
        .map(|pair| (pair[1].year, yearly_change(pair[0].value, pair[1].value)))
        .collect();

    if changes.is_empty() {
        return ScenarioStatistics {
            average_return: 0.0,
            max_drawdown: 0.0,
            max_drawdown_year: fallback_year,
            max_gain: 0.0,
            max_gain_year: fallback_year,
        };
    }

    let growth = changes
        .iter()
        .fold(1.0_f64, |acc, (_, change)| acc * (1.0 + change));
    let average_return = (growth.max(0.0).powf(1.0 / changes.len() as f64) - 1.0) * 100.0;

    let mut worst = changes[0];
    let mut best = changes[0];
    for &(year, change) in &changes[1..] {
        if change < worst.1 {
            worst = (year, change);
        }
        if change > best.1 {
            best = (year, change);
        }
    }

    ScenarioStatistics {
        average_return,
        max_drawdown: (-worst.1).max(0.0) * 100.0,
        max_drawdown_year: worst.0,
        max_gain: best.1.max(0.0) * 100.0,
        max_gain_year: best.0,
    }
}

fn yearly_change(previous: f64, current: f64) -> f64 {
    if previous > 0.0 {
        current / previous - 1.0
    } else {
        0.0
    }
}

/// Names the crisis in the drawdown year, and the crisis in the year before
/// the best year (the rebound it recovered from).
pub fn annotate_statistics(
    statistics: &ScenarioStatistics,
    catalog: &CrisisCatalog,
) -> StatisticsAnnotation {
    StatisticsAnnotation {
        drawdown_event: catalog
            .crisis_name(statistics.max_drawdown_year)
            .map(str::to_string),
        gain_recovery_from: statistics
            .max_gain_year
            .checked_sub(1)
            .and_then(|year| catalog.crisis_name(year))
            .map(str::to_string),
    }
}
