use tracing::warn;

use super::engine::compound_year;
use super::history::HistoricalDataset;
use super::types::{BacktestSummary, ScenarioParameters, Trajectory, YearValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearWindow {
    pub start: i32,
    pub end: i32,
}

impl YearWindow {
    /// Clamps a requested window into the dataset's history. An inverted
    /// request collapses to its (clamped) start year.
    pub fn clamped(dataset: &HistoricalDataset, start_year: i32, end_year: i32) -> Self {
        let first = dataset.first_year();
        let last = dataset.last_year();
        let start = start_year.clamp(first, last);
        let end = end_year.clamp(start, last);
        Self { start, end }
    }

    pub fn point_count(&self) -> usize {
        self.end.abs_diff(self.start) as usize + 1
    }
}

/// Replays recorded returns over `[start_year, end_year]`. The first point is
/// the start year at the initial value; every later year applies its blended
/// return and then the year's contributions.
pub fn run_historical_backtest(
    dataset: &HistoricalDataset,
    params: &ScenarioParameters,
    start_year: i32,
    end_year: i32,
) -> Trajectory {
    let window = YearWindow::clamped(dataset, start_year, end_year);
    if window.start != start_year || window.end != end_year {
        warn!(
            requested_start = start_year,
            requested_end = end_year,
            start = window.start,
            end = window.end,
            "backtest window clamped to available history"
        );
    }
    replay(dataset, params, window)
}

pub(crate) fn replay(
    dataset: &HistoricalDataset,
    params: &ScenarioParameters,
    window: YearWindow,
) -> Trajectory {
    let equity_fraction = params.equity_fraction();
    let annual_contribution = params.annual_contribution();

    let mut trajectory = Vec::with_capacity(window.point_count());
    let mut value = params.initial_investment;
    trajectory.push(YearValue {
        year: window.start,
        value,
    });
    for year in (window.start..=window.end).skip(1) {
        let yearly_return = dataset
            .get(year)
            .map(|row| row.blended(equity_fraction))
            .unwrap_or(0.0);
        value = compound_year(value, yearly_return, annual_contribution);
        trajectory.push(YearValue { year, value });
    }
    trajectory
}

pub fn summarize_backtest(trajectory: &[YearValue], params: &ScenarioParameters) -> BacktestSummary {
    let final_value = trajectory
        .last()
        .map(|point| point.value)
        .unwrap_or(params.initial_investment);
    let years = trajectory.len().saturating_sub(1) as f64;
    let total_invested = params.initial_investment + params.annual_contribution() * years;
    let total_gain = final_value - total_invested;
    let total_return_percent = if total_invested > 0.0 {
        total_gain / total_invested * 100.0
    } else {
        0.0
    };

    BacktestSummary {
        final_value,
        total_invested,
        total_gain,
        total_return_percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::history::AnnualReturn;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    fn toy_dataset() -> HistoricalDataset {
        HistoricalDataset::from_series(
            "toy".to_string(),
            vec![
                AnnualReturn { year: 2000, equity: 0.10, bonds: 0.02 },
                AnnualReturn { year: 2001, equity: -0.20, bonds: 0.04 },
                AnnualReturn { year: 2002, equity: 0.30, bonds: 0.00 },
                AnnualReturn { year: 2003, equity: 0.05, bonds: 0.01 },
            ],
        )
        .expect("toy dataset")
    }

    #[test]
    fn replay_matches_hand_calculation() {
        let dataset = toy_dataset();
        let params = ScenarioParameters::new(1_000.0, 10.0, 100.0, 0);
        let path = run_historical_backtest(&dataset, &params, 2000, 2002);

        assert_eq!(path.len(), 3);
        assert_eq!(path[0], YearValue { year: 2000, value: 1_000.0 });
        let y2001 = 1_000.0 * 0.8 + 120.0;
        let y2002 = y2001 * 1.3 + 120.0;
        assert_eq!(path[1].year, 2001);
        assert!((path[1].value - y2001).abs() < 1e-9);
        assert_eq!(path[2].year, 2002);
        assert!((path[2].value - y2002).abs() < 1e-9);
    }

    #[test]
    fn equity_share_blends_the_two_series() {
        let dataset = toy_dataset();
        let params = ScenarioParameters::new(1_000.0, 0.0, 50.0, 0);
        let path = run_historical_backtest(&dataset, &params, 2000, 2001);
        assert!((path[1].value - 1_000.0 * (1.0 - 0.08)).abs() < 1e-9);
    }

    #[test]
    fn window_before_history_is_clamped_to_first_year() {
        let dataset = toy_dataset();
        let params = ScenarioParameters::new(500.0, 0.0, 0.0, 0);
        let path = run_historical_backtest(&dataset, &params, 1990, 2001);
        assert_eq!(path.len(), 2);
        assert_eq!(path[0].year, 2000);
        assert_eq!(path[0].value, 500.0);
    }

    #[test]
    fn window_after_history_is_clamped_to_last_year() {
        let dataset = toy_dataset();
        let params = ScenarioParameters::new(500.0, 0.0, 0.0, 0);
        let path = run_historical_backtest(&dataset, &params, 2002, 2050);
        assert_eq!(path.iter().map(|p| p.year).collect::<Vec<_>>(), vec![2002, 2003]);
    }

    #[test]
    fn inverted_window_is_a_single_point() {
        let dataset = toy_dataset();
        let params = ScenarioParameters::new(750.0, 100.0, 50.0, 0);
        let path = run_historical_backtest(&dataset, &params, 2003, 2001);
        assert_eq!(path, vec![YearValue { year: 2003, value: 750.0 }]);
    }

    #[test]
    fn window_inside_history_has_inclusive_length() {
        let dataset = HistoricalDataset::embedded().expect("embedded dataset");
        let params = ScenarioParameters::default();
        let path = run_historical_backtest(&dataset, &params, 2005, 2025);
        assert_eq!(path.len(), 21);
        assert_eq!(path[0].value, 500_000.0);
        assert_eq!(path.last().map(|p| p.year), Some(2025));
    }

    #[test]
    fn single_year_dataset_at_the_integer_limit() {
        let dataset = HistoricalDataset::from_series(
            "edge".to_string(),
            vec![AnnualReturn { year: i32::MAX, equity: 0.1, bonds: 0.0 }],
        )
        .expect("single row");
        let params = ScenarioParameters::new(100.0, 0.0, 100.0, 0);
        let path = run_historical_backtest(&dataset, &params, i32::MIN, i32::MAX);
        assert_eq!(path, vec![YearValue { year: i32::MAX, value: 100.0 }]);
        assert_eq!(YearWindow::clamped(&dataset, 0, i32::MAX).point_count(), 1);
    }

    #[test]
    fn backtest_is_deterministic() {
        let dataset = HistoricalDataset::embedded().expect("embedded dataset");
        let params = ScenarioParameters::new(10_000.0, 300.0, 60.0, 0);
        assert_eq!(
            run_historical_backtest(&dataset, &params, 1980, 2020),
            run_historical_backtest(&dataset, &params, 1980, 2020)
        );
    }

    #[test]
    fn summary_reports_gain_and_percent() {
        let path = vec![
            YearValue { year: 2000, value: 1_000.0 },
            YearValue { year: 2001, value: 1_200.0 },
            YearValue { year: 2002, value: 1_500.0 },
        ];
        let params = ScenarioParameters::new(1_000.0, 10.0, 50.0, 2);
        let summary = summarize_backtest(&path, &params);
        assert_eq!(summary.final_value, 1_500.0);
        assert_eq!(summary.total_invested, 1_240.0);
        assert_eq!(summary.total_gain, 260.0);
        assert!((summary.total_return_percent - 260.0 / 1_240.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn summary_with_nothing_invested_has_zero_percent() {
        let params = ScenarioParameters::new(0.0, 0.0, 50.0, 0);
        let path = vec![YearValue { year: 2000, value: 0.0 }];
        let summary = summarize_backtest(&path, &params);
        assert_eq!(summary.total_return_percent, 0.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_backtest_values_are_non_negative(
            initial in 0u32..5_000_000,
            monthly in 0u32..10_000,
            equity in 0u32..=100,
            start in 1950i32..2040,
            span in 0i32..60
        ) {
            let dataset = HistoricalDataset::embedded().expect("embedded dataset");
            let params = ScenarioParameters::new(initial as f64, monthly as f64, equity as f64, 0);
            let path = run_historical_backtest(&dataset, &params, start, start + span);
            let window = YearWindow::clamped(&dataset, start, start + span);
            prop_assert_eq!(path.len(), window.point_count());
            prop_assert_eq!(path[0].value, initial as f64);
            for pair in path.windows(2) {
                prop_assert_eq!(pair[1].year, pair[0].year + 1);
            }
            for point in &path {
                prop_assert!(point.value >= 0.0);
            }
        }
    }
}
