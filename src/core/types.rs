use serde::{Deserialize, Serialize};

/// Longest horizon a scenario may ask for; longer requests are clamped.
pub const MAX_HORIZON_YEARS: u32 = 100;

/// Caller-supplied scenario. Every constructor path goes through
/// [`ScenarioParameters::new`], so the fields are always clamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioParameters {
    pub initial_investment: f64,
    pub monthly_contribution: f64,
    pub equity_percentage: f64,
    pub horizon_years: u32,
}

impl ScenarioParameters {
    pub fn new(
        initial_investment: f64,
        monthly_contribution: f64,
        equity_percentage: f64,
        horizon_years: i64,
    ) -> Self {
        Self {
            initial_investment: non_negative_amount(initial_investment),
            monthly_contribution: non_negative_amount(monthly_contribution),
            equity_percentage: clamp_percentage(equity_percentage),
            horizon_years: horizon_years.clamp(0, i64::from(MAX_HORIZON_YEARS)) as u32,
        }
    }

    pub fn annual_contribution(&self) -> f64 {
        self.monthly_contribution * 12.0
    }

    pub fn equity_fraction(&self) -> f64 {
        self.equity_percentage / 100.0
    }
}

impl Default for ScenarioParameters {
    fn default() -> Self {
        Self::new(500_000.0, 1_000.0, 50.0, 20)
    }
}

pub(crate) fn non_negative_amount(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

pub(crate) fn clamp_percentage(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnProfile {
    pub mean_annual_return: f64,
    pub annual_volatility: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearValue {
    pub year: i32,
    pub value: f64,
}

pub type Trajectory = Vec<YearValue>;

/// Cautious, realistic and optimistic paths over a shared year axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PercentileBands {
    pub years: Vec<u32>,
    pub p10: Vec<f64>,
    pub p50: Vec<f64>,
    pub p90: Vec<f64>,
}

impl PercentileBands {
    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSummary {
    pub total_investment: f64,
    pub final_value: f64,
    pub total_return: f64,
    pub yield_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub trajectory: PercentileBands,
    pub summary: ProjectionSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestSummary {
    pub final_value: f64,
    pub total_invested: f64,
    pub total_gain: f64,
    pub total_return_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioStatistics {
    pub average_return: f64,
    pub max_drawdown: f64,
    pub max_drawdown_year: i32,
    pub max_gain: f64,
    pub max_gain_year: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsAnnotation {
    pub drawdown_event: Option<String>,
    pub gain_recovery_from: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrisisEvent {
    pub id: String,
    pub year: i32,
    pub name: String,
    pub color: String,
    pub description: String,
    pub impact: Vec<String>,
    pub recovery: Vec<String>,
    pub recovery_time: String,
    pub dos: Vec<String>,
    pub donts: Vec<String>,
}
