use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{
        Json, Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::core::{
    BacktestSummary, CrisisEvent, ProjectionCore, ProjectionOptions, ProjectionResult,
    ScenarioParameters, ScenarioStatistics, SeededRng, StatisticsAnnotation, YearValue,
    annotate_statistics, run_forward_projection, summarize_backtest,
};

const DEFAULT_INITIAL_INVESTMENT: f64 = 500_000.0;
const DEFAULT_MONTHLY_CONTRIBUTION: f64 = 1_000.0;
const DEFAULT_EQUITY_PERCENTAGE: f64 = 50.0;
const DEFAULT_HORIZON_YEARS: i64 = 20;
const MAX_SIMULATIONS: u32 = 100_000;

#[derive(Clone)]
pub struct AppState {
    core: Arc<ProjectionCore>,
    simulations: u32,
}

impl AppState {
    pub fn new(core: ProjectionCore, simulations: u32) -> Self {
        Self {
            core: Arc::new(core),
            simulations: simulations.clamp(1, MAX_SIMULATIONS),
        }
    }
}

fn scenario_parameters(
    initial_investment: Option<f64>,
    monthly_contribution: Option<f64>,
    equity_percentage: Option<f64>,
    horizon_years: Option<i64>,
) -> ScenarioParameters {
    ScenarioParameters::new(
        initial_investment.unwrap_or(DEFAULT_INITIAL_INVESTMENT),
        monthly_contribution.unwrap_or(DEFAULT_MONTHLY_CONTRIBUTION),
        equity_percentage.unwrap_or(DEFAULT_EQUITY_PERCENTAGE),
        horizon_years.unwrap_or(DEFAULT_HORIZON_YEARS),
    )
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectionPayload {
    initial_investment: Option<f64>,
    monthly_contribution: Option<f64>,
    equity_percentage: Option<f64>,
    horizon_years: Option<i64>,
    seed: Option<u64>,
    simulations: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct BacktestPayload {
    initial_investment: Option<f64>,
    monthly_contribution: Option<f64>,
    equity_percentage: Option<f64>,
    horizon_years: Option<i64>,
    start_year: Option<i32>,
    end_year: Option<i32>,
}

impl BacktestPayload {
    fn parameters(&self) -> ScenarioParameters {
        scenario_parameters(
            self.initial_investment,
            self.monthly_contribution,
            self.equity_percentage,
            self.horizon_years,
        )
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StatisticsPayload {
    equity_percentage: Option<f64>,
    horizon_years: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CrisisRangeQuery {
    from: Option<i32>,
    to: Option<i32>,
}

#[derive(Debug)]
struct ProjectionRequest {
    params: ScenarioParameters,
    options: ProjectionOptions,
    seed: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CrisisMarker {
    id: String,
    year: i32,
    name: String,
}

impl From<&CrisisEvent> for CrisisMarker {
    fn from(event: &CrisisEvent) -> Self {
        Self {
            id: event.id.clone(),
            year: event.year,
            name: event.name.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectionResponse {
    seed: u64,
    simulations: u32,
    #[serde(flatten)]
    result: ProjectionResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BacktestResponse {
    start_year: i32,
    end_year: i32,
    trajectory: Vec<YearValue>,
    summary: BacktestSummary,
    crises: Vec<CrisisMarker>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatisticsResponse {
    horizon_years: u32,
    equity_percentage: f64,
    reference_year: i32,
    statistics: ScenarioStatistics,
    annotation: StatisticsAnnotation,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/projection",
            get(projection_get_handler).post(projection_post_handler),
        )
        .route(
            "/api/backtest",
            get(backtest_get_handler).post(backtest_post_handler),
        )
        .route("/api/statistics", get(statistics_handler))
        .route("/api/crises", get(crises_handler))
        .route("/api/crises/:year", get(crisis_by_year_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(port: u16, state: AppState) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "projection HTTP API listening");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn projection_get_handler(
    State(state): State<AppState>,
    payload: Result<Query<ProjectionPayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => projection_handler_impl(state, payload).await,
        Err(rejection) => error_response(StatusCode::BAD_REQUEST, &rejection.body_text()),
    }
}

async fn projection_post_handler(
    State(state): State<AppState>,
    payload: Result<Json<ProjectionPayload>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(payload)) => projection_handler_impl(state, payload).await,
        Err(rejection) => error_response(StatusCode::BAD_REQUEST, &rejection.body_text()),
    }
}

async fn projection_handler_impl(state: AppState, payload: ProjectionPayload) -> Response {
    let request = projection_request_from_payload(payload, state.simulations);
    let seed = request.seed.unwrap_or_else(rand::random::<u64>);
    let simulations = request.options.simulations;

    // Ten thousand paths over forty years is too long for the async executor.
    let joined = tokio::task::spawn_blocking(move || {
        let mut rng = SeededRng::new(seed);
        run_forward_projection(&request.params, request.options, &mut rng)
    })
    .await;

    match joined {
        Ok(result) => json_response(
            StatusCode::OK,
            ProjectionResponse {
                seed,
                simulations,
                result,
            },
        ),
        Err(e) => {
            error!(error = %e, "forward projection task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Projection failed")
        }
    }
}

fn projection_request_from_payload(
    payload: ProjectionPayload,
    default_simulations: u32,
) -> ProjectionRequest {
    ProjectionRequest {
        params: scenario_parameters(
            payload.initial_investment,
            payload.monthly_contribution,
            payload.equity_percentage,
            payload.horizon_years,
        ),
        options: ProjectionOptions {
            simulations: payload
                .simulations
                .unwrap_or(default_simulations)
                .clamp(1, MAX_SIMULATIONS),
        },
        seed: payload.seed,
    }
}

async fn backtest_get_handler(
    State(state): State<AppState>,
    payload: Result<Query<BacktestPayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => {
            json_response(StatusCode::OK, build_backtest_response(&state.core, &payload))
        }
        Err(rejection) => error_response(StatusCode::BAD_REQUEST, &rejection.body_text()),
    }
}

async fn backtest_post_handler(
    State(state): State<AppState>,
    payload: Result<Json<BacktestPayload>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(payload)) => {
            json_response(StatusCode::OK, build_backtest_response(&state.core, &payload))
        }
        Err(rejection) => error_response(StatusCode::BAD_REQUEST, &rejection.body_text()),
    }
}

/// Without explicit years the window is the horizon ending at the last
/// recorded year.
fn build_backtest_response(core: &ProjectionCore, payload: &BacktestPayload) -> BacktestResponse {
    let params = payload.parameters();
    let end_year = payload.end_year.unwrap_or(core.history().last_year());
    let start_year = payload.start_year.unwrap_or_else(|| {
        end_year.saturating_sub(i32::try_from(params.horizon_years).unwrap_or(i32::MAX))
    });

    let trajectory = core.run_historical_backtest(&params, start_year, end_year);
    let summary = summarize_backtest(&trajectory, &params);
    let first = trajectory.first().map_or(start_year, |p| p.year);
    let last = trajectory.last().map_or(end_year, |p| p.year);
    let crises = core.crises().between(first, last).map(CrisisMarker::from).collect();

    BacktestResponse {
        start_year: first,
        end_year: last,
        trajectory,
        summary,
        crises,
    }
}

async fn statistics_handler(
    State(state): State<AppState>,
    payload: Result<Query<StatisticsPayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => {
            json_response(StatusCode::OK, build_statistics_response(&state.core, &payload))
        }
        Err(rejection) => error_response(StatusCode::BAD_REQUEST, &rejection.body_text()),
    }
}

fn build_statistics_response(
    core: &ProjectionCore,
    payload: &StatisticsPayload,
) -> StatisticsResponse {
    let params = ScenarioParameters::new(
        0.0,
        0.0,
        payload.equity_percentage.unwrap_or(DEFAULT_EQUITY_PERCENTAGE),
        payload.horizon_years.unwrap_or(DEFAULT_HORIZON_YEARS),
    );
    let statistics =
        core.compute_scenario_statistics(params.equity_percentage, params.horizon_years as i64);
    let annotation = annotate_statistics(&statistics, core.crises());

    StatisticsResponse {
        horizon_years: params.horizon_years,
        equity_percentage: params.equity_percentage,
        reference_year: core.history().last_year(),
        statistics,
        annotation,
    }
}

async fn crises_handler(
    State(state): State<AppState>,
    range: Result<Query<CrisisRangeQuery>, QueryRejection>,
) -> Response {
    let range = match range {
        Ok(Query(range)) => range,
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, &rejection.body_text());
        }
    };
    let from = range.from.unwrap_or(i32::MIN);
    let to = range.to.unwrap_or(i32::MAX);
    let events: Vec<&CrisisEvent> = state.core.crises().between(from, to).collect();
    json_response(StatusCode::OK, events)
}

async fn crisis_by_year_handler(
    State(state): State<AppState>,
    year: Result<Path<i32>, PathRejection>,
) -> Response {
    let year = match year {
        Ok(Path(year)) => year,
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, &rejection.body_text());
        }
    };
    match state.core.lookup_crisis(year) {
        Some(event) => json_response(StatusCode::OK, event),
        None => error_response(
            StatusCode::NOT_FOUND,
            &format!("No crisis recorded for {year}"),
        ),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
