use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use crate::api::{AppState, run_http_server};
use crate::config::{DEFAULT_PORT, ENV_CRISES, ENV_DATASET, ENV_PORT, ENV_SIMULATIONS, Settings};
use crate::core::{
    BacktestSummary, NUM_SIMULATIONS, ProjectionCore, ProjectionOptions, ScenarioParameters,
    ScenarioStatistics, SeededRng, StatisticsAnnotation, YearValue, annotate_statistics,
    run_forward_projection, summarize_backtest,
};

#[derive(Parser, Debug)]
#[command(
    name = "investsim",
    about = "Monte Carlo projection and historical backtest of an equity/bond portfolio"
)]
pub struct Cli {
    #[arg(long, global = true, env = ENV_DATASET, help = "Historical return dataset (JSON)")]
    dataset: Option<PathBuf>,
    #[arg(long, global = true, env = ENV_CRISES, help = "Crisis catalog (JSON)")]
    crises: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        env = ENV_SIMULATIONS,
        default_value_t = NUM_SIMULATIONS,
        help = "Number of simulated paths for forward projections"
    )]
    simulations: u32,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the JSON API over HTTP
    Serve {
        #[arg(long, env = ENV_PORT, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
    /// Monte Carlo projection with 10th/50th/90th percentile bands
    Project {
        #[command(flatten)]
        scenario: ScenarioArgs,
        #[arg(long, help = "Seed for a reproducible run; random when omitted")]
        seed: Option<u64>,
    },
    /// Replay recorded returns over a calendar window
    Backtest {
        #[command(flatten)]
        scenario: ScenarioArgs,
        #[arg(long, allow_hyphen_values = true)]
        start_year: Option<i32>,
        #[arg(long, allow_hyphen_values = true)]
        end_year: Option<i32>,
    },
    /// Average return, worst and best year over the most recent horizon
    Stats {
        #[arg(long, default_value_t = 50.0, allow_hyphen_values = true)]
        equity_percentage: f64,
        #[arg(long, default_value_t = 20, allow_hyphen_values = true)]
        horizon_years: i64,
    },
    /// Look up a crisis by year, or list the catalog
    Crisis {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        from: Option<i32>,
        #[arg(long)]
        to: Option<i32>,
    },
}

#[derive(Args, Debug, Clone, Copy)]
struct ScenarioArgs {
    #[arg(long, default_value_t = 500_000.0, allow_hyphen_values = true)]
    initial_investment: f64,
    #[arg(long, default_value_t = 1_000.0, allow_hyphen_values = true)]
    monthly_contribution: f64,
    #[arg(
        long,
        default_value_t = 50.0,
        allow_hyphen_values = true,
        help = "Equity share in percent, clamped to 0..=100"
    )]
    equity_percentage: f64,
    #[arg(long, default_value_t = 20, allow_hyphen_values = true)]
    horizon_years: i64,
}

impl From<ScenarioArgs> for ScenarioParameters {
    fn from(args: ScenarioArgs) -> Self {
        ScenarioParameters::new(
            args.initial_investment,
            args.monthly_contribution,
            args.equity_percentage,
            args.horizon_years,
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BacktestOutput {
    trajectory: Vec<YearValue>,
    summary: BacktestSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatisticsOutput {
    statistics: ScenarioStatistics,
    annotation: StatisticsAnnotation,
}

impl Cli {
    pub fn settings(&self) -> Settings {
        Settings::new(self.dataset.clone(), self.crises.clone(), self.simulations)
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let settings = cli.settings();
    let core = ProjectionCore::load(&settings.core).context("failed to load reference data")?;

    match cli.command {
        Command::Serve { port } => {
            let state = AppState::new(core, settings.simulations);
            run_http_server(port, state)
                .await
                .with_context(|| format!("HTTP server on port {port} failed"))?;
        }
        Command::Project { scenario, seed } => {
            let params = ScenarioParameters::from(scenario);
            let seed = seed.unwrap_or_else(rand::random::<u64>);
            info!(seed, "running forward projection");
            let mut rng = SeededRng::new(seed);
            let options = ProjectionOptions {
                simulations: settings.simulations,
            };
            let result = run_forward_projection(&params, options, &mut rng);
            print_json(&result)?;
        }
        Command::Backtest {
            scenario,
            start_year,
            end_year,
        } => {
            let params = ScenarioParameters::from(scenario);
            let end_year = end_year.unwrap_or(core.history().last_year());
            let start_year = start_year.unwrap_or_else(|| {
                end_year.saturating_sub(i32::try_from(params.horizon_years).unwrap_or(i32::MAX))
            });
            let trajectory = core.run_historical_backtest(&params, start_year, end_year);
            let summary = summarize_backtest(&trajectory, &params);
            print_json(&BacktestOutput {
                trajectory,
                summary,
            })?;
        }
        Command::Stats {
            equity_percentage,
            horizon_years,
        } => {
            let statistics = core.compute_scenario_statistics(equity_percentage, horizon_years);
            let annotation = annotate_statistics(&statistics, core.crises());
            print_json(&StatisticsOutput {
                statistics,
                annotation,
            })?;
        }
        Command::Crisis { year, from, to } => match year {
            Some(year) => match core.lookup_crisis(year) {
                Some(event) => print_json(event)?,
                None => anyhow::bail!("no crisis recorded for {year}"),
            },
            None => {
                let events: Vec<_> = core
                    .crises()
                    .between(from.unwrap_or(i32::MIN), to.unwrap_or(i32::MAX))
                    .collect();
                print_json(&events)?;
            }
        },
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).context("failed to encode output")?;
    writeln!(stdout)?;
    Ok(())
}
