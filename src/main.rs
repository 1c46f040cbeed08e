use clap::Parser;

use investsim::cli::{self, Cli};
use investsim::config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_env_file();
    config::init_logging();

    let cli = Cli::parse();
    cli::run(cli).await
}
