use std::path::PathBuf;

use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::core::{CoreConfig, NUM_SIMULATIONS};

pub const ENV_DATASET: &str = "INVESTSIM_DATASET";
pub const ENV_CRISES: &str = "INVESTSIM_CRISES";
pub const ENV_PORT: &str = "INVESTSIM_PORT";
pub const ENV_SIMULATIONS: &str = "INVESTSIM_SIMULATIONS";

pub const DEFAULT_PORT: u16 = 8080;

/// Resolved runtime settings, after `.env`, environment and flags.
#[derive(Debug, Clone)]
pub struct Settings {
    pub core: CoreConfig,
    pub simulations: u32,
}

impl Settings {
    pub fn new(dataset: Option<PathBuf>, crises: Option<PathBuf>, simulations: u32) -> Self {
        Self {
            core: CoreConfig {
                history_path: dataset,
                crises_path: crises,
            },
            simulations: simulations.max(1),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(None, None, NUM_SIMULATIONS)
    }
}

/// Loads `.env` if present. Must run before argument parsing so clap's
/// `env` fallbacks can see the values.
pub fn load_env_file() -> Option<PathBuf> {
    let path = dotenvy::dotenv().ok();
    if let Some(path) = &path {
        debug!(path = %path.display(), "loaded environment file");
    }
    path
}

/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_use_bundled_data() {
        let settings = Settings::default();
        assert!(settings.core.history_path.is_none());
        assert!(settings.core.crises_path.is_none());
        assert_eq!(settings.simulations, NUM_SIMULATIONS);
    }

    #[test]
    fn zero_simulations_is_raised_to_one() {
        let settings = Settings::new(Some(PathBuf::from("h.json")), None, 0);
        assert_eq!(settings.simulations, 1);
        assert_eq!(settings.core.history_path, Some(PathBuf::from("h.json")));
    }
}
