use std::path::PathBuf;

use clap::Parser;

use crate::{
    config::SuiteConfig,
    error::ConfigError,
    scenario::{FixtureMode, Scenario},
};

#[derive(Debug, Parser)]
#[command(author, about, version)]
pub struct CliArgs {
    /// Path to an optional YAML configuration file.
    #[clap(long, env = "CONFIG_FILE")]
    pub config_file: Option<PathBuf>,
    /// Base URL of the books API, including the `/api` prefix.
    #[clap(long, env = "BOOK_API_BASE_URL")]
    pub base_url: Option<String>,
    /// Directory to write Allure results to.
    #[clap(long, env = "ALLURE_RESULTS_DIR")]
    pub results_dir: Option<PathBuf>,
    /// How scenarios acting on an existing book obtain it.
    #[clap(long, env = "FIXTURE_MODE", value_enum)]
    pub fixture_mode: Option<FixtureMode>,
    /// Run only this scenario. Repeatable; declared order is kept.
    #[clap(long = "only", value_enum)]
    pub only: Vec<Scenario>,
    /// Print the scenarios and exit.
    #[clap(long)]
    pub list: bool,
}

impl CliArgs {
    /// Loads the configuration file, if any, and applies the command line on top of it.
    pub async fn suite_config(&self) -> Result<SuiteConfig, ConfigError> {
        let mut config = match &self.config_file {
            Some(path) => SuiteConfig::from_config_file(path).await?,
            None => SuiteConfig::default(),
        };

        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }

        if let Some(results_dir) = &self.results_dir {
            config.results_dir = Some(results_dir.clone());
        }

        if let Some(fixture_mode) = self.fixture_mode {
            config.fixture_mode = fixture_mode;
        }

        if !self.only.is_empty() {
            config.scenarios = self.only.clone();
        }

        config.validated()
    }
}
