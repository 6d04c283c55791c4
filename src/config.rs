use std::path::{Path, PathBuf};

use serde::Deserialize;
use validator::Validate;

use crate::{
    error::ConfigError,
    scenario::{FixtureMode, Scenario},
};

pub const DEFAULT_BASE_URL: &str = "https://book-app-api.cinte.id/api";
pub const DEFAULT_SUITE_NAME: &str = "BookApiTest";

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct SuiteConfig {
    /// Origin plus `/api` prefix every request path is appended to.
    #[validate(url(message = "Must be an absolute URL"))]
    pub base_url: String,
    /// Allure results directory. Nothing is written when unset.
    pub results_dir: Option<PathBuf>,
    pub fixture_mode: FixtureMode,
    #[validate(length(min = 1, message = "Must not be empty"))]
    pub suite_name: String,
    /// Scenarios to run. Empty means all of them.
    pub scenarios: Vec<Scenario>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            results_dir: None,
            fixture_mode: FixtureMode::default(),
            suite_name: DEFAULT_SUITE_NAME.to_string(),
            scenarios: Vec::new(),
        }
    }
}

impl SuiteConfig {
    pub async fn from_config_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let config: SuiteConfig =
            serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        config.validated()
    }

    pub fn validated(self) -> Result<Self, ConfigError> {
        self.validate()?;

        Ok(self)
    }

    /// The configured scenarios in declared order, or all of them when none are configured.
    pub fn selected_scenarios(&self) -> Vec<Scenario> {
        Scenario::ALL
            .into_iter()
            .filter(|scenario| self.scenarios.is_empty() || self.scenarios.contains(scenario))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_target_the_public_api() {
        let config = SuiteConfig::default().validated().expect("defaults are valid");

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.fixture_mode, FixtureMode::Isolated);
        assert_eq!(config.selected_scenarios(), Scenario::ALL.to_vec());
    }

    #[test]
    fn relative_base_url_is_rejected() {
        let config = SuiteConfig {
            base_url: "/api".to_string(),
            ..SuiteConfig::default()
        };

        assert!(matches!(config.validated(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn selection_keeps_declared_order() {
        let config = SuiteConfig {
            scenarios: vec![Scenario::DeleteMissingBook, Scenario::ListBooks],
            ..SuiteConfig::default()
        };

        assert_eq!(
            config.selected_scenarios(),
            vec![Scenario::ListBooks, Scenario::DeleteMissingBook]
        );
    }

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let config: SuiteConfig =
            serde_yaml::from_str("fixture_mode: shared\nscenarios: [create-book, update-book-status]\n")
                .expect("parsable");

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.fixture_mode, FixtureMode::Shared);
        assert_eq!(
            config.scenarios,
            vec![Scenario::CreateBook, Scenario::UpdateBookStatus]
        );
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let err = SuiteConfig::from_config_file("does-not-exist.yaml")
            .await
            .expect_err("file is missing");

        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
