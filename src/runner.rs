use std::{
    fmt,
    time::{Duration, Instant},
};

use crate::{
    client::ApiClient,
    diagnostics::Recorder,
    error::ScenarioError,
    scenario::{FixtureMode, Scenario, TestContext},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioStatus {
    Passed,
    /// The server answered but violated the expected contract.
    Failed,
    /// The scenario could not be carried out: unreachable server, missing precondition or
    /// undecodable response.
    Broken,
}

impl ScenarioStatus {
    pub fn of(outcome: &Result<(), ScenarioError>) -> Self {
        match outcome {
            Ok(()) => ScenarioStatus::Passed,
            Err(ScenarioError::Verification(_)) => ScenarioStatus::Failed,
            Err(
                ScenarioError::Transport(_)
                | ScenarioError::Precondition(_)
                | ScenarioError::Decode(_),
            ) => ScenarioStatus::Broken,
        }
    }
}

impl fmt::Display for ScenarioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScenarioStatus::Passed => "PASSED",
            ScenarioStatus::Failed => "FAILED",
            ScenarioStatus::Broken => "BROKEN",
        };

        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct ScenarioResult {
    pub scenario: Scenario,
    pub status: ScenarioStatus,
    pub message: Option<String>,
    pub duration: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct SuiteReport {
    pub results: Vec<ScenarioResult>,
}

impl SuiteReport {
    pub fn count(&self, status: ScenarioStatus) -> usize {
        self.results
            .iter()
            .filter(|result| result.status == status)
            .count()
    }

    pub fn is_success(&self) -> bool {
        self.results
            .iter()
            .all(|result| result.status == ScenarioStatus::Passed)
    }

    pub fn result(&self, scenario: Scenario) -> Option<&ScenarioResult> {
        self.results.iter().find(|result| result.scenario == scenario)
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in &self.results {
            let info = result.scenario.info();

            writeln!(
                f,
                "{:>2}. {:<28} {:<6} {:>6}ms",
                info.order,
                info.slug,
                result.status,
                result.duration.as_millis()
            )?;

            if let Some(message) = &result.message {
                for line in message.lines() {
                    writeln!(f, "      {line}")?;
                }
            }
        }

        write!(
            f,
            "{} scenarios: {} passed, {} failed, {} broken",
            self.results.len(),
            self.count(ScenarioStatus::Passed),
            self.count(ScenarioStatus::Failed),
            self.count(ScenarioStatus::Broken)
        )
    }
}

/// Runs scenarios one at a time, in the given order.
pub struct SuiteRunner<R> {
    client: ApiClient,
    fixture_mode: FixtureMode,
    recorder: R,
}

impl<R: Recorder> SuiteRunner<R> {
    pub fn new(client: ApiClient, fixture_mode: FixtureMode, recorder: R) -> Self {
        Self {
            client,
            fixture_mode,
            recorder,
        }
    }

    pub fn recorder(&self) -> &R {
        &self.recorder
    }

    pub fn into_recorder(self) -> R {
        self.recorder
    }

    #[tracing::instrument(name = "suite", skip_all, fields(base_url = self.client.base_url(), mode = ?self.fixture_mode))]
    pub async fn run(&mut self, scenarios: &[Scenario]) -> SuiteReport {
        let mut context = TestContext::default();
        let mut report = SuiteReport::default();

        for scenario in scenarios {
            let result = self.run_one(*scenario, &mut context).await;

            report.results.push(result);
        }

        tracing::info!(
            total = report.results.len(),
            passed = report.count(ScenarioStatus::Passed),
            "Suite finished"
        );

        report
    }

    async fn run_one(&mut self, scenario: Scenario, context: &mut TestContext) -> ScenarioResult {
        let info = scenario.info();
        self.recorder.start_scenario(&info);

        tracing::info!(scenario = info.slug, "Running");

        let started = Instant::now();
        let outcome = scenario
            .run(&self.client, context, self.fixture_mode, &mut self.recorder)
            .await;
        let duration = started.elapsed();

        let status = ScenarioStatus::of(&outcome);
        let message = outcome.err().map(|err| err.to_string());

        match status {
            ScenarioStatus::Passed => tracing::info!(scenario = info.slug, "Passed"),
            _ => tracing::warn!(scenario = info.slug, %status, message = message.as_deref(), "Not passed"),
        }

        let result = ScenarioResult {
            scenario,
            status,
            message,
            duration,
        };

        if let Err(err) = self.recorder.finish_scenario(&result) {
            tracing::warn!(scenario = info.slug, %err, "Failed to record scenario");
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tokio::net::TcpListener;

    use super::*;
    use crate::{
        diagnostics::MemoryRecorder,
        error::PreconditionError,
        verify::VerificationFailure,
    };

    async fn unreachable_client() -> ApiClient {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bindable");
        let addr = listener.local_addr().expect("bound");
        drop(listener);

        ApiClient::new(format!("http://{addr}/api"))
    }

    #[test]
    fn outcomes_are_classified() {
        let failed: Result<(), ScenarioError> =
            Err(VerificationFailure { failures: Vec::new() }.into());
        let broken: Result<(), ScenarioError> = Err(PreconditionError::MissingBookId.into());

        assert_eq!(ScenarioStatus::of(&Ok(())), ScenarioStatus::Passed);
        assert_eq!(ScenarioStatus::of(&failed), ScenarioStatus::Failed);
        assert_eq!(ScenarioStatus::of(&broken), ScenarioStatus::Broken);
    }

    #[tokio::test]
    async fn unreachable_server_breaks_every_scenario_without_panicking() {
        let mut runner = SuiteRunner::new(
            unreachable_client().await,
            FixtureMode::Isolated,
            MemoryRecorder::default(),
        );

        let report = runner.run(&Scenario::ALL).await;

        assert_eq!(report.results.len(), 10);
        assert_eq!(report.count(ScenarioStatus::Broken), 10);
        assert!(!report.is_success());

        let recorded = runner.recorder().scenarios();
        assert_eq!(recorded.len(), 10);
        assert!(recorded
            .iter()
            .all(|scenario| scenario.status == Some(ScenarioStatus::Broken)));

        let payload = recorded[1]
            .attachment("Request Payload")
            .and_then(|artifact| artifact.as_text())
            .expect("payload recorded before sending");
        assert!(payload.contains("cinta brontosaurus"));
    }

    #[tokio::test]
    async fn shared_mode_without_create_is_a_precondition_error() {
        let mut runner = SuiteRunner::new(
            unreachable_client().await,
            FixtureMode::Shared,
            MemoryRecorder::default(),
        );

        let report = runner
            .run(&[Scenario::UpdateBookStatus, Scenario::DeleteBook])
            .await;

        for result in &report.results {
            assert_eq!(result.status, ScenarioStatus::Broken);
            assert_eq!(
                result.message.as_deref(),
                Some(PreconditionError::MissingBookId.to_string().as_str())
            );
        }
    }

    #[tokio::test]
    async fn transport_failures_name_the_url() {
        let client = unreachable_client().await;
        let base_url = client.base_url().to_string();
        let mut runner = SuiteRunner::new(client, FixtureMode::Isolated, MemoryRecorder::default());

        let report = runner.run(&[Scenario::DeleteMissingBook]).await;
        let message = report.results[0].message.as_deref().expect("has message");

        assert!(message.contains(&format!("{base_url}/books/99999")), "{message}");
    }

    #[test]
    fn summary_lists_every_result() {
        let report = SuiteReport {
            results: vec![
                ScenarioResult {
                    scenario: Scenario::ListBooks,
                    status: ScenarioStatus::Passed,
                    message: None,
                    duration: Duration::from_millis(12),
                },
                ScenarioResult {
                    scenario: Scenario::UpdateBookEmptyBody,
                    status: ScenarioStatus::Failed,
                    message: Some("Multiple Failures (1 failures)\n-- failure 1: x".to_string()),
                    duration: Duration::from_millis(3),
                },
            ],
        };

        let summary = report.to_string();

        assert!(summary.contains("list-books"));
        assert!(summary.contains("update-book-empty-body"));
        assert!(summary.contains("      -- failure 1: x"));
        assert!(summary.ends_with("2 scenarios: 1 passed, 1 failed, 0 broken"));
    }
}
