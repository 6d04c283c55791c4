use crate::{error::DiagnosticsError, runner::ScenarioResult, scenario::ScenarioInfo};

use super::{Artifact, Recorder};

/// Emits steps and artifacts as `tracing` events.
#[derive(Debug, Default)]
pub struct LogRecorder {
    scenario: Option<&'static str>,
}

impl Recorder for LogRecorder {
    fn start_scenario(&mut self, info: &ScenarioInfo) {
        self.scenario = Some(info.slug);
    }

    fn step(&mut self, name: &str) {
        tracing::info!(scenario = self.scenario, step = name, "Step");
    }

    fn attach(&mut self, label: &str, artifact: Artifact) {
        match artifact.as_text() {
            Some(text) => tracing::debug!(scenario = self.scenario, label, %text, "Artifact"),
            None => tracing::debug!(
                scenario = self.scenario,
                label,
                bytes = artifact.content.len(),
                "Artifact"
            ),
        }
    }

    fn finish_scenario(&mut self, _result: &ScenarioResult) -> Result<(), DiagnosticsError> {
        self.scenario.take().ok_or(DiagnosticsError::NoScenario)?;

        Ok(())
    }
}
