use crate::{
    error::DiagnosticsError,
    runner::{ScenarioResult, ScenarioStatus},
    scenario::ScenarioInfo,
};

use super::{Artifact, Recorder};

#[derive(Debug, Clone)]
pub struct RecordedScenario {
    pub info: ScenarioInfo,
    pub steps: Vec<String>,
    pub attachments: Vec<(String, Artifact)>,
    pub status: Option<ScenarioStatus>,
}

impl RecordedScenario {
    pub fn attachment(&self, label: &str) -> Option<&Artifact> {
        self.attachments
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, artifact)| artifact)
    }
}

/// Keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    scenarios: Vec<RecordedScenario>,
}

impl MemoryRecorder {
    pub fn scenarios(&self) -> &[RecordedScenario] {
        &self.scenarios
    }

    fn current(&mut self) -> Option<&mut RecordedScenario> {
        match self.scenarios.last_mut() {
            Some(scenario) if scenario.status.is_none() => Some(scenario),
            _ => {
                tracing::warn!("Recording outside of a scenario");

                None
            }
        }
    }
}

impl Recorder for MemoryRecorder {
    fn start_scenario(&mut self, info: &ScenarioInfo) {
        self.scenarios.push(RecordedScenario {
            info: *info,
            steps: Vec::new(),
            attachments: Vec::new(),
            status: None,
        });
    }

    fn step(&mut self, name: &str) {
        if let Some(scenario) = self.current() {
            scenario.steps.push(name.to_string());
        }
    }

    fn attach(&mut self, label: &str, artifact: Artifact) {
        if let Some(scenario) = self.current() {
            scenario.attachments.push((label.to_string(), artifact));
        }
    }

    fn finish_scenario(&mut self, result: &ScenarioResult) -> Result<(), DiagnosticsError> {
        let scenario = self
            .scenarios
            .last_mut()
            .filter(|scenario| scenario.status.is_none())
            .ok_or(DiagnosticsError::NoScenario)?;

        scenario.status = Some(result.status);

        Ok(())
    }
}
