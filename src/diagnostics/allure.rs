//! Writes an Allure 2 results directory: one `<uuid>-result.json` per scenario and one
//! `<uuid>-attachment.<ext>` file per artifact.

use std::path::{Path, PathBuf};

use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::DiagnosticsError,
    runner::{ScenarioResult, ScenarioStatus},
    scenario::ScenarioInfo,
};

use super::{Artifact, Recorder};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AllureResult {
    uuid: String,
    history_id: String,
    name: String,
    full_name: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    status_details: Option<StatusDetails>,
    stage: &'static str,
    description: String,
    labels: Vec<Label>,
    steps: Vec<Step>,
    attachments: Vec<Attachment>,
    start: i64,
    stop: i64,
}

#[derive(Debug, Serialize)]
struct StatusDetails {
    message: String,
}

#[derive(Debug, Serialize)]
struct Label {
    name: &'static str,
    value: String,
}

#[derive(Debug, Serialize)]
struct Step {
    name: String,
    status: &'static str,
    stage: &'static str,
    start: i64,
    stop: i64,
}

#[derive(Debug, Serialize)]
struct Attachment {
    name: String,
    source: String,
    #[serde(rename = "type")]
    mime_type: String,
}

struct InProgress {
    uuid: Uuid,
    info: ScenarioInfo,
    start: i64,
    steps: Vec<Step>,
    attachments: Vec<Attachment>,
    files: Vec<(String, Vec<u8>)>,
}

pub struct AllureRecorder {
    results_dir: PathBuf,
    suite: String,
    current: Option<InProgress>,
}

impl AllureRecorder {
    pub fn new(results_dir: impl Into<PathBuf>, suite: impl Into<String>) -> Self {
        Self {
            results_dir: results_dir.into(),
            suite: suite.into(),
            current: None,
        }
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    fn current(&mut self) -> Option<&mut InProgress> {
        if self.current.is_none() {
            tracing::warn!("Recording outside of a scenario");
        }

        self.current.as_mut()
    }

    fn write(&self, file_name: &str, content: &[u8]) -> Result<(), DiagnosticsError> {
        let path = self.results_dir.join(file_name);

        std::fs::write(&path, content).map_err(|source| DiagnosticsError::Write { path, source })
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn status_name(status: ScenarioStatus) -> &'static str {
    match status {
        ScenarioStatus::Passed => "passed",
        ScenarioStatus::Failed => "failed",
        ScenarioStatus::Broken => "broken",
    }
}

impl Recorder for AllureRecorder {
    fn start_scenario(&mut self, info: &ScenarioInfo) {
        if let Some(previous) = self.current.take() {
            tracing::warn!(scenario = previous.info.slug, "Scenario was never finished");
        }

        self.current = Some(InProgress {
            uuid: Uuid::new_v4(),
            info: *info,
            start: now_millis(),
            steps: Vec::new(),
            attachments: Vec::new(),
            files: Vec::new(),
        });
    }

    fn step(&mut self, name: &str) {
        if let Some(current) = self.current() {
            let now = now_millis();

            current.steps.push(Step {
                name: name.to_string(),
                status: "passed",
                stage: "finished",
                start: now,
                stop: now,
            });
        }
    }

    fn attach(&mut self, label: &str, artifact: Artifact) {
        if let Some(current) = self.current() {
            let source = format!("{}-attachment.{}", Uuid::new_v4(), artifact.extension());

            current.attachments.push(Attachment {
                name: label.to_string(),
                source: source.clone(),
                mime_type: artifact.mime_type,
            });
            current.files.push((source, artifact.content));
        }
    }

    #[tracing::instrument(name = "allure_finish", skip_all)]
    fn finish_scenario(&mut self, result: &ScenarioResult) -> Result<(), DiagnosticsError> {
        let current = self.current.take().ok_or(DiagnosticsError::NoScenario)?;
        let info = current.info;

        std::fs::create_dir_all(&self.results_dir).map_err(|source| DiagnosticsError::Write {
            path: self.results_dir.clone(),
            source,
        })?;

        for (source, content) in &current.files {
            self.write(source, content)?;
        }

        let stop = now_millis();
        let allure_result = AllureResult {
            uuid: current.uuid.to_string(),
            history_id: format!("{}.{}", self.suite, info.slug),
            name: info.story.to_string(),
            full_name: format!("{}.{}", self.suite, info.slug),
            status: status_name(result.status),
            status_details: result
                .message
                .as_ref()
                .map(|message| StatusDetails {
                    message: message.clone(),
                }),
            stage: "finished",
            description: info.description.to_string(),
            labels: vec![
                Label {
                    name: "epic",
                    value: info.epic.to_string(),
                },
                Label {
                    name: "feature",
                    value: info.feature.to_string(),
                },
                Label {
                    name: "story",
                    value: info.story.to_string(),
                },
                Label {
                    name: "suite",
                    value: self.suite.clone(),
                },
            ],
            steps: current.steps,
            attachments: current.attachments,
            start: current.start,
            stop,
        };

        let json = serde_json::to_vec_pretty(&allure_result).map_err(|source| {
            DiagnosticsError::Serialize {
                scenario: info.slug.to_string(),
                source,
            }
        })?;

        self.write(&format!("{}-result.json", allure_result.uuid), &json)?;

        tracing::debug!(scenario = info.slug, dir = %self.results_dir.display(), "Allure result written");

        Ok(())
    }
}
