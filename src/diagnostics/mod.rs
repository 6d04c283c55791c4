//! Labeled diagnostic artifacts captured around every request, independent of the outcome.

use derivative::Derivative;

use crate::{
    client::{ApiRequest, ApiResponse, APPLICATION_JSON},
    error::DiagnosticsError,
    runner::ScenarioResult,
    scenario::ScenarioInfo,
    utils::body_len_fmt,
};

pub mod allure;
pub mod log;
pub mod memory;

pub use allure::AllureRecorder;
pub use log::LogRecorder;
pub use memory::MemoryRecorder;

pub const TEXT_PLAIN: &str = "text/plain";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// A labeled blob attached to a scenario.
#[derive(Derivative, Clone, PartialEq, Eq)]
#[derivative(Debug)]
pub struct Artifact {
    pub mime_type: String,
    #[derivative(Debug(format_with = "body_len_fmt"))]
    pub content: Vec<u8>,
}

impl Artifact {
    pub fn text(text: impl Into<String>) -> Self {
        Self::binary(TEXT_PLAIN, text.into().into_bytes())
    }

    pub fn json(text: impl Into<String>) -> Self {
        Self::binary(APPLICATION_JSON, text.into().into_bytes())
    }

    pub fn binary(mime_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            content,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }

    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            APPLICATION_JSON => "json",
            TEXT_PLAIN => "txt",
            _ => "bin",
        }
    }
}

/// Sink for steps and artifacts of the scenario in progress.
///
/// Recording must never influence whether a scenario passes.
pub trait Recorder {
    fn start_scenario(&mut self, info: &ScenarioInfo);

    /// Free-text annotation of what the scenario is doing.
    fn step(&mut self, name: &str);

    fn attach(&mut self, label: &str, artifact: Artifact);

    fn finish_scenario(&mut self, result: &ScenarioResult) -> Result<(), DiagnosticsError>;

    fn attach_text(&mut self, label: &str, text: &str) {
        self.attach(label, Artifact::text(text));
    }

    /// Attaches the outgoing body, if the request has one.
    fn attach_request_payload(&mut self, request: &ApiRequest) {
        if let Some(body) = &request.body {
            let mime_type = request.content_type.as_deref().unwrap_or(TEXT_PLAIN);

            self.attach(
                "Request Payload",
                Artifact::binary(mime_type, body.clone().into_bytes()),
            );
        }
    }

    fn attach_response(&mut self, response: &ApiResponse) {
        self.attach_text("Response Status", &response.status_code().to_string());

        let body = response.pretty_body();
        let artifact = match response.json() {
            Ok(_) => Artifact::json(body),
            Err(_) => Artifact::text(body),
        };

        self.attach("Response Body", artifact);
    }
}

impl<R: Recorder + ?Sized> Recorder for Box<R> {
    fn start_scenario(&mut self, info: &ScenarioInfo) {
        (**self).start_scenario(info)
    }

    fn step(&mut self, name: &str) {
        (**self).step(name)
    }

    fn attach(&mut self, label: &str, artifact: Artifact) {
        (**self).attach(label, artifact)
    }

    fn finish_scenario(&mut self, result: &ScenarioResult) -> Result<(), DiagnosticsError> {
        (**self).finish_scenario(result)
    }
}
