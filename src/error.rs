use std::path::PathBuf;

use derive_more::From;

use crate::verify::VerificationFailure;

/// The request never produced an HTTP response.
///
/// Any received status, including `4xx` and `5xx`, is a response and never a [`TransportError`].
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Invalid request URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Failed to connect to `{url}`: {source}")]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Request to `{url}` timed out: {source}")]
    Timeout {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Request to `{url}` failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to read the response body from `{url}`: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl TransportError {
    pub(crate) fn from_send_error(url: &str, source: reqwest::Error) -> Self {
        let url = url.to_string();

        if source.is_timeout() {
            TransportError::Timeout { url, source }
        } else if source.is_connect() {
            TransportError::Connect { url, source }
        } else if source.is_builder() {
            TransportError::InvalidUrl {
                url,
                reason: source.to_string(),
            }
        } else {
            TransportError::Request { url, source }
        }
    }
}

/// A scenario needed state that an earlier step did not provide.
#[derive(Debug, thiserror::Error)]
pub enum PreconditionError {
    #[error("No book id has been captured; the create step must run first")]
    MissingBookId,
    #[error("Creating the fixture book was rejected with status {status}")]
    FixtureRejected { status: u16 },
}

/// The response arrived but its body did not have the shape needed to continue.
#[derive(Debug, thiserror::Error)]
#[error("Failed to decode {what} from the response body: {source}")]
pub struct DecodeError {
    pub what: &'static str,
    #[source]
    pub source: serde_json::Error,
}

#[derive(Debug, From, thiserror::Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Transport(TransportError),
    #[error(transparent)]
    Precondition(PreconditionError),
    #[error(transparent)]
    Verification(VerificationFailure),
    #[error(transparent)]
    Decode(DecodeError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

#[derive(Debug, thiserror::Error)]
pub enum DiagnosticsError {
    #[error("Failed to write `{path}`: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize the result of `{scenario}`: {source}")]
    Serialize {
        scenario: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("No scenario is in progress")]
    NoScenario,
}
