//! Soft assertions over an [`ApiResponse`].
//!
//! A [`Verifier`] evaluates every registered [`Check`] against the same response and
//! reports all violations together instead of stopping at the first one.

use std::fmt;

use serde_json::Value;

use crate::client::{field_at, ApiResponse};

const NOT_JSON: &str = "<body is not JSON>";
const MISSING: &str = "<missing>";

/// A single predicate on a response.
#[derive(Debug, Clone, PartialEq)]
pub enum Check {
    StatusEquals(u16),
    StatusIn(Vec<u16>),
    /// The body is neither empty nor JSON `null`.
    BodyPresent,
    FieldPresent(String),
    FieldEquals { field: String, expected: Value },
    FieldIn { field: String, allowed: Vec<Value> },
}

impl Check {
    pub fn field_equals(field: impl Into<String>, expected: impl Into<Value>) -> Self {
        Check::FieldEquals {
            field: field.into(),
            expected: expected.into(),
        }
    }

    pub fn field_in<V: Into<Value>>(
        field: impl Into<String>,
        allowed: impl IntoIterator<Item = V>,
    ) -> Self {
        Check::FieldIn {
            field: field.into(),
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    fn expected(&self) -> String {
        match self {
            Check::StatusEquals(code) => code.to_string(),
            Check::StatusIn(codes) => format!("one of {codes:?}"),
            Check::BodyPresent => "a non-empty body".to_string(),
            Check::FieldPresent(field) => format!("field `{field}` to be present"),
            Check::FieldEquals { expected, .. } => expected.to_string(),
            Check::FieldIn { allowed, .. } => format!(
                "one of [{}]",
                allowed
                    .iter()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }

    /// Returns the actual value when the check is violated.
    fn violation(&self, response: &ApiResponse, json: Option<&Value>) -> Option<String> {
        match self {
            Check::StatusEquals(code) => {
                (response.status_code() != *code).then(|| response.status_code().to_string())
            }
            Check::StatusIn(codes) => (!codes.contains(&response.status_code()))
                .then(|| response.status_code().to_string()),
            Check::BodyPresent => {
                let empty = response.body.trim().is_empty() || json == Some(&Value::Null);

                empty.then(|| format!("{:?}", response.body))
            }
            Check::FieldPresent(field) => lookup(json, field).err(),
            Check::FieldEquals { field, expected } => match lookup(json, field) {
                Ok(actual) if actual == expected => None,
                Ok(actual) => Some(actual.to_string()),
                Err(actual) => Some(actual),
            },
            Check::FieldIn { field, allowed } => match lookup(json, field) {
                Ok(actual) if allowed.contains(actual) => None,
                Ok(actual) => Some(actual.to_string()),
                Err(actual) => Some(actual),
            },
        }
    }
}

fn lookup<'a>(json: Option<&'a Value>, field: &str) -> Result<&'a Value, String> {
    let json = json.ok_or_else(|| NOT_JSON.to_string())?;

    field_at(json, field).ok_or_else(|| MISSING.to_string())
}

/// One violated check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionFailure {
    pub label: String,
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] expected: {} but was: {}",
            self.label, self.expected, self.actual
        )
    }
}

/// Every violated check of one [`Verifier::verify`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationFailure {
    pub failures: Vec<AssertionFailure>,
}

impl VerificationFailure {
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|failure| failure.label.as_str())
    }
}

impl fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Multiple Failures ({} failures)", self.failures.len())?;

        for (i, failure) in self.failures.iter().enumerate() {
            write!(f, "\n-- failure {}: {failure}", i + 1)?;
        }

        Ok(())
    }
}

impl std::error::Error for VerificationFailure {}

#[derive(Debug, Clone, Default)]
pub struct Verifier {
    checks: Vec<(String, Check)>,
}

impl Verifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(mut self, label: impl Into<String>, check: Check) -> Self {
        self.checks.push((label.into(), check));
        self
    }

    pub fn checks(&self) -> impl Iterator<Item = (&str, &Check)> {
        self.checks.iter().map(|(label, check)| (label.as_str(), check))
    }

    #[tracing::instrument(name = "verify", skip_all)]
    pub fn verify(&self, response: &ApiResponse) -> Result<(), VerificationFailure> {
        let json = response.json().ok();

        let failures = self
            .checks
            .iter()
            .filter_map(|(label, check)| {
                check
                    .violation(response, json.as_ref())
                    .map(|actual| AssertionFailure {
                        label: label.clone(),
                        expected: check.expected(),
                        actual,
                    })
            })
            .collect::<Vec<_>>();

        if failures.is_empty() {
            tracing::trace!(checks = self.checks.len(), "Verified");

            return Ok(());
        }

        tracing::warn!(failed = failures.len(), checks = self.checks.len(), "Verification failed");

        Err(VerificationFailure { failures })
    }
}
