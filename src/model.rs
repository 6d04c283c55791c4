use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reading status of a book as accepted by the books API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    Unread,
    Reading,
    Finished,
}

impl BookStatus {
    pub const ALL: [BookStatus; 3] = [BookStatus::Unread, BookStatus::Reading, BookStatus::Finished];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Unread => "unread",
            BookStatus::Reading => "reading",
            BookStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown book status: {0}")]
pub struct UnknownBookStatus(pub String);

impl FromStr for BookStatus {
    type Err = UnknownBookStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownBookStatus(s.to_string()))
    }
}

/// Body sent to `POST /books` and `PUT /books/{id}`.
///
/// Every field is optional and omitted when absent, so that the negative
/// scenarios can send partial bodies or statuses outside [`BookStatus`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl BookRequest {
    pub fn new(title: impl Into<String>, author: impl Into<String>, status: BookStatus) -> Self {
        Self {
            title: Some(title.into()),
            author: Some(author.into()),
            status: Some(status.as_str().to_string()),
        }
    }

    pub fn without_title(mut self) -> Self {
        self.title = None;
        self
    }

    pub fn with_raw_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Renders the JSON body, leaving out absent fields.
    pub fn to_json(&self) -> String {
        let fields = [
            ("title", &self.title),
            ("author", &self.author),
            ("status", &self.status),
        ];

        let body = fields
            .into_iter()
            .filter_map(|(name, value)| {
                value
                    .as_ref()
                    .map(|value| (name.to_string(), Value::String(value.clone())))
            })
            .collect::<Map<_, _>>();

        Value::Object(body).to_string()
    }
}

/// A book as returned by the API on success.
///
/// Only `id` is required to decode; the other fields are checked by the verifier instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookResponse {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub status: String,
}

impl BookResponse {
    pub fn parsed_status(&self) -> Result<BookStatus, UnknownBookStatus> {
        self.status.parse()
    }
}
