use serde::Deserialize;

use crate::{
    client::{ApiClient, ApiRequest},
    diagnostics::Recorder,
    error::{PreconditionError, ScenarioError},
    model::{BookRequest, BookResponse, BookStatus},
};

use super::{book_path, BOOKS_PATH, BOOK_AUTHOR, BOOK_TITLE};

/// How scenarios that act on an existing book obtain it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FixtureMode {
    /// Every scenario creates the book it needs and deletes what it created.
    #[default]
    Isolated,
    /// Scenarios reuse the book captured by the create scenario, so declared order matters.
    Shared,
}

/// Creates a book for a scenario to act on and returns its id.
#[tracing::instrument(name = "create_fixture", skip_all)]
pub async fn create_book(
    client: &ApiClient,
    recorder: &mut dyn Recorder,
) -> Result<i64, ScenarioError> {
    let payload = BookRequest::new(BOOK_TITLE, BOOK_AUTHOR, BookStatus::Unread);
    let request = ApiRequest::post(BOOKS_PATH).json_body(payload.to_json());

    recorder.step("Setup: create a book");

    let response = client.send(&request).await?;

    if !response.status.is_success() {
        recorder.attach_response(&response);

        return Err(PreconditionError::FixtureRejected {
            status: response.status_code(),
        }
        .into());
    }

    let book: BookResponse = response.deserialize("the fixture book")?;

    recorder.step(&format!("Setup: created book {}", book.id));

    Ok(book.id)
}

/// Deletes a book created for a scenario. Failures are logged and annotated, never returned.
#[tracing::instrument(name = "delete_fixture", skip(client, recorder))]
pub async fn delete_book(client: &ApiClient, id: i64, recorder: &mut dyn Recorder) {
    let request = ApiRequest::delete(book_path(id));

    match client.send(&request).await {
        Ok(response) if response.status.is_success() => {
            recorder.step(&format!("Teardown: deleted book {id}"));
        }
        Ok(response) => {
            tracing::warn!(id, status = %response.status, "Teardown delete rejected");

            recorder.step(&format!(
                "Teardown: deleting book {id} returned {}",
                response.status_code()
            ));
        }
        Err(err) => {
            tracing::warn!(id, %err, "Teardown delete failed");

            recorder.step(&format!("Teardown: deleting book {id} failed: {err}"));
        }
    }
}
