//! The fixed scenarios describing the contract of the books API.

use serde::Deserialize;

use crate::{
    client::{ApiClient, ApiRequest},
    diagnostics::Recorder,
    error::{PreconditionError, ScenarioError},
    model::{BookRequest, BookResponse, BookStatus},
    verify::{Check, Verifier},
};

mod context;
pub mod fixture;

pub use context::TestContext;
pub use fixture::FixtureMode;

pub const BOOKS_PATH: &str = "books";
pub const WRONG_ENDPOINT_PATH: &str = "bookz";
pub const BOOK_TITLE: &str = "cinta brontosaurus";
pub const BOOK_AUTHOR: &str = "Raditiya Dika";
pub const MISSING_BOOK_ID: i64 = 99999;
pub const EMPTY_BODY_BOOK_ID: i64 = 1;

const EPIC: &str = "Book API";
const FEATURE: &str = "CRUD Operations";
const STATUS_CODE: &str = "Status Code";

pub fn book_path(id: i64) -> String {
    format!("{BOOKS_PATH}/{id}")
}

/// Reporting metadata of a [`Scenario`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioInfo {
    pub order: u8,
    pub slug: &'static str,
    pub epic: &'static str,
    pub feature: &'static str,
    pub story: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    ListBooks,
    CreateBook,
    UpdateBookStatus,
    DeleteBook,
    GetWrongEndpoint,
    CreateBookWithoutTitle,
    CreateBookInvalidStatus,
    UpdateMissingBook,
    UpdateBookEmptyBody,
    DeleteMissingBook,
}

impl Scenario {
    /// Every scenario in declared order.
    pub const ALL: [Scenario; 10] = [
        Scenario::ListBooks,
        Scenario::CreateBook,
        Scenario::UpdateBookStatus,
        Scenario::DeleteBook,
        Scenario::GetWrongEndpoint,
        Scenario::CreateBookWithoutTitle,
        Scenario::CreateBookInvalidStatus,
        Scenario::UpdateMissingBook,
        Scenario::UpdateBookEmptyBody,
        Scenario::DeleteMissingBook,
    ];

    pub fn info(&self) -> ScenarioInfo {
        let (order, slug, story, description) = match self {
            Scenario::ListBooks => (
                1,
                "list-books",
                "1 Get all books",
                "Verify that GET /books returns list of books",
            ),
            Scenario::CreateBook => (
                2,
                "create-book",
                "2 Add a new book",
                "Verify that POST /books can add new book",
            ),
            Scenario::UpdateBookStatus => (
                3,
                "update-book-status",
                "3 Update book",
                "Verify that PUT /books/{id} can update a book",
            ),
            Scenario::DeleteBook => (
                4,
                "delete-book",
                "4 Delete book",
                "Verify that DELETE /books/{id} can delete a book",
            ),
            Scenario::GetWrongEndpoint => (
                5,
                "get-wrong-endpoint",
                "Negative GET - wrong endpoint",
                "Verify GET wrong endpoint returns 404",
            ),
            Scenario::CreateBookWithoutTitle => (
                6,
                "create-book-without-title",
                "Negative POST - missing title",
                "Verify POST without title returns 400",
            ),
            Scenario::CreateBookInvalidStatus => (
                7,
                "create-book-invalid-status",
                "Negative POST - invalid status",
                "Verify POST with invalid status returns 400",
            ),
            Scenario::UpdateMissingBook => (
                8,
                "update-missing-book",
                "Negative PUT - book id not found",
                "Verify PUT non-existing id returns 404",
            ),
            Scenario::UpdateBookEmptyBody => (
                9,
                "update-book-empty-body",
                "Negative PUT - empty body",
                "Verify PUT with empty body returns 400",
            ),
            Scenario::DeleteMissingBook => (
                10,
                "delete-missing-book",
                "Negative DELETE - book id not found",
                "Verify DELETE non-existing id returns 404",
            ),
        };

        ScenarioInfo {
            order,
            slug,
            epic: EPIC,
            feature: FEATURE,
            story,
            description,
        }
    }

    pub fn slug(&self) -> &'static str {
        self.info().slug
    }

    /// Scenarios that act on a book which must exist beforehand.
    pub fn needs_book(&self) -> bool {
        matches!(self, Scenario::UpdateBookStatus | Scenario::DeleteBook)
    }

    /// Scenarios that leave server state unchanged.
    pub fn is_negative(&self) -> bool {
        self.info().order >= 5
    }

    pub fn request(&self, context: &TestContext) -> Result<ApiRequest, PreconditionError> {
        let request = match self {
            Scenario::ListBooks => ApiRequest::get(BOOKS_PATH),
            Scenario::CreateBook => ApiRequest::post(BOOKS_PATH).json_body(
                BookRequest::new(BOOK_TITLE, BOOK_AUTHOR, BookStatus::Unread).to_json(),
            ),
            Scenario::UpdateBookStatus => ApiRequest::put(book_path(context.created_book_id()?))
                .json_body(BookRequest::new(BOOK_TITLE, BOOK_AUTHOR, BookStatus::Reading).to_json()),
            Scenario::DeleteBook => ApiRequest::delete(book_path(context.created_book_id()?)),
            Scenario::GetWrongEndpoint => ApiRequest::get(WRONG_ENDPOINT_PATH),
            Scenario::CreateBookWithoutTitle => ApiRequest::post(BOOKS_PATH).json_body(
                BookRequest::new("", "Anonim", BookStatus::Unread)
                    .without_title()
                    .to_json(),
            ),
            Scenario::CreateBookInvalidStatus => ApiRequest::post(BOOKS_PATH).json_body(
                BookRequest::new("Book X", "Anonim", BookStatus::Unread)
                    .with_raw_status("abc")
                    .to_json(),
            ),
            Scenario::UpdateMissingBook => ApiRequest::put(book_path(MISSING_BOOK_ID))
                .json_body(BookRequest::new("X", "Y", BookStatus::Reading).to_json()),
            Scenario::UpdateBookEmptyBody => ApiRequest::put(book_path(EMPTY_BODY_BOOK_ID))
                .json_body(BookRequest::default().to_json()),
            Scenario::DeleteMissingBook => ApiRequest::delete(book_path(MISSING_BOOK_ID)),
        };

        Ok(request)
    }

    pub fn verifier(&self) -> Verifier {
        match self {
            Scenario::ListBooks => Verifier::new()
                .check(STATUS_CODE, Check::StatusEquals(200))
                .check("Response Body not null", Check::BodyPresent),
            Scenario::CreateBook => Verifier::new()
                .check(STATUS_CODE, Check::StatusIn(vec![200, 201]))
                .check("Title field", Check::field_equals("title", BOOK_TITLE))
                .check(
                    "Status field",
                    Check::field_in("status", BookStatus::ALL.map(|status| status.as_str())),
                ),
            Scenario::UpdateBookStatus => Verifier::new()
                .check(STATUS_CODE, Check::StatusEquals(200))
                .check(
                    "Updated status",
                    Check::field_equals("status", BookStatus::Reading.as_str()),
                ),
            Scenario::DeleteBook => {
                Verifier::new().check(STATUS_CODE, Check::StatusIn(vec![200, 204]))
            }
            Scenario::GetWrongEndpoint
            | Scenario::UpdateMissingBook
            | Scenario::DeleteMissingBook => {
                Verifier::new().check(STATUS_CODE, Check::StatusEquals(404))
            }
            Scenario::CreateBookWithoutTitle
            | Scenario::CreateBookInvalidStatus
            | Scenario::UpdateBookEmptyBody => {
                Verifier::new().check(STATUS_CODE, Check::StatusEquals(400))
            }
        }
    }

    /// Runs the scenario including its setup and teardown for `mode`.
    #[tracing::instrument(name = "scenario", skip_all, fields(slug = self.slug()))]
    pub async fn run(
        &self,
        client: &ApiClient,
        context: &mut TestContext,
        mode: FixtureMode,
        recorder: &mut dyn Recorder,
    ) -> Result<(), ScenarioError> {
        let isolated = mode == FixtureMode::Isolated;

        if isolated && self.needs_book() {
            let id = fixture::create_book(client, recorder).await?;

            context.set_created_book_id(id);
        }

        let outcome = self.exercise(client, context, recorder).await;

        if isolated {
            if let Some(id) = context.take_created_book_id() {
                if *self != Scenario::DeleteBook {
                    fixture::delete_book(client, id, recorder).await;
                }
            }
        }

        outcome
    }

    async fn exercise(
        &self,
        client: &ApiClient,
        context: &mut TestContext,
        recorder: &mut dyn Recorder,
    ) -> Result<(), ScenarioError> {
        let request = self.request(context)?;
        let described = request.describe();

        recorder.attach_request_payload(&request);
        recorder.step(&format!("Send {described}"));

        let response = client.send(&request).await?;

        recorder.attach_response(&response);
        recorder.step(&format!("Verify {described} response"));

        let verified = self.verifier().verify(&response);

        if let Err(failure) = &verified {
            recorder.attach_text("SoftAssertions Failed", &failure.to_string());
        }

        if *self == Scenario::CreateBook {
            match response.deserialize::<BookResponse>("the created book") {
                Ok(book) => {
                    context.set_created_book_id(book.id);
                    recorder.step(&format!("New Book Id = {}", book.id));
                }
                Err(err) if verified.is_ok() => return Err(err.into()),
                Err(err) => tracing::warn!(%err, "No book id captured"),
            }
        }

        verified.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use http::{Method, StatusCode};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::client::{ApiResponse, APPLICATION_JSON};

    #[test]
    fn declared_order_matches_info_order() {
        let orders = Scenario::ALL
            .iter()
            .map(|scenario| scenario.info().order)
            .collect::<Vec<_>>();

        assert_eq!(orders, (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn slugs_match_cli_names() {
        use clap::ValueEnum;

        for scenario in Scenario::ALL {
            let name = scenario
                .to_possible_value()
                .expect("not skipped")
                .get_name()
                .to_string();

            assert_eq!(name, scenario.slug());
        }
    }

    #[test]
    fn create_request_carries_the_full_book() {
        let request = Scenario::CreateBook
            .request(&TestContext::default())
            .expect("no precondition");

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "books");
        assert_eq!(request.content_type.as_deref(), Some(APPLICATION_JSON));

        let body: serde_json::Value =
            serde_json::from_str(request.body.as_deref().expect("has body")).expect("JSON");
        assert_eq!(
            body,
            json!({"title": "cinta brontosaurus", "author": "Raditiya Dika", "status": "unread"})
        );
    }

    #[test]
    fn update_and_delete_need_a_captured_id() {
        let context = TestContext::default();

        for scenario in [Scenario::UpdateBookStatus, Scenario::DeleteBook] {
            assert!(matches!(
                scenario.request(&context),
                Err(PreconditionError::MissingBookId)
            ));
        }
    }

    #[test]
    fn update_targets_the_captured_id() {
        let mut context = TestContext::default();
        context.set_created_book_id(17);

        let request = Scenario::UpdateBookStatus
            .request(&context)
            .expect("id captured");

        assert_eq!(request.describe(), "PUT /books/17");
        assert!(request.body.as_deref().expect("has body").contains("\"reading\""));
    }

    #[test]
    fn negative_requests_match_the_contract() {
        let context = TestContext::default();
        let describe = |scenario: Scenario| {
            let request = scenario.request(&context).expect("no precondition");

            (request.describe(), request.body)
        };

        assert_eq!(describe(Scenario::GetWrongEndpoint), ("GET /bookz".to_string(), None));
        assert_eq!(
            describe(Scenario::CreateBookWithoutTitle),
            (
                "POST /books".to_string(),
                Some(r#"{"author":"Anonim","status":"unread"}"#.to_string())
            )
        );
        assert_eq!(
            describe(Scenario::UpdateBookEmptyBody),
            ("PUT /books/1".to_string(), Some("{}".to_string()))
        );
        assert_eq!(
            describe(Scenario::DeleteMissingBook),
            ("DELETE /books/99999".to_string(), None)
        );
        assert!(describe(Scenario::CreateBookInvalidStatus)
            .1
            .expect("has body")
            .contains("\"abc\""));
    }

    #[test]
    fn create_verifier_accepts_either_success_status() {
        let body = r#"{"id":5,"title":"cinta brontosaurus","author":"Raditiya Dika","status":"unread"}"#;

        for status in [StatusCode::OK, StatusCode::CREATED] {
            assert!(Scenario::CreateBook
                .verifier()
                .verify(&ApiResponse::new(status, body))
                .is_ok());
        }
    }

    #[test]
    fn create_verifier_reports_title_and_status_together() {
        let response = ApiResponse::new(StatusCode::CREATED, r#"{"id":5,"title":"x","status":"lost"}"#);

        let failure = Scenario::CreateBook
            .verifier()
            .verify(&response)
            .expect_err("two fields are wrong");

        assert_eq!(
            failure.labels().collect::<Vec<_>>(),
            vec!["Title field", "Status field"]
        );
    }

    #[test]
    fn negative_verifiers_expect_their_status() {
        let expectations = [
            (Scenario::GetWrongEndpoint, StatusCode::NOT_FOUND),
            (Scenario::CreateBookWithoutTitle, StatusCode::BAD_REQUEST),
            (Scenario::CreateBookInvalidStatus, StatusCode::BAD_REQUEST),
            (Scenario::UpdateMissingBook, StatusCode::NOT_FOUND),
            (Scenario::UpdateBookEmptyBody, StatusCode::BAD_REQUEST),
            (Scenario::DeleteMissingBook, StatusCode::NOT_FOUND),
        ];

        for (scenario, status) in expectations {
            let verifier = scenario.verifier();

            assert!(verifier.verify(&ApiResponse::new(status, "")).is_ok(), "{scenario:?}");
            assert!(
                verifier.verify(&ApiResponse::new(StatusCode::OK, "")).is_err(),
                "{scenario:?}"
            );
            assert!(scenario.is_negative());
        }
    }

    #[test]
    fn delete_verifier_accepts_no_content() {
        assert!(Scenario::DeleteBook
            .verifier()
            .verify(&ApiResponse::new(StatusCode::NO_CONTENT, ""))
            .is_ok());
    }
}
