use crate::error::PreconditionError;

/// State carried from one scenario to the next within a suite run.
#[derive(Debug, Default)]
pub struct TestContext {
    created_book_id: Option<i64>,
}

impl TestContext {
    pub fn set_created_book_id(&mut self, id: i64) {
        tracing::debug!(id, "Captured book id");

        self.created_book_id = Some(id);
    }

    pub fn created_book_id(&self) -> Result<i64, PreconditionError> {
        self.created_book_id.ok_or(PreconditionError::MissingBookId)
    }

    pub fn take_created_book_id(&mut self) -> Option<i64> {
        self.created_book_id.take()
    }
}
