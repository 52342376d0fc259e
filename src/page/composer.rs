//! Thread Composer
//!
//! Validated creation of a new thread. Validation failures are returned
//! before any request is made; a draft opened from the "discuss these
//! books" entry point additionally requires at least one reference item.

use crate::api::{ApiError, ForumApi};
use crate::model::{BookId, BookRef, NewThread, ThreadId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("title is required")]
    MissingTitle,

    #[error("summary is required")]
    MissingSummary,

    #[error("topic is required")]
    MissingTopic,

    #[error("at least one book must be selected")]
    NoBooksSelected,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// A thread being written, not yet submitted.
#[derive(Debug, Clone, Default)]
pub struct ThreadDraft {
    pub title: String,
    pub summary: String,
    pub body: String,
    pub topic: String,
    pub university: Option<String>,
    pub book_ids: Vec<BookId>,
    seeded: bool,
}

impl ThreadDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draft opened from the "discuss these books" entry point: the
    /// pre-selected items are carried in and at least one must survive to
    /// submission.
    pub fn seeded_with(books: &[BookRef]) -> Self {
        Self {
            book_ids: books.iter().map(|b| b.id).collect(),
            seeded: true,
            ..Self::default()
        }
    }

    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    /// Client-side validation; nothing goes on the wire when this fails.
    pub fn validate(&self) -> Result<(), ComposeError> {
        if self.title.trim().is_empty() {
            return Err(ComposeError::MissingTitle);
        }
        if self.summary.trim().is_empty() {
            return Err(ComposeError::MissingSummary);
        }
        if self.topic.trim().is_empty() {
            return Err(ComposeError::MissingTopic);
        }
        if self.seeded && self.book_ids.is_empty() {
            return Err(ComposeError::NoBooksSelected);
        }
        Ok(())
    }

    fn to_request(&self) -> NewThread {
        let body = self.body.trim();
        NewThread {
            title: self.title.trim().to_string(),
            summary: self.summary.trim().to_string(),
            // blank body falls back to the summary text
            body: if body.is_empty() {
                self.summary.trim().to_string()
            } else {
                body.to_string()
            },
            topic: self.topic.trim().to_string(),
            university: self.university.clone(),
            book_ids: self.book_ids.clone(),
        }
    }

    /// Validate and submit. Returns the created thread's id.
    pub async fn submit<A: ForumApi>(&self, api: &A) -> Result<ThreadId, ComposeError> {
        self.validate()?;
        Ok(api.create_thread(&self.to_request()).await?)
    }
}
