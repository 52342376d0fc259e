//! Collaborator API contract
//!
//! The engine owns no storage: every thread, reply, reaction, report, and
//! notification lives behind this request/response seam. [`ForumApi`] is the
//! contract; [`HttpForumApi`] is the JSON/HTTPS implementation. Tests swap in
//! an in-memory double.

mod http;

pub use http::HttpForumApi;

use crate::model::{
    NewThread, Notification, NotificationId, ReactionKind, Reply, ReplyId, Report, ReportId,
    ReportKind, ReportStats, ThreadDetail, ThreadId, ThreadReactionResponse, ThreadSummary, Vote,
    VoteCounts,
};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors crossing the collaborator seam.
///
/// The taxonomy drives recovery: `Validation` never reaches the network,
/// `NotPermitted` is terminal, `NotFound`/`Conflict` mean local state is
/// stale and a full refresh is due, `Server`/`Transport` are transient and
/// leave the control re-enabled for a manual retry.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not permitted")]
    NotPermitted,

    #[error("not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("server error (status {0})")]
    Server(u16),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Stale-state errors: the caller should re-query the affected listing
    /// so entries that no longer exist disappear.
    pub fn needs_refresh(&self) -> bool {
        matches!(self, ApiError::NotFound | ApiError::Conflict(_))
    }

    /// Transient errors: roll back optimistic state, no automatic retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Server(_) | ApiError::Transport(_))
    }
}

/// Result type for collaborator calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Query parameters for the thread listing endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThreadQuery {
    pub q: Option<String>,
    pub topic: Option<String>,
    pub university: Option<String>,
    pub offset: usize,
    pub limit: usize,
}

/// Connection settings for [`HttpForumApi`].
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the collaborator, e.g. `https://host/api`.
    pub base_url: String,
    /// Bearer token attached to every request when present.
    pub bearer_token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            bearer_token: None,
            timeout: Duration::from_secs(15),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// The collaborator contract.
///
/// Every call is asynchronous and suspends only the caller; implementations
/// must be shareable across tasks.
#[async_trait]
pub trait ForumApi: Send + Sync {
    // --- threads -----------------------------------------------------------

    async fn list_threads(&self, query: &ThreadQuery) -> ApiResult<Vec<ThreadSummary>>;

    async fn fetch_thread(&self, id: ThreadId) -> ApiResult<ThreadDetail>;

    async fn create_thread(&self, request: &NewThread) -> ApiResult<ThreadId>;

    async fn delete_thread(&self, id: ThreadId) -> ApiResult<()>;

    // --- replies -----------------------------------------------------------

    async fn add_reply(
        &self,
        thread: ThreadId,
        body: &str,
        parent: Option<ReplyId>,
    ) -> ApiResult<Reply>;

    async fn delete_reply(&self, id: ReplyId) -> ApiResult<()>;

    // --- reactions ---------------------------------------------------------

    /// `kind = None` clears the actor's reaction. The response carries the
    /// authoritative counts and the actor's resulting reaction.
    async fn react_to_thread(
        &self,
        id: ThreadId,
        kind: Option<ReactionKind>,
    ) -> ApiResult<ThreadReactionResponse>;

    async fn react_to_reply(&self, id: ReplyId, vote: Vote) -> ApiResult<VoteCounts>;

    // --- reports -----------------------------------------------------------

    async fn report_thread(&self, id: ThreadId, reason: Option<&str>) -> ApiResult<()>;

    async fn report_reply(&self, id: ReplyId, reason: Option<&str>) -> ApiResult<()>;

    async fn unhandled_reports(&self, kind: ReportKind) -> ApiResult<Vec<Report>>;

    /// Resolve a report; when `delete_content` is set the underlying
    /// thread/reply is soft-deleted in the same request (atomic unit).
    async fn handle_report(
        &self,
        kind: ReportKind,
        id: ReportId,
        delete_content: bool,
    ) -> ApiResult<()>;

    /// Authoritative unhandled-report counters.
    async fn moderation_stats(&self) -> ApiResult<ReportStats>;

    // --- notifications -----------------------------------------------------

    async fn notifications(&self) -> ApiResult<Vec<Notification>>;

    async fn mark_notification_read(&self, id: NotificationId) -> ApiResult<()>;

    async fn delete_notification(&self, id: NotificationId) -> ApiResult<()>;

    async fn unread_count(&self) -> ApiResult<u32>;
}
