//! Agora: threaded discussion and moderation engine
//!
//! The client-side core behind a campus forum: members post threads
//! (optionally about catalog items), reply in nested conversations, react,
//! and report abuse; moderators triage reports and remove content. There is
//! no push channel — state is kept honest by pull refresh after mutations
//! and by two independent notification pollers.
//!
//! # Core pieces
//!
//! - [`page::DiscussionPage`]: filters, pagination, and the refresh cycle
//! - [`tree`]: bounded-depth reply forests built from unbounded payloads
//! - [`reactions`]: optimistic reaction state with deterministic rollback
//! - [`moderation::ModerationDesk`]: the admin-gated report queue
//! - [`notify::NotificationCenter`]: polled notification read models
//! - [`api::ForumApi`]: the collaborator seam everything talks through
//!
//! # Example
//!
//! ```no_run
//! use agora::api::{ApiConfig, HttpForumApi};
//! use agora::model::{Actor, ActorId, Role};
//! use agora::page::DiscussionPage;
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), agora::page::PageError> {
//! let api = Arc::new(HttpForumApi::new(ApiConfig::new("https://host/api"))?);
//! let page = DiscussionPage::new(api, Actor::new(ActorId(7), Role::Student));
//! page.load().await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod model;
pub mod moderation;
pub mod notify;
pub mod page;
pub mod reactions;
pub mod tree;

pub use api::{ApiConfig, ApiError, ApiResult, ForumApi, HttpForumApi, ThreadQuery};
pub use model::{
    Actor, ActorId, Author, BookId, BookRef, NewThread, Notification, NotificationId,
    ReactionKind, Reply, ReplyId, ReplyPayload, Report, ReportId, ReportKind, ReportStats, Role,
    ThreadDetail, ThreadId, ThreadSummary, Vote, VoteCounts,
};
pub use moderation::{ModerationDesk, ModerationError, ModerationQueue};
pub use notify::{NotificationCategory, NotificationCenter, NotificationPollers, Poller};
pub use page::{
    ComposeError, DiscussionPage, Filters, PageError, ThreadCard, ThreadDraft, ThreadPane,
    PAGE_SIZE,
};
pub use reactions::{ReactionError, ReactionPolicy, ReplyVotes, ThreadReactions};
pub use tree::{build_forest, flatten_payload, CollapseSet, Forest, RootGroup};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
