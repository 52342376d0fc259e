//! Thread (post) records and the requests that create them

use super::{Author, ReactionKind};
use crate::model::reply::ReplyPayload;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Unique identifier for a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(pub i64);

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a catalog reference item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(pub i64);

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A catalog item a thread was opened about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRef {
    pub id: BookId,
    pub title: String,
    pub authors: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

/// A thread as returned by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub id: ThreadId,
    pub title: String,
    pub summary: String,
    pub body: String,
    pub topic: String,
    #[serde(default)]
    pub university: Option<String>,
    pub created_at: DateTime<Utc>,
    pub author: Author,
    #[serde(default)]
    pub reactions: HashMap<ReactionKind, u32>,
    #[serde(default)]
    pub user_reaction: Option<ReactionKind>,
    #[serde(default)]
    pub replies_count: u32,
    #[serde(default)]
    pub books: Vec<BookRef>,
    /// Soft-delete marker; only surfaced on moderation echoes.
    #[serde(default)]
    pub is_deleted: bool,
}

/// A thread plus its reply payload (detail endpoint).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadDetail {
    #[serde(flatten)]
    pub thread: ThreadSummary,
    #[serde(default)]
    pub replies: Vec<ReplyPayload>,
}

/// Request body for creating a thread.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewThread {
    pub title: String,
    pub summary: String,
    pub body: String,
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub university: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub book_ids: Vec<BookId>,
}

/// Authoritative state returned by the thread reaction endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ThreadReactionResponse {
    #[serde(default)]
    pub counts: HashMap<ReactionKind, u32>,
    #[serde(default)]
    pub user_reaction: Option<ReactionKind>,
}
