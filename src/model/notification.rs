//! Per-actor notification records

use super::{ReplyId, ThreadId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub i64);

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A server-generated notification owned by the notified actor.
///
/// `kind` is an open string set — the server may introduce new tags at any
/// time, so classification happens downstream with a default bucket
/// (see [`crate::notify::NotificationCategory`]). `url` is an opaque route
/// string and stays untyped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    #[serde(default)]
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub read: bool,
    #[serde(default)]
    pub post_id: Option<ThreadId>,
    #[serde(default)]
    pub reply_id: Option<ReplyId>,
    #[serde(default)]
    pub review_id: Option<i64>,
}
