//! Abuse reports and moderation statistics

use super::{ActorId, ReplyId, ThreadId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(pub i64);

impl std::fmt::Display for ReportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which kind of content a report targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Post,
    Reply,
}

impl ReportKind {
    /// Path segment used by the admin endpoints.
    pub fn path_segment(&self) -> &'static str {
        match self {
            ReportKind::Post => "posts",
            ReportKind::Reply => "replies",
        }
    }

    /// Field name carrying the delete flag in a handle request.
    pub fn delete_field(&self) -> &'static str {
        match self {
            ReportKind::Post => "delete_post",
            ReportKind::Reply => "delete_reply",
        }
    }
}

/// Minimal user echo on report records (reporter / subject author).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: ActorId,
    #[serde(default)]
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
}

/// Reported thread, echoed with enough context for review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportedThread {
    pub id: ThreadId,
    pub title: String,
    pub summary: String,
    pub body: String,
    pub topic: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_deleted: bool,
    pub author: UserRef,
}

/// Reported reply, echoed with its owning thread for context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportedReply {
    pub id: ReplyId,
    pub body: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_deleted: bool,
    pub post_id: ThreadId,
    pub post_title: String,
    pub author: UserRef,
}

/// A report raised against a thread or reply.
///
/// Exactly one of `post`/`reply` is set. `handled` is monotonic: it only
/// ever transitions to `true`, and deletion of the underlying content is
/// independent of dismissal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    #[serde(default)]
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub handled: bool,
    pub reporter: UserRef,
    #[serde(default)]
    pub post: Option<ReportedThread>,
    #[serde(default)]
    pub reply: Option<ReportedReply>,
}

impl Report {
    pub fn kind(&self) -> Option<ReportKind> {
        match (&self.post, &self.reply) {
            (Some(_), _) => Some(ReportKind::Post),
            (None, Some(_)) => Some(ReportKind::Reply),
            (None, None) => None,
        }
    }

    /// The only transition `handled` supports.
    pub fn mark_handled(&mut self) {
        self.handled = true;
    }

    /// Whether the reported content has been soft-deleted.
    pub fn subject_deleted(&self) -> bool {
        self.post.as_ref().map(|p| p.is_deleted).unwrap_or(false)
            || self.reply.as_ref().map(|r| r.is_deleted).unwrap_or(false)
    }
}

/// Authoritative unhandled-report counters.
///
/// Queue refreshes re-fetch these rather than decrementing locally, so the
/// queue and the dashboard never drift apart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportStats {
    #[serde(default)]
    pub unhandled_posts: u32,
    #[serde(default)]
    pub unhandled_replies: u32,
    #[serde(default)]
    pub total_unhandled: u32,
}

/// Envelope of the admin statistics endpoint. Only the report counters
/// matter to this engine; the rest of the dashboard is out of scope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminStats {
    #[serde(default)]
    pub reports: ReportStats,
}
