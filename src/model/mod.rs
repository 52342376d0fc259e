//! Domain and wire types for the discussion engine
//!
//! Everything here mirrors the collaborator API's JSON contract: threads
//! (posts), replies, reports, notifications, and the actors that own them.
//! Ids are server-issued integers wrapped in newtypes.

mod notification;
mod reply;
mod report;
mod thread;


pub use notification::{Notification, NotificationId};
pub use reply::{Reply, ReplyId, ReplyPayload, Vote, VoteCounts};
pub use report::{
    AdminStats, Report, ReportId, ReportKind, ReportStats, ReportedReply, ReportedThread, UserRef,
};
pub use thread::{
    BookId, BookRef, NewThread, ThreadDetail, ThreadId, ThreadReactionResponse, ThreadSummary,
};

use serde::{Deserialize, Serialize};

/// Unique identifier for an actor (user account).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub i64);

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Actor role as reported by the collaborator.
///
/// The set is server-extensible; unrecognized roles fall into `Unknown`
/// and are treated as unprivileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Researcher,
    Admin,
    #[serde(other)]
    Unknown,
}

/// Author of a thread or reply, echoed on every record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: ActorId,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    #[serde(default)]
    pub academic_title: Option<String>,
    #[serde(default)]
    pub university: Option<String>,
}

impl Author {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// The fixed reaction palette for threads.
///
/// Exactly these six kinds exist; an actor holds at most one of them per
/// thread. Reply votes are a separate model (see [`Vote`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Celebrate,
    Support,
    Love,
    Insightful,
    Funny,
}

impl ReactionKind {
    pub const ALL: [ReactionKind; 6] = [
        ReactionKind::Like,
        ReactionKind::Celebrate,
        ReactionKind::Support,
        ReactionKind::Love,
        ReactionKind::Insightful,
        ReactionKind::Funny,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Celebrate => "celebrate",
            ReactionKind::Support => "support",
            ReactionKind::Love => "love",
            ReactionKind::Insightful => "insightful",
            ReactionKind::Funny => "funny",
        }
    }
}

impl std::fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The acting user, as far as permission checks are concerned.
///
/// Admin surfaces are read-only for content (no reacting, replying, or
/// reporting); members cannot report or delete what they do not own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: ActorId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: ActorId, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Owner or admin may delete.
    pub fn can_delete(&self, author: ActorId) -> bool {
        self.id == author || self.is_admin()
    }

    /// Anyone except the author and admins may report.
    pub fn can_report(&self, author: ActorId) -> bool {
        self.id != author && !self.is_admin()
    }

    pub fn can_reply(&self) -> bool {
        !self.is_admin()
    }

    /// Self-reacting is allowed; admins only see counters.
    pub fn can_react(&self) -> bool {
        !self.is_admin()
    }

    pub fn can_moderate(&self) -> bool {
        self.is_admin()
    }
}
