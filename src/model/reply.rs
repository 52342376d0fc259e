//! Reply records — nested on the wire, flat in the domain

use super::{Author, ThreadId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplyId(pub i64);

impl std::fmt::Display for ReplyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A reply as delivered inside a thread detail payload.
///
/// The collaborator nests direct children under `children`; depth is
/// unbounded in the data. [`crate::tree::flatten_payload`] turns this
/// into flat [`Reply`] records before the forest is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyPayload {
    pub id: ReplyId,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub author: Author,
    #[serde(default)]
    pub parent_id: Option<ReplyId>,
    #[serde(default)]
    pub up: u32,
    #[serde(default)]
    pub down: u32,
    #[serde(default)]
    pub flagged: bool,
    #[serde(default)]
    pub children: Vec<ReplyPayload>,
}

/// A reply in flat domain form. `parent_id == None` means root.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub id: ReplyId,
    pub thread_id: ThreadId,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub author: Author,
    pub parent_id: Option<ReplyId>,
    pub up: u32,
    pub down: u32,
    pub flagged: bool,
}

/// Direction of a reply vote. Votes are independent counters: every
/// submission increments one of them, nothing is exclusive per actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    Up,
    Down,
}

/// Authoritative counters returned by the reply reaction endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct VoteCounts {
    pub up: u32,
    pub down: u32,
}
