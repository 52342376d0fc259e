//! Moderation Workflow
//!
//! A role-gated view over report records, parallel to the public page.
//! Reports move one way: unhandled → handled, optionally soft-deleting the
//! reported content in the same request. The unhandled counters shown next
//! to the queue are always re-fetched from the authoritative statistics
//! endpoint — never decremented locally — so the queue and the dashboard
//! cannot drift apart.

use crate::api::{ApiError, ForumApi};
use crate::model::{Actor, Report, ReportId, ReportKind, ReportStats};
use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ModerationError {
    /// Non-admin actors never get this far in the UI; the engine still
    /// refuses before any request is made.
    #[error("only administrators may resolve reports")]
    NotPermitted,

    #[error("report {0} is already being handled")]
    Busy(ReportId),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Snapshot of the moderator's queue: unhandled reports per kind plus the
/// authoritative counters.
#[derive(Debug, Clone, Default)]
pub struct ModerationQueue {
    pub post_reports: Vec<Report>,
    pub reply_reports: Vec<Report>,
    pub stats: ReportStats,
}

impl ModerationQueue {
    /// Audit view: every fetched report, including ones whose subject has
    /// been soft-deleted. Deleted content stays reviewable here even though
    /// public listings exclude it.
    pub fn audit_view(&self) -> impl Iterator<Item = &Report> {
        self.post_reports.iter().chain(self.reply_reports.iter())
    }

    pub fn unhandled_total(&self) -> u32 {
        self.stats.total_unhandled
    }
}

/// The moderator's desk: owns the queue and drives the handle workflow.
pub struct ModerationDesk<A: ForumApi> {
    api: Arc<A>,
    actor: Actor,
    queue: Mutex<ModerationQueue>,
    in_flight: DashMap<(ReportKind, ReportId), ()>,
}

impl<A: ForumApi> ModerationDesk<A> {
    pub fn new(api: Arc<A>, actor: Actor) -> Self {
        Self {
            api,
            actor,
            queue: Mutex::new(ModerationQueue::default()),
            in_flight: DashMap::new(),
        }
    }

    pub fn queue(&self) -> ModerationQueue {
        self.queue.lock().expect("queue lock poisoned").clone()
    }

    /// Re-fetch both unhandled queues and the authoritative counters.
    pub async fn refresh(&self) -> Result<(), ModerationError> {
        if !self.actor.can_moderate() {
            return Err(ModerationError::NotPermitted);
        }
        let post_reports = self.api.unhandled_reports(ReportKind::Post).await?;
        let reply_reports = self.api.unhandled_reports(ReportKind::Reply).await?;
        let stats = self.api.moderation_stats().await?;
        debug!(
            posts = post_reports.len(),
            replies = reply_reports.len(),
            total_unhandled = stats.total_unhandled,
            "moderation queue refreshed"
        );
        *self.queue.lock().expect("queue lock poisoned") = ModerationQueue {
            post_reports,
            reply_reports,
            stats,
        };
        Ok(())
    }

    /// Resolve a report. Always marks it handled; with `delete_content` the
    /// reported thread/reply is soft-deleted in the same request — one
    /// atomic unit from this engine's perspective.
    ///
    /// On success the queue and counters are re-fetched; nothing is
    /// decremented locally.
    pub async fn handle(
        &self,
        kind: ReportKind,
        id: ReportId,
        delete_content: bool,
    ) -> Result<(), ModerationError> {
        if !self.actor.can_moderate() {
            return Err(ModerationError::NotPermitted);
        }
        let key = (kind, id);
        if self.in_flight.insert(key, ()).is_some() {
            return Err(ModerationError::Busy(id));
        }
        let result = self.api.handle_report(kind, id, delete_content).await;
        self.in_flight.remove(&key);
        result?;

        // handled is monotonic: flip it locally so the record never shows
        // as open again, then let the authoritative refresh drop it.
        {
            let mut queue = self.queue.lock().expect("queue lock poisoned");
            let reports = match kind {
                ReportKind::Post => &mut queue.post_reports,
                ReportKind::Reply => &mut queue.reply_reports,
            };
            if let Some(report) = reports.iter_mut().find(|r| r.id == id) {
                report.mark_handled();
            }
        }
        self.refresh().await
    }
}
