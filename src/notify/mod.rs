//! Notification Fan-out Adapter
//!
//! Notifications are server-generated side effects of reactions, replies,
//! and reports; there is no push channel. Two independent pollers keep two
//! separate read models warm — the list and the unread count — on their own
//! intervals. They may momentarily disagree; nothing here assumes they are
//! consistent at a given instant.

mod poller;

pub use poller::{CancellationToken, Poller};

use crate::api::{ApiResult, ForumApi};
use crate::model::{Notification, NotificationId};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

/// How often the notification list is re-fetched.
pub const LIST_POLL_INTERVAL: Duration = Duration::from_secs(60);
/// How often the unread counter is re-fetched.
pub const UNREAD_POLL_INTERVAL: Duration = Duration::from_secs(45);

/// Rendering bucket derived from a notification's open `type` tag.
///
/// Classification is a pure function with a default bucket: a tag this
/// engine has never seen must never break rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCategory {
    Reaction,
    Reply,
    Report,
    Review,
    Other,
}

impl NotificationCategory {
    pub fn classify(kind: &str) -> Self {
        match kind {
            "reaction_post" | "reaction_review" => NotificationCategory::Reaction,
            "reply_post" | "reply_review" => NotificationCategory::Reply,
            "report_post" | "report_review" => NotificationCategory::Report,
            "new_review" => NotificationCategory::Review,
            _ => NotificationCategory::Other,
        }
    }
}

/// Owns the notified actor's notification state.
pub struct NotificationCenter<A: ForumApi> {
    api: Arc<A>,
    items: Mutex<Vec<Notification>>,
    unread: AtomicU32,
}

/// Handles for the two poll loops. Each owns separate lifecycle state, so
/// a failure or stop of one never silently halts the other.
pub struct NotificationPollers {
    pub list: Poller,
    pub unread: Poller,
}

impl NotificationPollers {
    pub fn stop(self) {
        self.list.stop();
        self.unread.stop();
    }
}

impl<A: ForumApi + 'static> NotificationCenter<A> {
    pub fn new(api: Arc<A>) -> Arc<Self> {
        Arc::new(Self {
            api,
            items: Mutex::new(Vec::new()),
            unread: AtomicU32::new(0),
        })
    }

    pub fn items(&self) -> Vec<Notification> {
        self.items.lock().expect("notification lock poisoned").clone()
    }

    pub fn unread_count(&self) -> u32 {
        self.unread.load(Ordering::Relaxed)
    }

    /// Re-fetch the full list.
    pub async fn refresh(&self) -> ApiResult<()> {
        let fetched = self.api.notifications().await?;
        debug!(count = fetched.len(), "notification list refreshed");
        *self.items.lock().expect("notification lock poisoned") = fetched;
        Ok(())
    }

    /// Re-fetch the unread counter — a separate read model from the list.
    pub async fn refresh_unread(&self) -> ApiResult<()> {
        let count = self.api.unread_count().await?;
        self.unread.store(count, Ordering::Relaxed);
        Ok(())
    }

    /// Mark a notification read. Idempotent: a second call observes the
    /// local `read` bit and does nothing.
    pub async fn mark_read(&self, id: NotificationId) -> ApiResult<()> {
        let already_read = self
            .items
            .lock()
            .expect("notification lock poisoned")
            .iter()
            .find(|n| n.id == id)
            .map(|n| n.read)
            .unwrap_or(false);
        if already_read {
            return Ok(());
        }
        self.api.mark_notification_read(id).await?;
        let mut items = self.items.lock().expect("notification lock poisoned");
        if let Some(item) = items.iter_mut().find(|n| n.id == id) {
            item.read = true;
        }
        Ok(())
    }

    /// Delete a notification. Permanent, and independent of whatever the
    /// notification pointed at.
    pub async fn delete(&self, id: NotificationId) -> ApiResult<()> {
        self.api.delete_notification(id).await?;
        self.items
            .lock()
            .expect("notification lock poisoned")
            .retain(|n| n.id != id);
        Ok(())
    }

    /// Follow a notification: marks it read and hands back its deep-link
    /// route as one compound gesture. The route is opaque; navigation is
    /// the caller's concern.
    pub async fn open(&self, id: NotificationId) -> ApiResult<Option<String>> {
        self.mark_read(id).await?;
        Ok(self
            .items
            .lock()
            .expect("notification lock poisoned")
            .iter()
            .find(|n| n.id == id)
            .and_then(|n| n.url.clone()))
    }

    /// Start both poll loops on their own intervals.
    pub fn start_polling(self: &Arc<Self>) -> NotificationPollers {
        let list_center = Arc::clone(self);
        let list = Poller::spawn("notification-list", LIST_POLL_INTERVAL, move || {
            let center = Arc::clone(&list_center);
            async move { center.refresh().await }
        });

        let unread_center = Arc::clone(self);
        let unread = Poller::spawn("unread-count", UNREAD_POLL_INTERVAL, move || {
            let center = Arc::clone(&unread_center);
            async move { center.refresh_unread().await }
        });

        NotificationPollers { list, unread }
    }
}
