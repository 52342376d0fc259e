//! Shared in-memory collaborator double.
//!
//! Serves the whole `ForumApi` surface from mutexed vectors with enough
//! server semantics to exercise the engine end to end: soft-deleted content
//! is excluded from public listings, thread reactions are exclusive for the
//! test actor, reply votes are plain counters, and reports and notifications
//! behave like their backend counterparts. Call counters let tests assert
//! that nothing (or exactly one thing) went on the wire.

#![allow(dead_code)]

use agora::api::{ApiError, ApiResult, ForumApi, ThreadQuery};
use agora::model::{
    ActorId, Author, NewThread, Notification, NotificationId, ReactionKind, Reply, ReplyId,
    ReplyPayload, Report, ReportId, ReportKind, ReportStats, ReportedReply, ReportedThread, Role,
    ThreadDetail, ThreadId, ThreadReactionResponse, ThreadSummary, UserRef, Vote, VoteCounts,
};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn ts(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 2, 9, minute % 60, 0).unwrap()
}

pub fn author(id: i64, role: Role) -> Author {
    Author {
        id: ActorId(id),
        first_name: format!("User{id}"),
        last_name: "Test".into(),
        role,
        academic_title: None,
        university: None,
    }
}

pub fn thread(id: i64, title: &str, topic: &str, author_id: i64, minute: u32) -> ThreadDetail {
    ThreadDetail {
        thread: ThreadSummary {
            id: ThreadId(id),
            title: title.into(),
            summary: format!("{title} summary"),
            body: format!("{title} body"),
            topic: topic.into(),
            university: None,
            created_at: ts(minute),
            author: author(author_id, Role::Student),
            reactions: HashMap::new(),
            user_reaction: None,
            replies_count: 0,
            books: Vec::new(),
            is_deleted: false,
        },
        replies: Vec::new(),
    }
}

pub fn reply_node(id: i64, body: &str, author_id: i64, minute: u32) -> ReplyPayload {
    ReplyPayload {
        id: ReplyId(id),
        body: body.into(),
        created_at: ts(minute),
        author: author(author_id, Role::Student),
        parent_id: None,
        up: 0,
        down: 0,
        flagged: false,
        children: Vec::new(),
    }
}

pub fn notification(id: i64, kind: &str, text: &str, read: bool) -> Notification {
    Notification {
        id: NotificationId(id),
        kind: kind.into(),
        text: text.into(),
        url: Some(format!("/forum/{id}")),
        created_at: ts(40),
        read,
        post_id: None,
        reply_id: None,
        review_id: None,
    }
}

fn user_ref(a: &Author) -> UserRef {
    UserRef {
        id: a.id,
        email: None,
        first_name: a.first_name.clone(),
        last_name: a.last_name.clone(),
    }
}

/// Per-endpoint request counters.
#[derive(Default)]
pub struct Calls {
    pub list: AtomicUsize,
    pub detail: AtomicUsize,
    pub create: AtomicUsize,
    pub reply: AtomicUsize,
    pub react: AtomicUsize,
    pub report: AtomicUsize,
    pub handle: AtomicUsize,
    pub stats: AtomicUsize,
    pub notifications: AtomicUsize,
    pub mark_read: AtomicUsize,
    pub delete: AtomicUsize,
    pub unread: AtomicUsize,
}

impl Calls {
    pub fn total(&self) -> usize {
        self.list.load(Ordering::SeqCst)
            + self.detail.load(Ordering::SeqCst)
            + self.create.load(Ordering::SeqCst)
            + self.reply.load(Ordering::SeqCst)
            + self.react.load(Ordering::SeqCst)
            + self.report.load(Ordering::SeqCst)
            + self.handle.load(Ordering::SeqCst)
            + self.stats.load(Ordering::SeqCst)
            + self.notifications.load(Ordering::SeqCst)
            + self.mark_read.load(Ordering::SeqCst)
            + self.delete.load(Ordering::SeqCst)
            + self.unread.load(Ordering::SeqCst)
    }
}

pub struct FakeForumApi {
    pub threads: Mutex<Vec<ThreadDetail>>,
    pub reports: Mutex<Vec<Report>>,
    pub notifications: Mutex<Vec<Notification>>,
    pub calls: Calls,
    /// Delay applied to the next listing call, then cleared.
    pub next_list_delay: Mutex<Option<Duration>>,
    /// When set, the next thread-reaction call fails with this status.
    pub fail_next_react: Mutex<Option<u16>>,
    pub last_query: Mutex<Option<ThreadQuery>>,
    next_id: AtomicI64,
}

impl FakeForumApi {
    pub fn new() -> Self {
        Self {
            threads: Mutex::new(Vec::new()),
            reports: Mutex::new(Vec::new()),
            notifications: Mutex::new(Vec::new()),
            calls: Calls::default(),
            next_list_delay: Mutex::new(None),
            fail_next_react: Mutex::new(None),
            last_query: Mutex::new(None),
            next_id: AtomicI64::new(1000),
        }
    }

    pub fn seed_thread(&self, detail: ThreadDetail) {
        self.threads.lock().unwrap().push(detail);
    }

    pub fn seed_notification(&self, n: Notification) {
        self.notifications.lock().unwrap().push(n);
    }

    pub fn seed_post_report(&self, id: i64, thread_id: i64) {
        let report = {
            let threads = self.threads.lock().unwrap();
            let detail = threads
                .iter()
                .find(|t| t.thread.id == ThreadId(thread_id))
                .expect("seed_post_report: unknown thread");
            Report {
                id: ReportId(id),
                reason: Some("spam".into()),
                created_at: ts(30),
                handled: false,
                reporter: user_ref(&author(99, Role::Student)),
                post: Some(ReportedThread {
                    id: detail.thread.id,
                    title: detail.thread.title.clone(),
                    summary: detail.thread.summary.clone(),
                    body: detail.thread.body.clone(),
                    topic: detail.thread.topic.clone(),
                    created_at: detail.thread.created_at,
                    is_deleted: detail.thread.is_deleted,
                    author: user_ref(&detail.thread.author),
                }),
                reply: None,
            }
        };
        self.reports.lock().unwrap().push(report);
    }

    fn fresh_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn find_reply(nodes: &mut Vec<ReplyPayload>, id: ReplyId) -> Option<&mut ReplyPayload> {
        for node in nodes.iter_mut() {
            if node.id == id {
                return Some(node);
            }
            if let Some(found) = Self::find_reply(&mut node.children, id) {
                return Some(found);
            }
        }
        None
    }
}

#[async_trait]
impl ForumApi for FakeForumApi {
    async fn list_threads(&self, query: &ThreadQuery) -> ApiResult<Vec<ThreadSummary>> {
        self.calls.list.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some(query.clone());
        let delay = self.next_list_delay.lock().unwrap().take();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let threads = self.threads.lock().unwrap();
        let mut matched: Vec<ThreadSummary> = threads
            .iter()
            .map(|t| &t.thread)
            .filter(|t| !t.is_deleted)
            .filter(|t| {
                query
                    .q
                    .as_deref()
                    .map_or(true, |q| t.title.to_lowercase().contains(&q.to_lowercase()))
            })
            .filter(|t| query.topic.as_deref().map_or(true, |topic| t.topic == topic))
            .filter(|t| {
                query
                    .university
                    .as_deref()
                    .map_or(true, |uni| t.university.as_deref() == Some(uni))
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(matched
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }

    async fn fetch_thread(&self, id: ThreadId) -> ApiResult<ThreadDetail> {
        self.calls.detail.fetch_add(1, Ordering::SeqCst);
        self.threads
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.thread.id == id && !t.thread.is_deleted)
            .cloned()
            .ok_or(ApiError::NotFound)
    }

    async fn create_thread(&self, request: &NewThread) -> ApiResult<ThreadId> {
        self.calls.create.fetch_add(1, Ordering::SeqCst);
        let id = ThreadId(self.fresh_id());
        let mut detail = thread(id.0, &request.title, &request.topic, 1, 50);
        detail.thread.summary = request.summary.clone();
        detail.thread.body = request.body.clone();
        detail.thread.university = request.university.clone();
        self.threads.lock().unwrap().push(detail);
        Ok(id)
    }

    async fn delete_thread(&self, id: ThreadId) -> ApiResult<()> {
        let mut threads = self.threads.lock().unwrap();
        match threads.iter_mut().find(|t| t.thread.id == id) {
            Some(detail) => {
                detail.thread.is_deleted = true;
                Ok(())
            }
            None => Err(ApiError::NotFound),
        }
    }

    async fn add_reply(
        &self,
        thread_id: ThreadId,
        body: &str,
        parent: Option<ReplyId>,
    ) -> ApiResult<Reply> {
        self.calls.reply.fetch_add(1, Ordering::SeqCst);
        let id = self.fresh_id();
        let mut threads = self.threads.lock().unwrap();
        let detail = threads
            .iter_mut()
            .find(|t| t.thread.id == thread_id && !t.thread.is_deleted)
            .ok_or(ApiError::NotFound)?;
        let mut payload = reply_node(id, body, 1, 55);
        payload.parent_id = parent;
        let created = Reply {
            id: payload.id,
            thread_id,
            body: payload.body.clone(),
            created_at: payload.created_at,
            author: payload.author.clone(),
            parent_id: parent,
            up: 0,
            down: 0,
            flagged: false,
        };
        match parent.and_then(|p| Self::find_reply(&mut detail.replies, p)) {
            Some(parent_node) => parent_node.children.push(payload),
            None => detail.replies.push(payload),
        }
        detail.thread.replies_count += 1;
        Ok(created)
    }

    async fn delete_reply(&self, id: ReplyId) -> ApiResult<()> {
        fn remove(nodes: &mut Vec<ReplyPayload>, id: ReplyId) -> bool {
            if let Some(pos) = nodes.iter().position(|n| n.id == id) {
                nodes.remove(pos);
                return true;
            }
            nodes.iter_mut().any(|n| remove(&mut n.children, id))
        }
        let mut threads = self.threads.lock().unwrap();
        for detail in threads.iter_mut() {
            if remove(&mut detail.replies, id) {
                detail.thread.replies_count = detail.thread.replies_count.saturating_sub(1);
                return Ok(());
            }
        }
        Err(ApiError::NotFound)
    }

    async fn react_to_thread(
        &self,
        id: ThreadId,
        kind: Option<ReactionKind>,
    ) -> ApiResult<ThreadReactionResponse> {
        self.calls.react.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = self.fail_next_react.lock().unwrap().take() {
            return Err(ApiError::Server(status));
        }
        let mut threads = self.threads.lock().unwrap();
        let detail = threads
            .iter_mut()
            .find(|t| t.thread.id == id && !t.thread.is_deleted)
            .ok_or(ApiError::NotFound)?;
        let summary = &mut detail.thread;
        if let Some(previous) = summary.user_reaction {
            if let Some(count) = summary.reactions.get_mut(&previous) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    summary.reactions.remove(&previous);
                }
            }
        }
        if let Some(kind) = kind {
            *summary.reactions.entry(kind).or_insert(0) += 1;
        }
        summary.user_reaction = kind;
        Ok(ThreadReactionResponse {
            counts: summary.reactions.clone(),
            user_reaction: summary.user_reaction,
        })
    }

    async fn react_to_reply(&self, id: ReplyId, vote: Vote) -> ApiResult<VoteCounts> {
        self.calls.react.fetch_add(1, Ordering::SeqCst);
        let mut threads = self.threads.lock().unwrap();
        for detail in threads.iter_mut() {
            if let Some(node) = Self::find_reply(&mut detail.replies, id) {
                match vote {
                    Vote::Up => node.up += 1,
                    Vote::Down => node.down += 1,
                }
                return Ok(VoteCounts {
                    up: node.up,
                    down: node.down,
                });
            }
        }
        Err(ApiError::NotFound)
    }

    async fn report_thread(&self, id: ThreadId, _reason: Option<&str>) -> ApiResult<()> {
        self.calls.report.fetch_add(1, Ordering::SeqCst);
        let exists = self
            .threads
            .lock()
            .unwrap()
            .iter()
            .any(|t| t.thread.id == id && !t.thread.is_deleted);
        if !exists {
            return Err(ApiError::NotFound);
        }
        let report_id = self.fresh_id();
        self.seed_post_report(report_id, id.0);
        Ok(())
    }

    async fn report_reply(&self, id: ReplyId, reason: Option<&str>) -> ApiResult<()> {
        self.calls.report.fetch_add(1, Ordering::SeqCst);
        let report_id = self.fresh_id();
        let report = {
            let mut threads = self.threads.lock().unwrap();
            let mut found = None;
            for detail in threads.iter_mut() {
                let title = detail.thread.title.clone();
                let post_id = detail.thread.id;
                if let Some(node) = Self::find_reply(&mut detail.replies, id) {
                    found = Some(Report {
                        id: ReportId(report_id),
                        reason: reason.map(String::from),
                        created_at: ts(31),
                        handled: false,
                        reporter: user_ref(&author(99, Role::Student)),
                        post: None,
                        reply: Some(ReportedReply {
                            id: node.id,
                            body: node.body.clone(),
                            created_at: node.created_at,
                            is_deleted: false,
                            post_id,
                            post_title: title,
                            author: user_ref(&node.author),
                        }),
                    });
                    break;
                }
            }
            found.ok_or(ApiError::NotFound)?
        };
        self.reports.lock().unwrap().push(report);
        Ok(())
    }

    async fn unhandled_reports(&self, kind: ReportKind) -> ApiResult<Vec<Report>> {
        Ok(self
            .reports
            .lock()
            .unwrap()
            .iter()
            .filter(|r| !r.handled && r.kind() == Some(kind))
            .cloned()
            .collect())
    }

    async fn handle_report(
        &self,
        kind: ReportKind,
        id: ReportId,
        delete_content: bool,
    ) -> ApiResult<()> {
        self.calls.handle.fetch_add(1, Ordering::SeqCst);
        let deleted_thread = {
            let mut reports = self.reports.lock().unwrap();
            let report = reports
                .iter_mut()
                .find(|r| r.id == id && r.kind() == Some(kind))
                .ok_or(ApiError::NotFound)?;
            report.mark_handled();
            if !delete_content {
                None
            } else if let Some(post) = report.post.as_mut() {
                post.is_deleted = true;
                Some(post.id)
            } else {
                if let Some(reply) = report.reply.as_mut() {
                    reply.is_deleted = true;
                }
                None
            }
        };
        // every report echoing the deleted subject reflects the new state
        if let Some(thread_id) = deleted_thread {
            for other in self.reports.lock().unwrap().iter_mut() {
                if let Some(post) = other.post.as_mut() {
                    if post.id == thread_id {
                        post.is_deleted = true;
                    }
                }
            }
            let mut threads = self.threads.lock().unwrap();
            if let Some(detail) = threads.iter_mut().find(|t| t.thread.id == thread_id) {
                detail.thread.is_deleted = true;
            }
        }
        Ok(())
    }

    async fn moderation_stats(&self) -> ApiResult<ReportStats> {
        self.calls.stats.fetch_add(1, Ordering::SeqCst);
        let reports = self.reports.lock().unwrap();
        let unhandled_posts = reports
            .iter()
            .filter(|r| !r.handled && r.kind() == Some(ReportKind::Post))
            .count() as u32;
        let unhandled_replies = reports
            .iter()
            .filter(|r| !r.handled && r.kind() == Some(ReportKind::Reply))
            .count() as u32;
        Ok(ReportStats {
            unhandled_posts,
            unhandled_replies,
            total_unhandled: unhandled_posts + unhandled_replies,
        })
    }

    async fn notifications(&self) -> ApiResult<Vec<Notification>> {
        self.calls.notifications.fetch_add(1, Ordering::SeqCst);
        Ok(self.notifications.lock().unwrap().clone())
    }

    async fn mark_notification_read(&self, id: NotificationId) -> ApiResult<()> {
        self.calls.mark_read.fetch_add(1, Ordering::SeqCst);
        let mut notifications = self.notifications.lock().unwrap();
        match notifications.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.read = true;
                Ok(())
            }
            None => Err(ApiError::NotFound),
        }
    }

    async fn delete_notification(&self, id: NotificationId) -> ApiResult<()> {
        self.calls.delete.fetch_add(1, Ordering::SeqCst);
        let mut notifications = self.notifications.lock().unwrap();
        let before = notifications.len();
        notifications.retain(|n| n.id != id);
        if notifications.len() == before {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    async fn unread_count(&self) -> ApiResult<u32> {
        self.calls.unread.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| !n.read)
            .count() as u32)
    }
}
