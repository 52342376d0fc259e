//! Discussion Page Controller
//!
//! Owns filter and pagination state, composes the reply forest, the
//! reaction aggregators, and the composer, and drives the pull-refresh
//! cycle. Mutations follow one policy: add/remove-class changes (create,
//! delete, reply, report) re-query the current page and open thread in
//! full; count-only changes (reactions) patch local state from the
//! mutation's authoritative response without a refetch.
//!
//! Every collaborator call suspends only its own control: reactions are
//! gated by their pending phase, the remaining mutations by a per-subject
//! in-flight gate. A superseded list fetch — overtaken by a newer filter or
//! page change — is discarded via a generation guard rather than applied.

mod composer;

pub use composer::{ComposeError, ThreadDraft};

use crate::api::{ApiError, ForumApi, ThreadQuery};
use crate::model::{
    Actor, ActorId, BookRef, ReactionKind, ReplyId, ThreadId, ThreadSummary, Vote,
};
use crate::reactions::{ReactionError, ReplyVotes, ThreadReactions};
use crate::tree::{build_forest, flatten_payload, CollapseSet, Forest};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::debug;

/// Fixed page size of the thread listing.
pub const PAGE_SIZE: usize = 5;

#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Compose(#[from] ComposeError),

    #[error("this action is not permitted")]
    NotPermitted,

    #[error("another request for this subject is in flight")]
    Busy,

    #[error("reply body is required")]
    EmptyReply,

    #[error("subject is not part of the current view")]
    UnknownSubject,
}

impl From<ReactionError> for PageError {
    fn from(_: ReactionError) -> Self {
        PageError::Busy
    }
}

/// Filter state over the thread listing. Changing any field resets the
/// page to 1.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    pub query: String,
    pub topic: Option<String>,
    pub university: Option<String>,
}

impl Filters {
    fn to_query(&self, offset: usize, limit: usize) -> ThreadQuery {
        ThreadQuery {
            q: if self.query.trim().is_empty() {
                None
            } else {
                Some(self.query.trim().to_string())
            },
            topic: self.topic.clone(),
            university: self.university.clone(),
            offset,
            limit,
        }
    }
}

/// A listed thread with its reaction aggregator.
#[derive(Debug, Clone)]
pub struct ThreadCard {
    pub thread: ThreadSummary,
    pub reactions: ThreadReactions,
}

impl ThreadCard {
    fn from_summary(thread: ThreadSummary) -> Self {
        let reactions =
            ThreadReactions::from_state(thread.reactions.clone(), thread.user_reaction);
        Self { thread, reactions }
    }
}

/// The open thread: detail, lazily built reply forest, per-reply vote
/// state, and local collapse state.
pub struct ThreadPane {
    pub thread: ThreadSummary,
    pub reactions: ThreadReactions,
    pub forest: Forest,
    pub votes: HashMap<ReplyId, ReplyVotes>,
    pub collapse: CollapseSet,
}

/// Mutating controls; each is disabled independently per subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Op {
    Reply,
    Delete,
    Report,
}

/// A mutable subject on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subject {
    Thread(ThreadId),
    Reply(ReplyId),
}

#[derive(Default)]
struct PageState {
    filters: Filters,
    page: usize,
    has_more: bool,
    cards: Vec<ThreadCard>,
    open: Option<ThreadPane>,
    seed: Option<Vec<BookRef>>,
}

struct BusyGuard<'a> {
    map: &'a DashMap<(Op, Subject), ()>,
    key: (Op, Subject),
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.map.remove(&self.key);
    }
}

/// The page controller. All methods take `&self`; state lives behind a
/// mutex that is never held across a collaborator call.
pub struct DiscussionPage<A: ForumApi> {
    api: Arc<A>,
    actor: Actor,
    state: Mutex<PageState>,
    list_generation: AtomicU64,
    detail_generation: AtomicU64,
    busy: DashMap<(Op, Subject), ()>,
}

impl<A: ForumApi> DiscussionPage<A> {
    pub fn new(api: Arc<A>, actor: Actor) -> Self {
        Self {
            api,
            actor,
            state: Mutex::new(PageState {
                page: 1,
                ..PageState::default()
            }),
            list_generation: AtomicU64::new(0),
            detail_generation: AtomicU64::new(0),
            busy: DashMap::new(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PageState> {
        self.state.lock().expect("page state lock poisoned")
    }

    // --- filters and pagination -------------------------------------------

    pub fn filters(&self) -> Filters {
        self.lock().filters.clone()
    }

    pub fn page(&self) -> usize {
        self.lock().page
    }

    pub fn has_more(&self) -> bool {
        self.lock().has_more
    }

    pub fn set_query(&self, query: impl Into<String>) {
        let mut state = self.lock();
        state.filters.query = query.into();
        state.page = 1;
    }

    pub fn set_topic(&self, topic: Option<String>) {
        let mut state = self.lock();
        state.filters.topic = topic;
        state.page = 1;
    }

    pub fn set_university(&self, university: Option<String>) {
        let mut state = self.lock();
        state.filters.university = university;
        state.page = 1;
    }

    pub fn next_page(&self) {
        let mut state = self.lock();
        if state.has_more {
            state.page += 1;
        }
    }

    pub fn prev_page(&self) {
        let mut state = self.lock();
        if state.page > 1 {
            state.page -= 1;
        }
    }

    // --- seeded composer ---------------------------------------------------

    /// Carry pre-selected reference items into the composer (the "discuss
    /// these books" entry point, normally arriving via query parameters).
    pub fn set_seed(&self, books: Vec<BookRef>) {
        self.lock().seed = Some(books);
    }

    pub fn seed(&self) -> Option<Vec<BookRef>> {
        self.lock().seed.clone()
    }

    /// A fresh draft; seeded when pre-selected items are present.
    pub fn compose(&self) -> ThreadDraft {
        match self.lock().seed.as_deref() {
            Some(books) => ThreadDraft::seeded_with(books),
            None => ThreadDraft::new(),
        }
    }

    // --- reads -------------------------------------------------------------

    pub fn cards(&self) -> Vec<ThreadCard> {
        self.lock().cards.clone()
    }

    /// Run a closure over the open thread pane, if any.
    pub fn with_open<R>(&self, f: impl FnOnce(&ThreadPane) -> R) -> Option<R> {
        self.lock().open.as_ref().map(f)
    }

    pub fn toggle_replies(&self, id: ReplyId) {
        if let Some(pane) = self.lock().open.as_mut() {
            pane.collapse.toggle(id);
        }
    }

    // --- fetching ----------------------------------------------------------

    /// Fetch the current page under the current filters. A response that
    /// comes back after a newer load started is discarded.
    pub async fn load(&self) -> Result<(), PageError> {
        let generation = self.list_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let query = {
            let state = self.lock();
            state
                .filters
                .to_query((state.page - 1) * PAGE_SIZE, PAGE_SIZE)
        };
        let result = self.api.list_threads(&query).await;
        if self.list_generation.load(Ordering::SeqCst) != generation {
            debug!("discarding superseded thread page response");
            return Ok(());
        }
        let threads = result?;
        let mut state = self.lock();
        state.has_more = threads.len() == PAGE_SIZE;
        state.cards = threads.into_iter().map(ThreadCard::from_summary).collect();
        Ok(())
    }

    /// Lazily fetch the detail and build its reply forest.
    pub async fn open_thread(&self, id: ThreadId) -> Result<(), PageError> {
        let generation = self.detail_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.api.fetch_thread(id).await;
        if self.detail_generation.load(Ordering::SeqCst) != generation {
            debug!(thread = %id, "discarding superseded thread detail response");
            return Ok(());
        }
        let detail = result?;
        let flat = flatten_payload(id, &detail.replies);
        let votes = flat
            .iter()
            .map(|r| (r.id, ReplyVotes::from_counts(r.up, r.down)))
            .collect();
        let forest = build_forest(flat);
        let reactions = ThreadReactions::from_state(
            detail.thread.reactions.clone(),
            detail.thread.user_reaction,
        );
        self.lock().open = Some(ThreadPane {
            thread: detail.thread,
            reactions,
            forest,
            votes,
            collapse: CollapseSet::new(),
        });
        Ok(())
    }

    pub fn close_thread(&self) {
        self.lock().open = None;
    }

    async fn reload_open(&self) -> Result<(), PageError> {
        let open_id = self.lock().open.as_ref().map(|p| p.thread.id);
        match open_id {
            Some(id) => self.open_thread(id).await,
            None => Ok(()),
        }
    }

    /// Full re-query after an add/remove-class mutation.
    async fn refresh_all(&self) -> Result<(), PageError> {
        self.reload_open().await?;
        self.load().await
    }

    /// Stale-state errors trigger a best-effort refresh before the error
    /// is surfaced, so entries that no longer exist disappear.
    async fn refresh_if_stale(&self, error: &ApiError) {
        if error.needs_refresh() {
            if let Err(refresh_error) = self.refresh_all().await {
                debug!(%refresh_error, "refresh after stale-state error failed");
            }
        }
    }

    // --- reactions (count-only mutations: patch, no refetch) ---------------

    /// Apply a reaction gesture to a thread. Optimistic, reconciled with
    /// the authoritative response, rolled back on failure.
    pub async fn react_to_thread(
        &self,
        id: ThreadId,
        kind: ReactionKind,
    ) -> Result<(), PageError> {
        if !self.actor.can_react() {
            return Err(PageError::NotPermitted);
        }
        let wire = {
            let mut state = self.lock();
            let PageState { cards, open, .. } = &mut *state;
            let card = cards.iter_mut().find(|c| c.thread.id == id);
            let pane = open.as_mut().filter(|p| p.thread.id == id);
            if card.is_none() && pane.is_none() {
                return Err(PageError::UnknownSubject);
            }
            let pending = card.as_ref().map_or(false, |c| c.reactions.is_pending())
                || pane.as_ref().map_or(false, |p| p.reactions.is_pending());
            if pending {
                return Err(PageError::Busy);
            }
            let mut wire = None;
            if let Some(card) = card {
                wire = Some(card.reactions.begin(kind)?);
            }
            if let Some(pane) = pane {
                wire = Some(pane.reactions.begin(kind)?);
            }
            wire.ok_or(PageError::UnknownSubject)?
        };

        match self.api.react_to_thread(id, wire).await {
            Ok(response) => {
                let mut state = self.lock();
                let PageState { cards, open, .. } = &mut *state;
                if let Some(card) = cards.iter_mut().find(|c| c.thread.id == id) {
                    card.reactions
                        .confirm(response.counts.clone(), response.user_reaction);
                    card.thread.reactions = response.counts.clone();
                    card.thread.user_reaction = response.user_reaction;
                }
                if let Some(pane) = open.as_mut().filter(|p| p.thread.id == id) {
                    pane.reactions
                        .confirm(response.counts.clone(), response.user_reaction);
                    pane.thread.reactions = response.counts;
                    pane.thread.user_reaction = response.user_reaction;
                }
                Ok(())
            }
            Err(error) => {
                {
                    let mut state = self.lock();
                    let PageState { cards, open, .. } = &mut *state;
                    if let Some(card) = cards.iter_mut().find(|c| c.thread.id == id) {
                        card.reactions.rollback();
                    }
                    if let Some(pane) = open.as_mut().filter(|p| p.thread.id == id) {
                        pane.reactions.rollback();
                    }
                }
                self.refresh_if_stale(&error).await;
                Err(error.into())
            }
        }
    }

    /// Vote on a reply in the open thread.
    pub async fn react_to_reply(&self, id: ReplyId, vote: Vote) -> Result<(), PageError> {
        if !self.actor.can_react() {
            return Err(PageError::NotPermitted);
        }
        let wire = {
            let mut state = self.lock();
            let votes = state
                .open
                .as_mut()
                .and_then(|p| p.votes.get_mut(&id))
                .ok_or(PageError::UnknownSubject)?;
            votes.begin(vote)?
        };

        match self.api.react_to_reply(id, wire).await {
            Ok(counts) => {
                let mut state = self.lock();
                if let Some(votes) = state.open.as_mut().and_then(|p| p.votes.get_mut(&id)) {
                    votes.confirm(counts);
                }
                Ok(())
            }
            Err(error) => {
                {
                    let mut state = self.lock();
                    if let Some(votes) = state.open.as_mut().and_then(|p| p.votes.get_mut(&id)) {
                        votes.rollback();
                    }
                }
                self.refresh_if_stale(&error).await;
                Err(error.into())
            }
        }
    }

    // --- add/remove-class mutations (full re-query) ------------------------

    /// Submit a composed thread. On success any seeded book state is
    /// cleared so a reload cannot resubmit, and the listing is re-queried.
    pub async fn submit_thread(&self, draft: &ThreadDraft) -> Result<ThreadId, PageError> {
        if !self.actor.can_reply() {
            return Err(PageError::NotPermitted);
        }
        let id = draft.submit(self.api.as_ref()).await?;
        self.lock().seed = None;
        self.load().await?;
        Ok(id)
    }

    pub async fn add_reply(
        &self,
        thread: ThreadId,
        body: &str,
        parent: Option<ReplyId>,
    ) -> Result<(), PageError> {
        if !self.actor.can_reply() {
            return Err(PageError::NotPermitted);
        }
        let body = body.trim();
        if body.is_empty() {
            return Err(PageError::EmptyReply);
        }
        let _guard = self.acquire(Op::Reply, Subject::Thread(thread))?;
        match self.api.add_reply(thread, body, parent).await {
            Ok(_) => self.refresh_all().await,
            Err(error) => {
                self.refresh_if_stale(&error).await;
                Err(error.into())
            }
        }
    }

    pub async fn delete_thread(&self, id: ThreadId) -> Result<(), PageError> {
        let author = self
            .thread_author(id)
            .ok_or(PageError::UnknownSubject)?;
        if !self.actor.can_delete(author) {
            return Err(PageError::NotPermitted);
        }
        let _guard = self.acquire(Op::Delete, Subject::Thread(id))?;
        match self.api.delete_thread(id).await {
            Ok(()) => {
                let mut state = self.lock();
                if state.open.as_ref().map(|p| p.thread.id) == Some(id) {
                    state.open = None;
                }
                drop(state);
                self.load().await
            }
            Err(error) => {
                self.refresh_if_stale(&error).await;
                Err(error.into())
            }
        }
    }

    pub async fn delete_reply(&self, id: ReplyId) -> Result<(), PageError> {
        let author = self
            .reply_author(id)
            .ok_or(PageError::UnknownSubject)?;
        if !self.actor.can_delete(author) {
            return Err(PageError::NotPermitted);
        }
        let _guard = self.acquire(Op::Delete, Subject::Reply(id))?;
        match self.api.delete_reply(id).await {
            Ok(()) => self.refresh_all().await,
            Err(error) => {
                self.refresh_if_stale(&error).await;
                Err(error.into())
            }
        }
    }

    pub async fn report_thread(
        &self,
        id: ThreadId,
        reason: Option<&str>,
    ) -> Result<(), PageError> {
        let author = self
            .thread_author(id)
            .ok_or(PageError::UnknownSubject)?;
        if !self.actor.can_report(author) {
            return Err(PageError::NotPermitted);
        }
        let _guard = self.acquire(Op::Report, Subject::Thread(id))?;
        match self.api.report_thread(id, reason).await {
            Ok(()) => self.load().await,
            Err(error) => {
                self.refresh_if_stale(&error).await;
                Err(error.into())
            }
        }
    }

    pub async fn report_reply(&self, id: ReplyId, reason: Option<&str>) -> Result<(), PageError> {
        let author = self
            .reply_author(id)
            .ok_or(PageError::UnknownSubject)?;
        if !self.actor.can_report(author) {
            return Err(PageError::NotPermitted);
        }
        let _guard = self.acquire(Op::Report, Subject::Reply(id))?;
        match self.api.report_reply(id, reason).await {
            Ok(()) => self.refresh_all().await,
            Err(error) => {
                self.refresh_if_stale(&error).await;
                Err(error.into())
            }
        }
    }

    // --- internals ---------------------------------------------------------

    fn acquire(&self, op: Op, subject: Subject) -> Result<BusyGuard<'_>, PageError> {
        let key = (op, subject);
        if self.busy.insert(key, ()).is_some() {
            return Err(PageError::Busy);
        }
        Ok(BusyGuard {
            map: &self.busy,
            key,
        })
    }

    fn thread_author(&self, id: ThreadId) -> Option<ActorId> {
        let state = self.lock();
        state
            .cards
            .iter()
            .find(|c| c.thread.id == id)
            .map(|c| c.thread.author.id)
            .or_else(|| {
                state
                    .open
                    .as_ref()
                    .filter(|p| p.thread.id == id)
                    .map(|p| p.thread.author.id)
            })
    }

    fn reply_author(&self, id: ReplyId) -> Option<ActorId> {
        let state = self.lock();
        state
            .open
            .as_ref()
            .and_then(|p| p.forest.get(id))
            .map(|r| r.author.id)
    }
}
