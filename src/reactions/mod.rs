//! Reaction Aggregator
//!
//! Two reaction models share one capability with a declared policy:
//! threads carry an exclusive kind per actor out of a fixed palette, replies
//! carry independent up/down counters with no per-actor state. Both apply
//! mutations optimistically through an explicit `pending → confirmed |
//! rolled-back` micro-state, so a slow or failed request can always be
//! reconciled deterministically. While a mutation is pending the subject's
//! control is disabled — a later gesture can never be overwritten by an
//! earlier in-flight response.

use crate::model::{ReactionKind, Vote, VoteCounts};
use std::collections::HashMap;
use thiserror::Error;

/// How reactions on a subject compose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionPolicy {
    /// One kind per actor; re-selecting the current kind clears it.
    ExclusiveKind,
    /// Independent counters; every submission increments one of them.
    IndependentCounters,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReactionError {
    /// A mutation for this subject is already in flight.
    #[error("a reaction request is already in flight for this subject")]
    Busy,
}

/// Optimistic-mutation micro-state.
///
/// `Pending` carries the pre-mutation snapshot; `confirm` discards it in
/// favor of the authoritative response, `rollback` restores it.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase<S> {
    Settled,
    Pending { snapshot: S },
}

impl<S> Phase<S> {
    fn is_pending(&self) -> bool {
        matches!(self, Phase::Pending { .. })
    }

    fn begin(&mut self, snapshot: S) -> Result<(), ReactionError> {
        if self.is_pending() {
            return Err(ReactionError::Busy);
        }
        *self = Phase::Pending { snapshot };
        Ok(())
    }

    fn take_snapshot(&mut self) -> Option<S> {
        match std::mem::replace(self, Phase::Settled) {
            Phase::Pending { snapshot } => Some(snapshot),
            Phase::Settled => None,
        }
    }
}

/// Exclusive-kind reaction state for one thread.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadReactions {
    counts: HashMap<ReactionKind, u32>,
    user_reaction: Option<ReactionKind>,
    phase: Phase<(HashMap<ReactionKind, u32>, Option<ReactionKind>)>,
}

impl ThreadReactions {
    pub const POLICY: ReactionPolicy = ReactionPolicy::ExclusiveKind;

    pub fn from_state(
        counts: HashMap<ReactionKind, u32>,
        user_reaction: Option<ReactionKind>,
    ) -> Self {
        Self {
            counts,
            user_reaction,
            phase: Phase::Settled,
        }
    }

    pub fn count(&self, kind: ReactionKind) -> u32 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> &HashMap<ReactionKind, u32> {
        &self.counts
    }

    pub fn user_reaction(&self) -> Option<ReactionKind> {
        self.user_reaction
    }

    pub fn is_pending(&self) -> bool {
        self.phase.is_pending()
    }

    /// Start a mutation for the given gesture and apply it optimistically.
    ///
    /// Returns the value to submit on the wire: selecting the actor's
    /// current kind is a clear (`None`), anything else selects that kind.
    /// Fails with [`ReactionError::Busy`] while a mutation is pending.
    pub fn begin(&mut self, kind: ReactionKind) -> Result<Option<ReactionKind>, ReactionError> {
        self.phase
            .begin((self.counts.clone(), self.user_reaction))?;

        let target = if self.user_reaction == Some(kind) {
            None
        } else {
            Some(kind)
        };
        if let Some(old) = self.user_reaction {
            self.decrement(old);
        }
        if let Some(new) = target {
            *self.counts.entry(new).or_insert(0) += 1;
        }
        self.user_reaction = target;
        Ok(target)
    }

    /// Adopt the authoritative response. The optimistic value is never
    /// treated as final.
    pub fn confirm(
        &mut self,
        counts: HashMap<ReactionKind, u32>,
        user_reaction: Option<ReactionKind>,
    ) {
        self.phase.take_snapshot();
        self.counts = counts;
        self.counts.retain(|_, c| *c > 0);
        self.user_reaction = user_reaction;
    }

    /// Restore the pre-mutation snapshot. No-op when nothing is pending.
    pub fn rollback(&mut self) {
        if let Some((counts, user_reaction)) = self.phase.take_snapshot() {
            self.counts = counts;
            self.user_reaction = user_reaction;
        }
    }

    fn decrement(&mut self, kind: ReactionKind) {
        if let Some(count) = self.counts.get_mut(&kind) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.counts.remove(&kind);
            }
        }
    }
}

/// Independent up/down counters for one reply.
///
/// Intentionally asymmetric to [`ThreadReactions`]: there is no per-actor
/// "current reaction", every vote just increments a counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyVotes {
    up: u32,
    down: u32,
    phase: Phase<(u32, u32)>,
}

impl ReplyVotes {
    pub const POLICY: ReactionPolicy = ReactionPolicy::IndependentCounters;

    pub fn from_counts(up: u32, down: u32) -> Self {
        Self {
            up,
            down,
            phase: Phase::Settled,
        }
    }

    pub fn up(&self) -> u32 {
        self.up
    }

    pub fn down(&self) -> u32 {
        self.down
    }

    pub fn is_pending(&self) -> bool {
        self.phase.is_pending()
    }

    /// Start a vote and apply it optimistically. Returns the vote to submit.
    pub fn begin(&mut self, vote: Vote) -> Result<Vote, ReactionError> {
        self.phase.begin((self.up, self.down))?;
        match vote {
            Vote::Up => self.up += 1,
            Vote::Down => self.down += 1,
        }
        Ok(vote)
    }

    /// Adopt the authoritative counters.
    pub fn confirm(&mut self, counts: VoteCounts) {
        self.phase.take_snapshot();
        self.up = counts.up;
        self.down = counts.down;
    }

    /// Restore the pre-mutation snapshot. No-op when nothing is pending.
    pub fn rollback(&mut self) {
        if let Some((up, down)) = self.phase.take_snapshot() {
            self.up = up;
            self.down = down;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn confirm_as_applied(state: &mut ThreadReactions) {
        // simulate a server that agrees with the optimistic view
        let counts = state.counts().clone();
        let user = state.user_reaction();
        state.confirm(counts, user);
    }

    #[test]
    fn toggle_same_kind_is_net_zero() {
        let mut state = ThreadReactions::from_state(HashMap::new(), None);

        state.begin(ReactionKind::Like).unwrap();
        confirm_as_applied(&mut state);
        assert_eq!(state.count(ReactionKind::Like), 1);
        assert_eq!(state.user_reaction(), Some(ReactionKind::Like));

        state.begin(ReactionKind::Like).unwrap();
        confirm_as_applied(&mut state);
        assert_eq!(state.count(ReactionKind::Like), 0);
        assert_eq!(state.user_reaction(), None);
    }

    #[test]
    fn switching_kinds_equals_selecting_the_second() {
        let mut switched = ThreadReactions::from_state(HashMap::new(), None);
        switched.begin(ReactionKind::Like).unwrap();
        confirm_as_applied(&mut switched);
        switched.begin(ReactionKind::Funny).unwrap();
        confirm_as_applied(&mut switched);

        let mut direct = ThreadReactions::from_state(HashMap::new(), None);
        direct.begin(ReactionKind::Funny).unwrap();
        confirm_as_applied(&mut direct);

        assert_eq!(switched.counts(), direct.counts());
        assert_eq!(switched.user_reaction(), direct.user_reaction());
    }

    #[test]
    fn reselecting_current_kind_clears_it() {
        // Thread with {like: 3}, user_reaction "like"; re-selecting like
        // must yield {like: 2} and no user reaction.
        let mut state = ThreadReactions::from_state(
            HashMap::from([(ReactionKind::Like, 3)]),
            Some(ReactionKind::Like),
        );
        let wire = state.begin(ReactionKind::Like).unwrap();
        assert_eq!(wire, None, "clear travels as null");
        assert_eq!(state.count(ReactionKind::Like), 2);
        assert_eq!(state.user_reaction(), None);
    }

    #[test]
    fn begin_while_pending_is_rejected() {
        let mut state = ThreadReactions::from_state(HashMap::new(), None);
        state.begin(ReactionKind::Love).unwrap();
        assert_eq!(state.begin(ReactionKind::Like), Err(ReactionError::Busy));
        assert!(state.is_pending());
    }

    #[test]
    fn rollback_restores_pre_mutation_state() {
        let mut state = ThreadReactions::from_state(
            HashMap::from([(ReactionKind::Support, 2)]),
            Some(ReactionKind::Support),
        );
        state.begin(ReactionKind::Insightful).unwrap();
        assert_eq!(state.count(ReactionKind::Support), 1);
        assert_eq!(state.user_reaction(), Some(ReactionKind::Insightful));

        state.rollback();
        assert_eq!(state.count(ReactionKind::Support), 2);
        assert_eq!(state.user_reaction(), Some(ReactionKind::Support));
        assert!(!state.is_pending());
    }

    #[test]
    fn confirm_adopts_authoritative_counts_over_optimistic() {
        let mut state = ThreadReactions::from_state(HashMap::new(), None);
        state.begin(ReactionKind::Like).unwrap();
        // server says someone else reacted meanwhile
        state.confirm(
            HashMap::from([(ReactionKind::Like, 5)]),
            Some(ReactionKind::Like),
        );
        assert_eq!(state.count(ReactionKind::Like), 5);
        assert!(!state.is_pending());
    }

    #[test]
    fn reply_votes_always_increment() {
        let mut votes = ReplyVotes::from_counts(1, 0);
        votes.begin(Vote::Up).unwrap();
        votes.confirm(VoteCounts { up: 2, down: 0 });
        votes.begin(Vote::Up).unwrap();
        votes.confirm(VoteCounts { up: 3, down: 0 });
        votes.begin(Vote::Down).unwrap();
        votes.confirm(VoteCounts { up: 3, down: 1 });
        assert_eq!((votes.up(), votes.down()), (3, 1));
    }

    #[test]
    fn reply_vote_rollback_and_busy_gate() {
        let mut votes = ReplyVotes::from_counts(0, 0);
        votes.begin(Vote::Down).unwrap();
        assert_eq!(votes.begin(Vote::Up), Err(ReactionError::Busy));
        votes.rollback();
        assert_eq!((votes.up(), votes.down()), (0, 0));
        assert!(!votes.is_pending());
    }

    #[test]
    fn policies_are_declared_per_subject() {
        assert_eq!(ThreadReactions::POLICY, ReactionPolicy::ExclusiveKind);
        assert_eq!(ReplyVotes::POLICY, ReactionPolicy::IndependentCounters);
    }
}
