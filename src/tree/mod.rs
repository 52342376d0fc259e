//! Reply Tree Builder
//!
//! Converts the collaborator's flat/shallow-nested reply payload into a
//! bounded-depth navigable forest. Nesting is unbounded in the data but
//! fixed-depth in presentation: the forest is assembled once per fetch into
//! an id-keyed node table, and rendering flattens everything below the first
//! level under the nearest root ancestor. Records whose parent is missing
//! from the fetched set are promoted to root — never silently dropped.

use crate::model::{Reply, ReplyId, ReplyPayload, ThreadId};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

/// Walk a shallow-nested wire payload into flat [`Reply`] records.
///
/// Parent ids are taken from the record when present, otherwise derived
/// from the nesting. Uses an explicit stack so adversarial depth cannot
/// blow the call stack.
pub fn flatten_payload(thread: ThreadId, payload: &[ReplyPayload]) -> Vec<Reply> {
    let mut out = Vec::new();
    let mut stack: Vec<(&ReplyPayload, Option<ReplyId>)> =
        payload.iter().rev().map(|p| (p, None)).collect();

    while let Some((node, parent)) = stack.pop() {
        out.push(Reply {
            id: node.id,
            thread_id: thread,
            body: node.body.clone(),
            created_at: node.created_at,
            author: node.author.clone(),
            parent_id: node.parent_id.or(parent),
            up: node.up,
            down: node.down,
            flagged: node.flagged,
        });
        for child in node.children.iter().rev() {
            stack.push((child, Some(node.id)));
        }
    }
    out
}

struct Slot {
    reply: Reply,
    children: Vec<usize>,
}

/// A forest of replies for one thread.
///
/// Roots and every sibling group are ordered newest-first by `created_at`,
/// ties broken by id descending.
pub struct Forest {
    slots: Vec<Slot>,
    roots: Vec<usize>,
}

/// Build the forest from flat records.
///
/// Null-parent records become roots; records whose parent is present attach
/// under it; records whose parent is absent (or self-referential) are
/// promoted to root.
pub fn build_forest(replies: Vec<Reply>) -> Forest {
    let ids: HashSet<ReplyId> = replies.iter().map(|r| r.id).collect();

    let mut slots: Vec<Slot> = replies
        .into_iter()
        .map(|reply| Slot {
            reply,
            children: Vec::new(),
        })
        .collect();

    let index_of: HashMap<ReplyId, usize> = slots
        .iter()
        .enumerate()
        .map(|(i, s)| (s.reply.id, i))
        .collect();

    let mut roots = Vec::new();
    let mut attachments: Vec<(usize, usize)> = Vec::new();
    for (i, slot) in slots.iter().enumerate() {
        let parent = slot
            .reply
            .parent_id
            .filter(|p| *p != slot.reply.id && ids.contains(p));
        match parent.and_then(|p| index_of.get(&p)) {
            Some(&parent_index) => attachments.push((parent_index, i)),
            None => roots.push(i),
        }
    }
    for (parent_index, child_index) in attachments {
        slots[parent_index].children.push(child_index);
    }

    // Sort keys copied out so index lists can be ordered without aliasing
    // the slot table.
    let keys: Vec<(DateTime<Utc>, ReplyId)> = slots
        .iter()
        .map(|s| (s.reply.created_at, s.reply.id))
        .collect();
    let newest_first = |a: &usize, b: &usize| keys[*b].cmp(&keys[*a]);

    roots.sort_by(newest_first);
    for slot in &mut slots {
        slot.children.sort_by(newest_first);
    }

    Forest { slots, roots }
}

/// One rendered top-level group: a root and all of its descendants
/// flattened to a single level, newest-first.
pub struct RootGroup<'a> {
    pub root: &'a Reply,
    pub children: Vec<&'a Reply>,
}

impl<'a> RootGroup<'a> {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

impl Forest {
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Total number of replies in the forest.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, id: ReplyId) -> Option<&Reply> {
        self.slots.iter().map(|s| &s.reply).find(|r| r.id == id)
    }

    /// Every record exactly once, in input order. The partition into
    /// roots/children never loses or duplicates a reply.
    pub fn flatten(&self) -> Vec<&Reply> {
        self.slots.iter().map(|s| &s.reply).collect()
    }

    /// Number of direct and transitive descendants under `id`.
    pub fn descendant_count(&self, id: ReplyId) -> usize {
        self.slots
            .iter()
            .position(|s| s.reply.id == id)
            .map(|i| self.collect_descendants(i).len())
            .unwrap_or(0)
    }

    /// The presentation view: roots in order, descendants flattened under
    /// the nearest root regardless of their depth in the data.
    pub fn render(&self) -> Vec<RootGroup<'_>> {
        self.roots
            .iter()
            .map(|&root| {
                let mut indices = self.collect_descendants(root);
                indices.sort_by(|a, b| {
                    let ka = (self.slots[*a].reply.created_at, self.slots[*a].reply.id);
                    let kb = (self.slots[*b].reply.created_at, self.slots[*b].reply.id);
                    kb.cmp(&ka)
                });
                RootGroup {
                    root: &self.slots[root].reply,
                    children: indices.iter().map(|&i| &self.slots[i].reply).collect(),
                }
            })
            .collect()
    }

    fn collect_descendants(&self, root: usize) -> Vec<usize> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.slots[root].children.clone();
        while let Some(i) = stack.pop() {
            if !seen.insert(i) {
                continue;
            }
            out.push(i);
            stack.extend(self.slots[i].children.iter().copied());
        }
        out
    }
}

/// Local expand/collapse state, keyed by reply id.
///
/// Groups with children start collapsed; toggling is purely local and
/// survives a refetch of the same thread.
#[derive(Debug, Default, Clone)]
pub struct CollapseSet {
    expanded: HashSet<ReplyId>,
}

impl CollapseSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, id: ReplyId) -> bool {
        self.expanded.contains(&id)
    }

    pub fn toggle(&mut self, id: ReplyId) {
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
        }
    }
}
