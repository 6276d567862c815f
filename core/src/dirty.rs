//! Height-ordered scope scheduler (spec §4.6).
//!
//! A `BTreeSet` ordered purely by `(height, ScopeId)` would give height order but
//! break the "ties by FIFO insertion" contract, since `ScopeId` ordering has nothing
//! to do with insertion time. We attach a monotonic insertion sequence to each entry
//! and order by `(height, sequence)` instead, with a side `FxHashSet` for O(1)
//! membership checks — the same split dioxus's own scheduler uses a `BTreeSet<DirtyScope>`
//! for pop order plus a membership check before insert.

use crate::ids::ScopeId;
use fxhash::FxHashSet;
use std::collections::BTreeSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct DirtyEntry {
    height: u16,
    sequence: u64,
    scope: ScopeId,
}

/// Queue of dirty scopes ordered by ascending height, FIFO within a height.
#[derive(Default)]
pub struct DirtyQueue {
    queued: BTreeSet<DirtyEntry>,
    member: FxHashSet<ScopeId>,
    next_sequence: u64,
}

impl DirtyQueue {
    pub fn new() -> Self {
        Self {
            queued: BTreeSet::new(),
            member: FxHashSet::default(),
            next_sequence: 0,
        }
    }

    /// Inserts one scope, deduplicated against what's already queued.
    pub fn collect_one(&mut self, height: u16, scope: ScopeId) {
        if !self.member.insert(scope) {
            return;
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.queued.insert(DirtyEntry {
            height,
            sequence,
            scope,
        });
    }

    /// Drains a caller-supplied per-frame dirty list (e.g.
    /// [`crate::scope::ScopeStore`]'s pending-dirty buffer) into the queue.
    pub fn collect(&mut self, pending: impl IntoIterator<Item = (u16, ScopeId)>) {
        for (height, scope) in pending {
            self.collect_one(height, scope);
        }
    }

    /// Removes and returns the lowest-height queued scope, FIFO within a height.
    pub fn next(&mut self) -> Option<ScopeId> {
        let entry = *self.queued.iter().next()?;
        self.queued.remove(&entry);
        self.member.remove(&entry.scope);
        Some(entry.scope)
    }

    pub fn has(&self, scope: ScopeId) -> bool {
        self.member.contains(&scope)
    }

    pub fn count(&self) -> usize {
        self.queued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }

    pub fn clear(&mut self) {
        self.queued.clear();
        self.member.clear();
    }
}
