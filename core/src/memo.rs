//! Computed values (spec §4.4).
//!
//! A memo is bookkeeping only: it names an owning scope, the output signal holding
//! its cached value, the context-marker signal used purely as a subscription
//! identity, a dirty bit, and the input set tracked during the last compute (used to
//! prune stale subscriptions on the next compute). The actual signal reads/writes
//! that drive a memo's value live on [`crate::signal::SignalStore`]; wiring the two
//! together is [`crate::runtime::Runtime`]'s job, the same separation `SignalStore`
//! uses to stay free of back-references into its peers.

use crate::ids::{ScopeId, SignalKey};
use slab::Slab;

struct MemoRecord {
    owner: ScopeId,
    output: SignalKey,
    marker: SignalKey,
    dirty: bool,
    tracked_inputs: Vec<SignalKey>,
}

/// Arena of computed values. Initially dirty, per spec §4.4.
#[derive(Default)]
pub struct MemoStore {
    slab: Slab<MemoRecord>,
}

impl MemoStore {
    pub fn new() -> Self {
        Self { slab: Slab::new() }
    }

    /// Registers bookkeeping for a memo whose two signals were already allocated by
    /// the caller (via `SignalStore::create`).
    pub fn create(&mut self, owner: ScopeId, output: SignalKey, marker: SignalKey) -> crate::ids::MemoId {
        let key = self.slab.insert(MemoRecord {
            owner,
            output,
            marker,
            dirty: true,
            tracked_inputs: Vec::new(),
        });
        crate::ids::MemoId(key as u32)
    }

    pub fn contains(&self, memo: crate::ids::MemoId) -> bool {
        self.slab.contains(memo.0 as usize)
    }

    pub fn owner(&self, memo: crate::ids::MemoId) -> ScopeId {
        self.slab[memo.0 as usize].owner
    }

    pub fn output_key(&self, memo: crate::ids::MemoId) -> SignalKey {
        self.slab[memo.0 as usize].output
    }

    pub fn marker_key(&self, memo: crate::ids::MemoId) -> SignalKey {
        self.slab[memo.0 as usize].marker
    }

    pub fn is_dirty(&self, memo: crate::ids::MemoId) -> bool {
        self.slab[memo.0 as usize].dirty
    }

    pub fn set_dirty(&mut self, memo: crate::ids::MemoId, dirty: bool) {
        self.slab[memo.0 as usize].dirty = dirty;
    }

    pub fn tracked_inputs(&self, memo: crate::ids::MemoId) -> &[SignalKey] {
        &self.slab[memo.0 as usize].tracked_inputs
    }

    /// Replaces the tracked-input list, returning the previous one so the caller can
    /// diff it against the new reads and unsubscribe whatever dropped out.
    pub fn replace_tracked_inputs(
        &mut self,
        memo: crate::ids::MemoId,
        inputs: Vec<SignalKey>,
    ) -> Vec<SignalKey> {
        std::mem::replace(&mut self.slab[memo.0 as usize].tracked_inputs, inputs)
    }

    pub fn destroy(&mut self, memo: crate::ids::MemoId) {
        if self.slab.contains(memo.0 as usize) {
            self.slab.remove(memo.0 as usize);
        }
    }

    pub fn count(&self) -> usize {
        self.slab.len()
    }
}
