//! Effects (spec §4.5).
//!
//! Structurally a thinner memo: no output value, just a pending bit and a tracked
//! input set. Effects must be drained by the host render loop after scheduler
//! drain — the runtime has no autonomous timer to run them itself.

use crate::ids::{EffectId, ScopeId, SignalKey};
use slab::Slab;

struct EffectRecord {
    owner: ScopeId,
    pending: bool,
    tracked_inputs: Vec<SignalKey>,
}

/// Arena of effects. Starts pending, per spec §4.5.
#[derive(Default)]
pub struct EffectStore {
    slab: Slab<EffectRecord>,
}

impl EffectStore {
    pub fn new() -> Self {
        Self { slab: Slab::new() }
    }

    pub fn create(&mut self, owner: ScopeId) -> EffectId {
        let key = self.slab.insert(EffectRecord {
            owner,
            pending: true,
            tracked_inputs: Vec::new(),
        });
        EffectId(key as u32)
    }

    pub fn contains(&self, fx: EffectId) -> bool {
        self.slab.contains(fx.0 as usize)
    }

    pub fn owner(&self, fx: EffectId) -> ScopeId {
        self.slab[fx.0 as usize].owner
    }

    pub fn is_pending(&self, fx: EffectId) -> bool {
        self.slab[fx.0 as usize].pending
    }

    pub fn set_pending(&mut self, fx: EffectId, pending: bool) {
        self.slab[fx.0 as usize].pending = pending;
    }

    pub fn tracked_inputs(&self, fx: EffectId) -> &[SignalKey] {
        &self.slab[fx.0 as usize].tracked_inputs
    }

    pub fn replace_tracked_inputs(&mut self, fx: EffectId, inputs: Vec<SignalKey>) -> Vec<SignalKey> {
        std::mem::replace(&mut self.slab[fx.0 as usize].tracked_inputs, inputs)
    }

    pub fn destroy(&mut self, fx: EffectId) {
        if self.slab.contains(fx.0 as usize) {
            self.slab.remove(fx.0 as usize);
        }
    }

    pub fn count(&self) -> usize {
        self.slab.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_pending() {
        let mut store = EffectStore::new();
        let fx = store.create(ScopeId(0));
        assert!(store.is_pending(fx));
        store.set_pending(fx, false);
        assert!(!store.is_pending(fx));
    }
}
