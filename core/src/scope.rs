//! Component scopes and the positional hook model (spec §4.3).
//!
//! Mirrors `dioxus-core`'s `Scope`/`ScopeState` split: a dense arena (`slab::Slab`)
//! of scope records, each owning an ordered hook list consumed by cursor position
//! rather than by name. `use_hook` in the teacher's `scope.rs` is the same contract:
//! first render appends, later renders re-read by position and ignore the freshly
//! supplied initial value.

use crate::ids::{EffectId, MemoId, ScopeId, SignalKey};
use slab::Slab;

/// One entry in a scope's hook list. The tag is checked on every later render so a
/// hook-ordering violation (spec §9, a fatal-error class) can be detected instead of
/// silently reading the wrong payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookEntry {
    Signal(SignalKey),
    SignalBool(SignalKey),
    /// A string signal is a pair: the `StringStore` key's signal plus a version
    /// signal bumped on every write (spec §4.2).
    SignalString(SignalKey, SignalKey),
    Memo(MemoId),
    Effect(EffectId),
}

impl HookEntry {
    pub fn tag(&self) -> &'static str {
        match self {
            HookEntry::Signal(_) => "signal",
            HookEntry::SignalBool(_) => "signal_bool",
            HookEntry::SignalString(..) => "signal_string",
            HookEntry::Memo(_) => "memo",
            HookEntry::Effect(_) => "effect",
        }
    }
}

struct ScopeRecord {
    height: u16,
    parent: ScopeId,
    dirty: bool,
    render_count: u32,
    hooks: Vec<HookEntry>,
    hook_cursor: usize,
}

/// Dense arena of component scopes.
#[derive(Default)]
pub struct ScopeStore {
    slab: Slab<ScopeRecord>,
    /// Scopes marked dirty since the last [`ScopeStore::drain_pending_dirty`] call —
    /// this is the "per-frame dirty list" spec §4.6's `collect(runtime)` drains.
    pending_dirty: Vec<ScopeId>,
}

impl ScopeStore {
    pub fn new() -> Self {
        Self {
            slab: Slab::new(),
            pending_dirty: Vec::new(),
        }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            slab: Slab::with_capacity(cap),
            pending_dirty: Vec::new(),
        }
    }

    pub fn create(&mut self, height: u16, parent: ScopeId) -> ScopeId {
        let key = self.slab.insert(ScopeRecord {
            height,
            parent,
            dirty: false,
            render_count: 0,
            hooks: Vec::new(),
            hook_cursor: 0,
        });
        ScopeId(key as i32)
    }

    pub fn create_child(&mut self, parent: ScopeId) -> ScopeId {
        let parent_height = self.height(parent);
        self.create(parent_height + 1, parent)
    }

    pub fn contains(&self, scope: ScopeId) -> bool {
        !scope.is_none() && self.slab.contains(scope.0 as usize)
    }

    fn record(&self, scope: ScopeId) -> &ScopeRecord {
        &self.slab[scope.0 as usize]
    }

    fn record_mut(&mut self, scope: ScopeId) -> &mut ScopeRecord {
        &mut self.slab[scope.0 as usize]
    }

    pub fn height(&self, scope: ScopeId) -> u16 {
        self.record(scope).height
    }

    pub fn parent(&self, scope: ScopeId) -> ScopeId {
        self.record(scope).parent
    }

    pub fn is_first_render(&self, scope: ScopeId) -> bool {
        self.record(scope).render_count == 0
    }

    pub fn render_count(&self, scope: ScopeId) -> u32 {
        self.record(scope).render_count
    }

    pub fn hook_count(&self, scope: ScopeId) -> usize {
        self.record(scope).hooks.len()
    }

    pub fn hook_tag_at(&self, scope: ScopeId, i: usize) -> &'static str {
        self.record(scope).hooks[i].tag()
    }

    pub fn hook_value_at(&self, scope: ScopeId, i: usize) -> HookEntry {
        self.record(scope).hooks[i]
    }

    pub fn is_dirty(&self, scope: ScopeId) -> bool {
        self.record(scope).dirty
    }

    /// Marks `scope` dirty and appends it to the per-frame pending-dirty list
    /// (idempotent: re-marking an already-dirty scope doesn't duplicate the entry,
    /// since `collect_one` dedups on drain).
    pub fn set_dirty(&mut self, scope: ScopeId) {
        let rec = self.record_mut(scope);
        rec.dirty = true;
        self.pending_dirty.push(scope);
    }

    /// Drains the scopes touched this frame, paired with their height, for handing
    /// to [`crate::dirty::DirtyQueue::collect`].
    pub fn drain_pending_dirty(&mut self) -> Vec<(u16, ScopeId)> {
        self.pending_dirty
            .drain(..)
            .map(|s| (self.slab[s.0 as usize].height, s))
            .collect()
    }

    /// Pushes `scope` as the current context/component scope, clears its dirty bit,
    /// bumps its render count, and resets the hook cursor. Returns the previously
    /// current scope so nesting is a pure stack protocol.
    pub fn begin_render(&mut self, scope: ScopeId) {
        let rec = self.record_mut(scope);
        rec.dirty = false;
        rec.render_count += 1;
        rec.hook_cursor = 0;
    }

    pub fn end_render(&mut self, _scope: ScopeId) {
        // Nothing scope-local to restore; the context-stack push/pop lives in
        // `crate::runtime::Runtime`, which is the actual nesting-stack owner.
    }

    /// Advances the hook cursor by one and returns the hook at that position,
    /// creating it via `make` on first-render (cursor beyond current length).
    /// Subsequent renders ignore `make` and return the existing entry, matching the
    /// "ignore the freshly supplied initial value" contract.
    pub fn use_hook(&mut self, scope: ScopeId, make: impl FnOnce() -> HookEntry) -> HookEntry {
        let rec = self.record_mut(scope);
        let cursor = rec.hook_cursor;
        rec.hook_cursor += 1;
        if cursor < rec.hooks.len() {
            rec.hooks[cursor]
        } else {
            let entry = make();
            rec.hooks.push(entry);
            entry
        }
    }

    pub fn hook_cursor(&self, scope: ScopeId) -> usize {
        self.record(scope).hook_cursor
    }

    /// Appends a freshly created hook entry to `scope`'s list without touching the
    /// cursor. Used by callers (`ComponentContext`) that need to create the entry
    /// with access to stores `ScopeStore` doesn't own, then hand it back here.
    pub fn push_hook(&mut self, scope: ScopeId, entry: HookEntry) {
        self.record_mut(scope).hooks.push(entry);
    }

    /// Advances the cursor by one without reading or creating an entry.
    pub fn advance_cursor(&mut self, scope: ScopeId) {
        self.record_mut(scope).hook_cursor += 1;
    }

    pub fn destroy(&mut self, scope: ScopeId) {
        if self.contains(scope) {
            self.slab.remove(scope.0 as usize);
        }
    }

    pub fn count(&self) -> usize {
        self.slab.len()
    }
}
