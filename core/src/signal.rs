//! Dense arena of reactive cells (spec §4.2).
//!
//! `SignalStore` only owns value storage, versioning and subscriber bookkeeping. It
//! does *not* own the "current reactive context" stack — that lives on
//! [`crate::runtime::Runtime`] and is passed in explicitly by whoever is reading, the
//! same way `dioxus-core`'s scope arena and diff machine are separate types that a
//! top-level `VirtualDom`/`Runtime` wires together. This keeps the borrow graph a
//! tree instead of every store needing a back-reference to every other store.

use crate::ids::{ReactiveContextId, SignalKey, StringKey};
use indexmap::IndexSet;
use slab::Slab;

/// The type-erased payload a signal can hold. Scalars and booleans are stored
/// inline; strings are stored as a key into the (separate) [`crate::string_store::StringStore`]
/// so that the signal arena itself never owns heap string data.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SignalValue {
    Int(i64),
    Bool(bool),
    Str(StringKey),
}

impl SignalValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            SignalValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SignalValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str_key(&self) -> Option<StringKey> {
        match self {
            SignalValue::Str(k) => Some(*k),
            _ => None,
        }
    }
}

struct SignalSlot {
    value: SignalValue,
    version: u32,
    subscribers: IndexSet<ReactiveContextId>,
}

/// Dense arena of reactive cells, parameterized over [`SignalValue`]'s payload kinds.
#[derive(Default)]
pub struct SignalStore {
    slab: Slab<SignalSlot>,
}

impl SignalStore {
    pub fn new() -> Self {
        Self { slab: Slab::new() }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            slab: Slab::with_capacity(cap),
        }
    }

    /// O(1): reuses a freed slot when available, otherwise grows. Write-version
    /// starts at 0.
    pub fn create(&mut self, initial: SignalValue) -> SignalKey {
        let key = self.slab.insert(SignalSlot {
            value: initial,
            version: 0,
            subscribers: IndexSet::default(),
        });
        SignalKey(key as u32)
    }

    pub fn contains(&self, key: SignalKey) -> bool {
        self.slab.contains(key.0 as usize)
    }

    /// Returns the current value without subscribing anything.
    pub fn peek(&self, key: SignalKey) -> SignalValue {
        self.slab[key.0 as usize].value
    }

    pub fn version(&self, key: SignalKey) -> u32 {
        self.slab[key.0 as usize].version
    }

    /// Returns the current value, subscribing `current` (if any) to this signal.
    pub fn read(&mut self, key: SignalKey, current: Option<ReactiveContextId>) -> SignalValue {
        if let Some(ctx) = current {
            self.slab[key.0 as usize].subscribers.insert(ctx);
        }
        self.slab[key.0 as usize].value
    }

    pub fn subscribe(&mut self, key: SignalKey, ctx: ReactiveContextId) {
        self.slab[key.0 as usize].subscribers.insert(ctx);
    }

    pub fn unsubscribe(&mut self, key: SignalKey, ctx: ReactiveContextId) {
        if let Some(slot) = self.slab.get_mut(key.0 as usize) {
            slot.subscribers.shift_remove(&ctx);
        }
    }

    /// Subscriber set in insertion order; notification order must match this, per
    /// spec §5 ("Signal write → subscriber notification: serial, stable order
    /// determined by insertion order into the subscriber set").
    pub fn subscribers(&self, key: SignalKey) -> &IndexSet<ReactiveContextId> {
        &self.slab[key.0 as usize].subscribers
    }

    /// Writes `value` if it differs from the current value (equality suppression).
    /// Returns whether the version was bumped; callers are responsible for walking
    /// `subscribers(key)` afterwards to propagate (this store has no knowledge of
    /// scopes, memos or effects).
    pub fn write(&mut self, key: SignalKey, value: SignalValue) -> bool {
        let slot = &mut self.slab[key.0 as usize];
        if slot.value == value {
            return false;
        }
        slot.value = value;
        slot.version = slot.version.wrapping_add(1);
        true
    }

    pub fn iadd(&mut self, key: SignalKey, delta: i64) -> bool {
        let cur = self.peek(key).as_int().expect("iadd on non-int signal");
        self.write(key, SignalValue::Int(cur + delta))
    }

    pub fn isub(&mut self, key: SignalKey, delta: i64) -> bool {
        self.iadd(key, -delta)
    }

    pub fn imul(&mut self, key: SignalKey, factor: i64) -> bool {
        let cur = self.peek(key).as_int().expect("imul on non-int signal");
        self.write(key, SignalValue::Int(cur * factor))
    }

    pub fn ifloordiv(&mut self, key: SignalKey, divisor: i64) -> bool {
        let cur = self.peek(key).as_int().expect("ifloordiv on non-int signal");
        self.write(key, SignalValue::Int(cur.div_euclid(divisor)))
    }

    pub fn imod(&mut self, key: SignalKey, divisor: i64) -> bool {
        let cur = self.peek(key).as_int().expect("imod on non-int signal");
        self.write(key, SignalValue::Int(cur.rem_euclid(divisor)))
    }

    pub fn toggle(&mut self, key: SignalKey) -> bool {
        let cur = self.peek(key).as_bool().expect("toggle on non-bool signal");
        self.write(key, SignalValue::Bool(!cur))
    }

    /// Removes the signal, dropping its slot back into the free list. Does not
    /// touch any peer's subscriber set that may still mention this key as a
    /// subscriber *of something else* — callers (memos/effects) are expected to
    /// have already unsubscribed from their inputs before calling this.
    pub fn destroy(&mut self, key: SignalKey) {
        if self.slab.contains(key.0 as usize) {
            self.slab.remove(key.0 as usize);
        }
    }

    pub fn count(&self) -> usize {
        self.slab.len()
    }
}
