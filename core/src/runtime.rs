//! Ties the reactive stores together: signal writes, memo/effect dirtying, and the
//! height-ordered scheduler drain (spec §4.2–§4.6, §9's "context stack" design note).
//!
//! `Runtime` is the only owner of the "current reactive context" stack. Every other
//! store takes that context as an explicit parameter rather than holding the stack
//! itself, so `SignalStore`/`ScopeStore`/`MemoStore`/`EffectStore` never need a
//! back-reference to their peers.

use crate::config::RuntimeConfig;
use crate::dirty::DirtyQueue;
use crate::effect::EffectStore;
use crate::ids::{EffectId, MemoId, ReactiveContextId, ScopeId, SignalKey};
use crate::memo::MemoStore;
use crate::scope::ScopeStore;
use crate::signal::{SignalStore, SignalValue};
use crate::string_store::StringStore;
use crate::template::TemplateRegistry;

/// Owns every reactive store plus the context stack and scheduler. One `Runtime`
/// per independent component tree (spec §5: multiple runtimes are fully isolated).
#[derive(Default)]
pub struct Runtime {
    pub signals: SignalStore,
    pub scopes: ScopeStore,
    pub memos: MemoStore,
    pub effects: EffectStore,
    pub strings: StringStore,
    pub templates: TemplateRegistry,
    pub dirty: DirtyQueue,
    context_stack: Vec<ReactiveContextId>,
}

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            signals: SignalStore::with_capacity(config.signal_capacity),
            scopes: ScopeStore::with_capacity(config.scope_capacity),
            memos: MemoStore::new(),
            effects: EffectStore::new(),
            strings: StringStore::new(),
            templates: TemplateRegistry::new(),
            dirty: DirtyQueue::new(),
            context_stack: Vec::new(),
        }
    }

    /// The reader that implicit signal reads should subscribe to, per spec §3's
    /// "top of a per-runtime current-context stack"; `None` means untracked.
    pub fn current_context(&self) -> Option<ReactiveContextId> {
        self.context_stack.last().copied()
    }

    fn push_context(&mut self, ctx: ReactiveContextId) {
        self.context_stack.push(ctx);
    }

    fn pop_context(&mut self, expected: ReactiveContextId) {
        let popped = self.context_stack.pop();
        debug_assert_eq!(
            popped,
            Some(expected),
            "reactive context stack popped out of nesting order"
        );
    }

    // --- scope render ---

    pub fn begin_render(&mut self, scope: ScopeId) {
        self.scopes.begin_render(scope);
        self.push_context(ReactiveContextId::Scope(scope));
    }

    pub fn end_render(&mut self, scope: ScopeId) {
        self.pop_context(ReactiveContextId::Scope(scope));
        self.scopes.end_render(scope);
    }

    // --- memo compute ---

    /// Creates a memo's two backing signals and registers it. `initial` seeds the
    /// output signal (spec §4.4).
    pub fn create_memo(&mut self, owner: ScopeId, initial: SignalValue) -> MemoId {
        let output = self.signals.create(initial);
        let marker = self.signals.create(SignalValue::Bool(false));
        self.memos.create(owner, output, marker)
    }

    pub fn begin_compute(&mut self, memo: MemoId) {
        self.push_context(ReactiveContextId::Memo(memo));
    }

    /// Writes `value` to the memo's output signal (equality-suppressed), clears
    /// dirty, and propagates through the output signal's own subscribers if the
    /// value actually changed.
    pub fn end_compute(&mut self, memo: MemoId, value: SignalValue) {
        self.pop_context(ReactiveContextId::Memo(memo));
        self.memos.set_dirty(memo, false);
        let output = self.memos.output_key(memo);
        if self.signals.write(output, value) {
            self.propagate_from(output);
        }
    }

    pub fn recompute_from(&mut self, memo: MemoId, value: SignalValue) {
        self.memos.set_dirty(memo, false);
        let output = self.memos.output_key(memo);
        if self.signals.write(output, value) {
            self.propagate_from(output);
        }
    }

    /// Swaps in the signals read during the just-finished compute, unsubscribing
    /// the memo from whatever it no longer reads (spec §4.2's "destroy... then
    /// peer unsubscription" contract, applied here to re-tracking instead).
    pub fn retrack_memo_inputs(&mut self, memo: MemoId, new_inputs: Vec<SignalKey>) {
        let old_inputs = self.memos.replace_tracked_inputs(memo, new_inputs.clone());
        let ctx = ReactiveContextId::Memo(memo);
        for old in old_inputs {
            if !new_inputs.contains(&old) {
                self.signals.unsubscribe(old, ctx);
            }
        }
    }

    pub fn read_memo(&mut self, memo: MemoId) -> SignalValue {
        let output = self.memos.output_key(memo);
        self.signals.read(output, self.current_context())
    }

    pub fn peek_memo(&self, memo: MemoId) -> SignalValue {
        self.signals.peek(self.memos.output_key(memo))
    }

    pub fn destroy_memo(&mut self, memo: MemoId) {
        let ctx = ReactiveContextId::Memo(memo);
        for input in self.memos.tracked_inputs(memo).to_vec() {
            self.signals.unsubscribe(input, ctx);
        }
        let output = self.memos.output_key(memo);
        let marker = self.memos.marker_key(memo);
        self.signals.destroy(output);
        self.signals.destroy(marker);
        self.memos.destroy(memo);
    }

    // --- effect run ---

    pub fn begin_run(&mut self, fx: EffectId) {
        self.push_context(ReactiveContextId::Effect(fx));
    }

    pub fn end_run(&mut self, fx: EffectId, new_inputs: Vec<SignalKey>) {
        self.pop_context(ReactiveContextId::Effect(fx));
        self.effects.set_pending(fx, false);
        let old_inputs = self.effects.replace_tracked_inputs(fx, new_inputs.clone());
        let ctx = ReactiveContextId::Effect(fx);
        for old in old_inputs {
            if !new_inputs.contains(&old) {
                self.signals.unsubscribe(old, ctx);
            }
        }
    }

    pub fn destroy_effect(&mut self, fx: EffectId) {
        let ctx = ReactiveContextId::Effect(fx);
        for input in self.effects.tracked_inputs(fx).to_vec() {
            self.signals.unsubscribe(input, ctx);
        }
        self.effects.destroy(fx);
    }

    // --- signal write + propagation ---

    /// Writes `value` to `key` and, if it changed, propagates to every subscriber
    /// (spec §4.2's write contract). Returns whether the value actually changed.
    pub fn write_signal(&mut self, key: SignalKey, value: SignalValue) -> bool {
        let changed = self.signals.write(key, value);
        if changed {
            self.propagate_from(key);
        }
        changed
    }

    /// Walks `key`'s subscriber set, marking scopes/memos/effects dirty and
    /// cascading through memo output signals (spec §4.4's marking-dirty protocol).
    fn propagate_from(&mut self, key: SignalKey) {
        let mut worklist: Vec<SignalKey> = vec![key];
        while let Some(k) = worklist.pop() {
            let subscribers: Vec<ReactiveContextId> = self.signals.subscribers(k).iter().copied().collect();
            for ctx in subscribers {
                match ctx {
                    ReactiveContextId::Scope(scope) => {
                        if self.scopes.contains(scope) {
                            let height = self.scopes.height(scope);
                            self.scopes.set_dirty(scope);
                            let _ = height;
                        }
                    }
                    ReactiveContextId::Memo(memo) => {
                        if self.memos.contains(memo) && !self.memos.is_dirty(memo) {
                            self.memos.set_dirty(memo, true);
                            let output = self.memos.output_key(memo);
                            worklist.push(output);
                        }
                    }
                    ReactiveContextId::Effect(fx) => {
                        if self.effects.contains(fx) {
                            self.effects.set_pending(fx, true);
                        }
                    }
                }
            }
        }
    }

    // --- scheduler ---

    /// Drains every scope marked dirty since the last drain into the scheduler.
    pub fn collect_dirty(&mut self) {
        let pending = self.scopes.drain_pending_dirty();
        self.dirty.collect(pending);
    }

    pub fn next_dirty(&mut self) -> Option<ScopeId> {
        self.dirty.next()
    }

    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_write_dirties_subscribed_scope() {
        let mut rt = Runtime::new();
        let scope = rt.scopes.create(0, ScopeId::NONE);
        let key = rt.signals.create(SignalValue::Int(1));
        rt.signals.subscribe(key, ReactiveContextId::Scope(scope));
        rt.write_signal(key, SignalValue::Int(2));
        assert!(rt.scopes.is_dirty(scope));
    }

    #[test]
    fn equal_value_write_does_not_dirty() {
        let mut rt = Runtime::new();
        let scope = rt.scopes.create(0, ScopeId::NONE);
        let key = rt.signals.create(SignalValue::Int(1));
        rt.signals.subscribe(key, ReactiveContextId::Scope(scope));
        assert!(!rt.write_signal(key, SignalValue::Int(1)));
        assert!(!rt.scopes.is_dirty(scope));
    }

    #[test]
    fn memo_marks_dirty_and_cascades_to_downstream_scope() {
        let mut rt = Runtime::new();
        let scope = rt.scopes.create(0, ScopeId::NONE);
        let count = rt.signals.create(SignalValue::Int(5));
        let memo = rt.create_memo(ScopeId::NONE, SignalValue::Int(10));
        rt.signals.subscribe(count, ReactiveContextId::Memo(memo));
        rt.memos.set_dirty(memo, false);
        rt.signals.subscribe(rt.memos.output_key(memo), ReactiveContextId::Scope(scope));

        rt.write_signal(count, SignalValue::Int(8));
        assert!(rt.memos.is_dirty(memo));
        assert!(
            !rt.scopes.is_dirty(scope),
            "scope only dirties once the memo actually recomputes and its output changes"
        );

        rt.begin_compute(memo);
        rt.end_compute(memo, SignalValue::Int(16));
        assert!(!rt.memos.is_dirty(memo));
        assert!(rt.scopes.is_dirty(scope));
    }

    #[test]
    fn height_ordered_drain_parent_before_child() {
        let mut rt = Runtime::new();
        let parent = rt.scopes.create(0, ScopeId::NONE);
        let child = rt.scopes.create_child(parent);
        let key = rt.signals.create(SignalValue::Int(0));
        rt.signals.subscribe(key, ReactiveContextId::Scope(parent));
        rt.signals.subscribe(key, ReactiveContextId::Scope(child));

        rt.write_signal(key, SignalValue::Int(1));
        rt.collect_dirty();
        assert_eq!(rt.next_dirty(), Some(parent));
        assert_eq!(rt.next_dirty(), Some(child));
        assert_eq!(rt.next_dirty(), None);
    }

    #[test]
    fn destroy_memo_frees_both_signals_and_unsubscribes_inputs() {
        let mut rt = Runtime::new();
        let count = rt.signals.create(SignalValue::Int(0));
        let memo = rt.create_memo(ScopeId::NONE, SignalValue::Int(0));
        rt.signals.subscribe(count, ReactiveContextId::Memo(memo));
        rt.retrack_memo_inputs(memo, vec![count]);

        let signals_before = rt.signals.count();
        rt.destroy_memo(memo);
        assert_eq!(rt.signals.count(), signals_before - 2);
        assert!(!rt.signals.subscribers(count).contains(&ReactiveContextId::Memo(memo)));
    }
}
