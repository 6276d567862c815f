//! The facade a component body actually calls (spec §4.13).
//!
//! `ComponentContext` is the single-runtime, single-root-scope host: it owns a
//! [`Runtime`], the [`ElementIdAllocator`], and the current frame's [`VNodeStore`],
//! and exposes four surfaces over them — hooks, view construction, event handlers,
//! and frame mount/diff/flush. This is the same "one god object wiring the arenas
//! together for the call site" role `dioxus-core`'s `ScopeState`/`VirtualDom` split
//! plays, collapsed into one type since this runtime supports exactly one component
//! scope rather than a full tree.

use crate::create::CreateEngine;
use crate::diff::DiffEngine;
use crate::element::ElementIdAllocator;
use crate::error::{Result, RuntimeError};
use crate::ids::{EffectId, ElementId, MemoId, ScopeId, SignalKey, TemplateId};
use crate::protocol::MutationWriter;
use crate::runtime::Runtime;
use crate::scope::HookEntry;
use crate::signal::SignalValue;
use crate::template::Template;
use crate::vnode::{VNodeIx, VNodeStore};
use crate::config::RuntimeConfig;

/// Dense index into the handler table; never reused across a runtime's lifetime
/// (spec §4.13: handler ids come from the same "small integers, never recycled"
/// family as everything else this runtime hands out to a consumer).
pub type HandlerId = u32;

#[derive(Clone, Debug)]
enum HandlerAction {
    Add(SignalKey, i64),
    Sub(SignalKey, i64),
    Set(SignalKey, SignalValue),
    Toggle(SignalKey),
    /// Bound to a string signal's pair (value key, version key); the text payload
    /// arrives later via [`ComponentContext::dispatch_input_event`].
    InputSet(SignalKey, SignalKey),
    Custom(String),
}

/// Owns one component's reactive state, element ids, and current-frame VNode arena.
pub struct ComponentContext {
    pub runtime: Runtime,
    pub alloc: ElementIdAllocator,
    pub store: VNodeStore,
    root_scope: ScopeId,
    mounted_root: Option<VNodeIx>,
    handlers: Vec<HandlerAction>,
    last_flushed_scopes: Vec<ScopeId>,
}

impl Default for ComponentContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentContext {
    pub fn new() -> Self {
        let mut runtime = Runtime::new();
        let root_scope = runtime.scopes.create(0, ScopeId::NONE);
        Self {
            runtime,
            alloc: ElementIdAllocator::new(),
            store: VNodeStore::new(),
            root_scope,
            mounted_root: None,
            handlers: Vec::new(),
            last_flushed_scopes: Vec::new(),
        }
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        let element_capacity = config.element_capacity;
        let mut runtime = Runtime::with_config(config);
        let root_scope = runtime.scopes.create(0, ScopeId::NONE);
        Self {
            runtime,
            alloc: ElementIdAllocator::with_capacity(element_capacity),
            store: VNodeStore::new(),
            root_scope,
            mounted_root: None,
            handlers: Vec::new(),
            last_flushed_scopes: Vec::new(),
        }
    }

    pub fn root_scope(&self) -> ScopeId {
        self.root_scope
    }

    // --- hook surface ---
    //
    // Every `use_*` method reads the hook at the root scope's current cursor
    // position if one already exists there (later renders), or creates it via
    // `make` on the first render and appends it. `expected_tag` catches a hook
    // called in a different order than the previous render (spec §9, fatal).

    fn use_hook_slot(
        &mut self,
        expected_tag: &'static str,
        make: impl FnOnce(&mut Runtime) -> HookEntry,
    ) -> Result<HookEntry> {
        let scope = self.root_scope;
        let cursor = self.runtime.scopes.hook_cursor(scope);
        let count = self.runtime.scopes.hook_count(scope);
        let entry = if cursor < count {
            let entry = self.runtime.scopes.hook_value_at(scope, cursor);
            if entry.tag() != expected_tag {
                return Err(RuntimeError::HookTagMismatch {
                    scope,
                    cursor,
                    expected: expected_tag,
                    found: entry.tag(),
                });
            }
            entry
        } else {
            let entry = make(&mut self.runtime);
            self.runtime.scopes.push_hook(scope, entry);
            entry
        };
        self.runtime.scopes.advance_cursor(scope);
        Ok(entry)
    }

    pub fn use_signal(&mut self, initial: i64) -> Result<SignalKey> {
        match self.use_hook_slot("signal", |rt| HookEntry::Signal(rt.signals.create(SignalValue::Int(initial))))? {
            HookEntry::Signal(key) => Ok(key),
            _ => unreachable!("tag checked above"),
        }
    }

    pub fn use_signal_bool(&mut self, initial: bool) -> Result<SignalKey> {
        match self.use_hook_slot("signal_bool", |rt| {
            HookEntry::SignalBool(rt.signals.create(SignalValue::Bool(initial)))
        })? {
            HookEntry::SignalBool(key) => Ok(key),
            _ => unreachable!("tag checked above"),
        }
    }

    /// Returns the (value, version) signal pair backing a string hook; the version
    /// signal exists purely so subscribers can observe "the text changed" without
    /// the value signal itself carrying a `PartialEq`-comparable `String` payload
    /// (spec §4.2: signal payloads are scalars or a `StringKey`, never an inline
    /// `String`).
    pub fn use_signal_string(&mut self, initial: &str) -> Result<(SignalKey, SignalKey)> {
        let initial = initial.to_string();
        match self.use_hook_slot("signal_string", move |rt| {
            let str_key = rt.strings.create(initial);
            let value = rt.signals.create(SignalValue::Str(str_key));
            let version = rt.signals.create(SignalValue::Int(0));
            HookEntry::SignalString(value, version)
        })? {
            HookEntry::SignalString(value, version) => Ok((value, version)),
            _ => unreachable!("tag checked above"),
        }
    }

    pub fn use_memo(&mut self, initial: i64) -> Result<MemoId> {
        let scope = self.root_scope;
        match self.use_hook_slot("memo", move |rt| {
            HookEntry::Memo(rt.create_memo(scope, SignalValue::Int(initial)))
        })? {
            HookEntry::Memo(id) => Ok(id),
            _ => unreachable!("tag checked above"),
        }
    }

    pub fn use_effect(&mut self) -> Result<EffectId> {
        let scope = self.root_scope;
        match self.use_hook_slot("effect", move |rt| HookEntry::Effect(rt.effects.create(scope)))? {
            HookEntry::Effect(id) => Ok(id),
            _ => unreachable!("tag checked above"),
        }
    }

    /// Marks the end of the hook-declaring portion of a render. Only checks that
    /// every hook declared on a prior render was re-declared this time; it never
    /// needs to trim anything, since the hook list only grows on first render and
    /// every later render is expected to walk the exact same sequence.
    pub fn end_setup(&mut self) {
        let scope = self.root_scope;
        debug_assert_eq!(
            self.runtime.scopes.hook_cursor(scope),
            self.runtime.scopes.hook_count(scope),
            "fewer hooks declared this render than on the previous one"
        );
    }

    // --- non-hook constructors ---
    //
    // For signals/memos/effects created outside the positional hook sequence
    // (e.g. a dynamic number of list items) — no tag checking, no cursor.

    pub fn create_signal(&mut self, value: SignalValue) -> SignalKey {
        self.runtime.signals.create(value)
    }

    pub fn create_memo(&mut self, initial: SignalValue) -> MemoId {
        self.runtime.create_memo(self.root_scope, initial)
    }

    pub fn create_effect(&mut self) -> EffectId {
        self.runtime.effects.create(self.root_scope)
    }

    // --- view surface ---

    /// Interns a template tree, addressed from then on by the returned id. `name`
    /// is only for diagnostics — templates are addressed purely by id on the wire.
    pub fn register_template(&mut self, template: Template, name: &str) -> TemplateId {
        let id = self.runtime.templates.register(template);
        log::trace!("registered template {name:?} as {id:?}");
        id
    }

    /// Direct access to the current frame's VNode arena; building a tree is just a
    /// sequence of `push_*` calls against it (see `vnode::VNodeStore`).
    pub fn vnode_builder(&mut self) -> &mut VNodeStore {
        &mut self.store
    }

    // --- handler surface ---

    fn push_handler(&mut self, action: HandlerAction) -> HandlerId {
        let id = self.handlers.len() as u32;
        self.handlers.push(action);
        id
    }

    pub fn on_click_add(&mut self, signal: SignalKey, delta: i64) -> HandlerId {
        self.push_handler(HandlerAction::Add(signal, delta))
    }

    pub fn on_click_sub(&mut self, signal: SignalKey, delta: i64) -> HandlerId {
        self.push_handler(HandlerAction::Sub(signal, delta))
    }

    pub fn on_click_set(&mut self, signal: SignalKey, value: SignalValue) -> HandlerId {
        self.push_handler(HandlerAction::Set(signal, value))
    }

    pub fn on_click_toggle(&mut self, signal: SignalKey) -> HandlerId {
        self.push_handler(HandlerAction::Toggle(signal))
    }

    /// Registers a handler bound to a string hook's (value, version) pair. Unlike
    /// the click handlers, this one carries no value of its own — the actual text
    /// arrives at dispatch time via [`Self::dispatch_input_event`].
    pub fn on_input_set(&mut self, value_signal: SignalKey, version_signal: SignalKey) -> HandlerId {
        self.push_handler(HandlerAction::InputSet(value_signal, version_signal))
    }

    pub fn on_event_custom(&mut self, name: impl Into<String>) -> HandlerId {
        self.push_handler(HandlerAction::Custom(name.into()))
    }

    /// Applies a click-family handler. `event_type` is accepted for parity with
    /// the interpreter's event envelope but isn't branched on: each handler id is
    /// already bound to exactly one action at registration time. Returns whether
    /// the bound signal's value actually changed.
    pub fn dispatch_event(&mut self, handler: HandlerId, _event_type: &str) -> Result<bool> {
        match self.handlers.get(handler as usize).cloned() {
            Some(HandlerAction::Add(sig, delta)) => {
                let cur = self.runtime.signals.peek(sig).as_int().expect("Add handler bound to a non-int signal");
                Ok(self.runtime.write_signal(sig, SignalValue::Int(cur + delta)))
            }
            Some(HandlerAction::Sub(sig, delta)) => {
                let cur = self.runtime.signals.peek(sig).as_int().expect("Sub handler bound to a non-int signal");
                Ok(self.runtime.write_signal(sig, SignalValue::Int(cur - delta)))
            }
            Some(HandlerAction::Set(sig, value)) => Ok(self.runtime.write_signal(sig, value)),
            Some(HandlerAction::Toggle(sig)) => {
                let cur = self.runtime.signals.peek(sig).as_bool().expect("Toggle handler bound to a non-bool signal");
                Ok(self.runtime.write_signal(sig, SignalValue::Bool(!cur)))
            }
            Some(HandlerAction::InputSet(..)) | Some(HandlerAction::Custom(_)) => Ok(false),
            None => Err(RuntimeError::UnknownHandler(handler)),
        }
    }

    /// Writes `text` into the string signal an `InputSet` handler is bound to and
    /// bumps its version signal. The only dispatch path that carries a payload.
    pub fn dispatch_input_event(&mut self, handler: HandlerId, text: &str) -> Result<bool> {
        match self.handlers.get(handler as usize).cloned() {
            Some(HandlerAction::InputSet(value_sig, version_sig)) => {
                let key = self
                    .runtime
                    .signals
                    .peek(value_sig)
                    .as_str_key()
                    .expect("InputSet handler bound to a non-string signal");
                self.runtime.strings.write(key, text);
                let version = self.runtime.signals.peek(version_sig).as_int().unwrap_or(0);
                Ok(self.runtime.write_signal(version_sig, SignalValue::Int(version + 1)))
            }
            Some(_) => Ok(false),
            None => Err(RuntimeError::UnknownHandler(handler)),
        }
    }

    // --- frame surface ---

    /// First mount: creates `vnode_idx` and appends its roots under the mount
    /// root (element id 0). Returns the total bytes written, including the `End`
    /// sentinel.
    pub fn mount(&mut self, mut writer: MutationWriter, vnode_idx: VNodeIx) -> Result<usize> {
        let root_count = CreateEngine::create(&mut writer, &mut self.alloc, &self.runtime.templates, &mut self.store, vnode_idx)?;
        writer.append_children(ElementId::MOUNT_ROOT.0, root_count as u32)?;
        log::debug!("mounted {root_count} root(s)");
        self.mounted_root = Some(vnode_idx);
        writer.finalize()
    }

    /// Diffs `new_vnode_idx` against whatever was mounted or last diffed, writing
    /// into `writer` without finalizing it — callers that want to batch several
    /// diffs into one buffer call this directly; [`Self::flush`] is the common
    /// one-shot convenience.
    pub fn diff(&mut self, writer: &mut MutationWriter, new_vnode_idx: VNodeIx) -> Result<()> {
        let old = self.mounted_root.expect("diff called before any mount");
        DiffEngine::diff(writer, &mut self.alloc, &self.runtime.templates, &mut self.store, old, new_vnode_idx)?;
        self.mounted_root = Some(new_vnode_idx);
        Ok(())
    }

    pub fn finalize(&self, mut writer: MutationWriter) -> Result<usize> {
        writer.finalize()
    }

    /// Diffs and finalizes in one call, first tagging the buffer with every
    /// scope the dirty queue drained this pass (`MutationWriter::mark_scope_dirty`)
    /// so a test can confirm which scopes actually produced the mutations inside.
    /// `flush` owns and finalizes the writer itself, so the drained scopes are
    /// additionally cached on `self` — see [`Self::last_flushed_scopes`].
    pub fn flush(&mut self, mut writer: MutationWriter, new_vnode_idx: VNodeIx) -> Result<usize> {
        self.last_flushed_scopes = self.consume_dirty();
        for &scope in &self.last_flushed_scopes {
            writer.mark_scope_dirty(scope.0 as u32);
        }
        self.diff(&mut writer, new_vnode_idx)?;
        self.finalize(writer)
    }

    /// The scopes the dirty queue drained during the most recent [`Self::flush`]
    /// call, for test introspection (mirrors `MutationsVec::dirty_scopes`).
    pub fn last_flushed_scopes(&self) -> &[ScopeId] {
        &self.last_flushed_scopes
    }

    pub fn has_dirty(&self) -> bool {
        self.runtime.has_dirty()
    }

    pub fn collect_dirty(&mut self) {
        self.runtime.collect_dirty();
    }

    pub fn next_dirty(&mut self) -> Option<ScopeId> {
        self.runtime.next_dirty()
    }

    /// Drains the whole dirty queue in height order; a convenience over calling
    /// `next_dirty` in a loop for hosts that want the full batch at once.
    pub fn consume_dirty(&mut self) -> Vec<ScopeId> {
        let mut out = Vec::new();
        while let Some(scope) = self.runtime.next_dirty() {
            out.push(scope);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ReactiveContextId;
    use crate::template::Template;

    fn counter_template() -> Template {
        let mut b = Template::builder();
        let text = b.dynamic_text(0);
        let span = b.element(1, vec![text], vec![]);
        let plus_click = b.dynamic_attr(0, "click", 0);
        let plus = b.element(12, vec![], vec![plus_click]);
        let div = b.element(0, vec![span, plus], vec![]);
        b.root(div);
        b.finish()
    }

    #[test]
    fn hook_cursor_is_stable_across_renders() {
        let mut ctx = ComponentContext::new();
        ctx.runtime.begin_render(ctx.root_scope());
        let a = ctx.use_signal(0).unwrap();
        ctx.end_setup();
        ctx.runtime.end_render(ctx.root_scope());

        ctx.runtime.begin_render(ctx.root_scope());
        let b = ctx.use_signal(99).unwrap();
        ctx.end_setup();
        ctx.runtime.end_render(ctx.root_scope());

        assert_eq!(a, b, "second render must reuse the existing signal, not the fresh initial value");
    }

    #[test]
    fn hook_tag_mismatch_is_reported() {
        let mut ctx = ComponentContext::new();
        ctx.runtime.begin_render(ctx.root_scope());
        ctx.use_signal(0).unwrap();
        ctx.end_setup();
        ctx.runtime.end_render(ctx.root_scope());

        ctx.runtime.begin_render(ctx.root_scope());
        let err = ctx.use_signal_bool(false).unwrap_err();
        assert!(matches!(err, RuntimeError::HookTagMismatch { .. }));
    }

    #[test]
    fn click_add_handler_increments_bound_signal() {
        let mut ctx = ComponentContext::new();
        ctx.runtime.begin_render(ctx.root_scope());
        let count = ctx.use_signal(0).unwrap();
        ctx.end_setup();
        ctx.runtime.end_render(ctx.root_scope());

        let handler = ctx.on_click_add(count, 1);
        assert!(ctx.dispatch_event(handler, "click").unwrap());
        assert_eq!(ctx.runtime.signals.peek(count).as_int(), Some(1));
    }

    #[test]
    fn flush_records_which_scopes_the_dirty_queue_drained() {
        let mut ctx = ComponentContext::new();
        let tid = ctx.register_template(counter_template(), "counter");

        ctx.runtime.begin_render(ctx.root_scope());
        let count = ctx.use_signal(0).unwrap();
        ctx.runtime.signals.subscribe(count, ReactiveContextId::Scope(ctx.root_scope()));
        ctx.end_setup();
        ctx.runtime.end_render(ctx.root_scope());

        let vref = ctx.vnode_builder().push_template_ref(tid, None);
        ctx.vnode_builder().push_dynamic_text_node(vref, "Count: 0");
        let add = ctx.on_click_add(count, 1);
        ctx.vnode_builder().push_dynamic_attr_event(vref, add);
        let mut mount_buf = [0u8; 512];
        ctx.mount(MutationWriter::new(&mut mount_buf), vref).unwrap();

        assert!(!ctx.has_dirty(), "writing happens after mount, so nothing is dirty yet");
        ctx.dispatch_event(add, "click").unwrap();
        ctx.collect_dirty();
        assert!(ctx.has_dirty(), "the write above marked the subscribed root scope dirty");

        let vref2 = ctx.vnode_builder().push_template_ref(tid, None);
        ctx.vnode_builder().push_dynamic_text_node(vref2, "Count: 1");
        ctx.vnode_builder().push_dynamic_attr_event(vref2, add);
        let mut diff_buf = [0u8; 256];
        ctx.flush(MutationWriter::new(&mut diff_buf), vref2).unwrap();

        assert_eq!(ctx.last_flushed_scopes(), &[ctx.root_scope()]);
        assert!(!ctx.has_dirty(), "flush drains the queue it tags the buffer with");
    }

    #[test]
    fn unknown_handler_id_is_reported() {
        let mut ctx = ComponentContext::new();
        let err = ctx.dispatch_event(42, "click").unwrap_err();
        assert_eq!(err, RuntimeError::UnknownHandler(42));
    }

    #[test]
    fn mount_then_diff_reuses_the_template_root_id() {
        let mut ctx = ComponentContext::new();
        let tid = ctx.register_template(counter_template(), "counter");

        let vref = ctx.vnode_builder().push_template_ref(tid, None);
        ctx.vnode_builder().push_dynamic_text_node(vref, "Count: 0");
        ctx.vnode_builder().push_dynamic_attr_event(vref, 0);

        let mut buf = [0u8; 512];
        let writer = MutationWriter::new(&mut buf);
        ctx.mount(writer, vref).unwrap();
        let mounted_id = ctx.store.get_root_id(vref, 0);

        let vref2 = ctx.vnode_builder().push_template_ref(tid, None);
        ctx.vnode_builder().push_dynamic_text_node(vref2, "Count: 1");
        ctx.vnode_builder().push_dynamic_attr_event(vref2, 0);

        let mut buf2 = [0u8; 512];
        let writer2 = MutationWriter::new(&mut buf2);
        let n = ctx.flush(writer2, vref2).unwrap();
        let mut reader = crate::protocol::MutationReader::new(&buf2[..n]);
        let ops: Vec<_> = std::iter::from_fn(|| reader.next().transpose()).collect::<Result<Vec<_>>>().unwrap();
        assert!(ops.iter().any(|op| matches!(op, crate::protocol::Opcode::SetText { text, .. } if text == "Count: 1")));
        assert_eq!(ctx.store.get_root_id(vref2, 0), mounted_id);
    }
}
