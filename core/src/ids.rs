//! Index newtypes addressing the various arenas.
//!
//! Everything in this runtime is arena + integer id, never a pointer or an `Rc`. This
//! mirrors how `dioxus-core` addresses scopes and elements (`ScopeId(usize)`,
//! `ElementId(usize)`) and eliminates cyclic ownership between signals, memos,
//! scopes and effects.

/// Index into [`crate::signal::SignalStore`]. Recycled through a free list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SignalKey(pub u32);

/// Index into [`crate::scope::ScopeStore`]. `-1` names "no parent" (the root's parent).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(pub i32);

impl ScopeId {
    /// The sentinel used as a root scope's parent.
    pub const NONE: ScopeId = ScopeId(-1);

    pub fn is_none(self) -> bool {
        self.0 < 0
    }
}

/// Index into [`crate::memo::MemoStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MemoId(pub u32);

/// Index into [`crate::effect::EffectStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EffectId(pub u32);

/// Index into [`crate::template::TemplateRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TemplateId(pub u32);

/// Names a live DOM node. Id `0` is reserved for the mount root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ElementId(pub u32);

impl ElementId {
    pub const MOUNT_ROOT: ElementId = ElementId(0);
}

/// Index into [`crate::string_store::StringStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StringKey(pub u32);

/// Any consumer of the reactive graph that can be subscribed to a signal.
///
/// This is the systems-language stand-in for the source's implicit "current reader":
/// a scope re-render, a memo recompute, or an effect run. Keeping it as a plain enum
/// (rather than threading a `dyn Trait` through subscriber sets) keeps notification a
/// closed match with no dynamic dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReactiveContextId {
    Scope(ScopeId),
    Memo(MemoId),
    Effect(EffectId),
}
