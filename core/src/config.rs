//! Capacity hints for the arenas.
//!
//! Dioxus's scheduler preallocates its component and element slabs ("Preallocate
//! 2000 elements and 100 scopes to avoid dynamic allocation", `scheduler.rs`). We
//! expose the same knob here rather than hardcoding it, since this runtime has no
//! heuristics engine watching real traffic to size these automatically.
#[derive(Clone, Copy, Debug)]
pub struct RuntimeConfig {
    pub scope_capacity: usize,
    pub signal_capacity: usize,
    pub element_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            scope_capacity: 100,
            signal_capacity: 256,
            element_capacity: 2000,
        }
    }
}
