//! Extension points around object abstraction.
//!
//! Hooks are registered in order on the [`Abstracter`](super::Abstracter).
//! `on_start` sees a cheap draft before any property is read; `on_end` sees
//! the fully populated snapshot. Returning [`Propagation::Stop`] skips the
//! remaining hooks, and from `on_start` also ends processing of the object.

use crate::reflection::Reflector;
use crate::snapshot::ObjectSnapshot;
use crate::value::{ArrayEntries, Instance, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Propagation {
    Continue,
    Stop,
}

/// Read-only information handed to every hook invocation
pub struct HookContext<'a> {
    pub instance: &'a dyn Instance,
    /// Operation that requested the abstraction (`log`, `table`, ...)
    pub method: &'a str,
    pub reflector: &'a dyn Reflector,
    pub depth: usize,
}

/// Object snapshot under construction plus engine scratch state.
///
/// Scratch fields never reach the final snapshot.
pub struct ObjectDraft {
    pub snapshot: ObjectSnapshot,
    /// When false, nothing is read from the live instance: no property
    /// values and no debug-info description
    pub collect_property_values: bool,
    pub use_debug_info: bool,
    /// Values that win over reflection and the debug-info hook
    pub property_overrides: Vec<(String, Value)>,
    /// Rows for tabular rendering; abstracted by the engine
    pub traversal_values: Option<ArrayEntries>,
}

impl ObjectDraft {
    pub fn exclude(&mut self) {
        self.snapshot.is_excluded = true;
    }

    pub fn override_property(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.property_overrides.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.property_overrides.push((name, value)),
        }
    }
}

pub trait ObjectHook {
    fn on_start(&self, _draft: &mut ObjectDraft, _ctx: &HookContext<'_>) -> Propagation {
        Propagation::Continue
    }

    fn on_end(&self, _snapshot: &mut ObjectSnapshot, _ctx: &HookContext<'_>) -> Propagation {
        Propagation::Continue
    }
}

/// Special cases for well-known runtime types; registered first on every
/// abstracter.
pub struct BuiltinObjects;

impl ObjectHook for BuiltinObjects {
    fn on_start(&self, draft: &mut ObjectDraft, ctx: &HookContext<'_>) -> Propagation {
        if draft.snapshot.is_a("DateTimeInterface") && draft.snapshot.stringified_value.is_none() {
            draft.snapshot.stringified_value = ctx.instance.to_display_string();
        }
        if ctx.method == "table"
            && draft.snapshot.is_a("Traversable")
            && draft.traversal_values.is_none()
        {
            draft.traversal_values = ctx.instance.iterate();
        }
        Propagation::Continue
    }
}
