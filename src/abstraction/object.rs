//! Object pipeline: seed, start hooks, populate, end hooks, sort.

use std::cmp::Ordering;

use tracing::{debug, trace};

use super::context::{Identity, TraversalContext};
use super::hooks::{HookContext, ObjectDraft, Propagation};
use super::Abstracter;
use crate::config::ObjectSort;
use crate::reflection::members;
use crate::snapshot::{MethodRecord, ObjectSnapshot, PropertyRecord, RecursionMarker, Snapshot};
use crate::value::{object_id, Instance, ObjectRef};

/// Class whose instances always get their methods collected
pub(crate) const CLOSURE_CLASS: &str = "Closure";
pub(crate) const CONSTRUCTOR: &str = "__construct";
pub(crate) const DEBUG_INFO: &str = "__debugInfo";

impl Abstracter {
    pub(super) fn abstract_object(
        &self,
        obj: &ObjectRef,
        method: &str,
        ctx: &TraversalContext,
    ) -> Snapshot {
        let class_name = obj.class_name().to_string();
        let id = Identity::Object(object_id(obj));
        if ctx.contains(id) {
            trace!(class = %class_name, "object recursion");
            return Snapshot::Recursion(RecursionMarker {
                class_name: Some(class_name),
            });
        }

        let hook_ctx = HookContext {
            instance: obj.as_ref(),
            method,
            reflector: self.reflector(),
            depth: ctx.depth(),
        };
        let child_ctx = ctx.descend(id);
        let mut draft = self.seed_draft(obj.as_ref(), method, ctx);

        let stopped = self.run_start_hooks(&mut draft, &hook_ctx) == Propagation::Stop;
        if stopped || draft.snapshot.is_excluded || draft.snapshot.is_max_depth {
            debug!(
                class = %class_name,
                excluded = draft.snapshot.is_excluded,
                max_depth = draft.snapshot.is_max_depth,
                "object returned as stub"
            );
            let mut snapshot = draft.snapshot;
            if let Some(values) = draft.traversal_values {
                snapshot.traversal_values = Some(self.abstract_entries(values, method, &child_ctx));
            }
            return Snapshot::Object(Box::new(snapshot));
        }

        let mut snapshot = self.populate(obj.as_ref(), draft, method, &child_ctx);
        for hook in &self.hooks {
            if hook.on_end(&mut snapshot, &hook_ctx) == Propagation::Stop {
                trace!(class = %class_name, "end hook stopped propagation");
                break;
            }
        }
        sort_members(&mut snapshot, self.config.object_sort);
        Snapshot::Object(Box::new(snapshot))
    }

    fn seed_draft(&self, instance: &dyn Instance, method: &str, ctx: &TraversalContext) -> ObjectDraft {
        let reflector = self.reflector();
        let class = instance.class_name();

        let mut snapshot = ObjectSnapshot::new(class);
        snapshot.implements = members::interfaces(reflector, class);
        snapshot.debug_method = method.to_string();
        snapshot.scope_class = ctx.scope_class().map(str::to_string);
        snapshot.collect_methods = self.config.collect_methods || class == CLOSURE_CLASS;
        snapshot.is_excluded = self.is_excluded(class);
        snapshot.is_max_depth = self.config.max_depth > 0 && ctx.depth() >= self.config.max_depth;

        ObjectDraft {
            snapshot,
            collect_property_values: true,
            use_debug_info: self.config.use_debug_info
                && members::has_method(reflector, class, DEBUG_INFO),
            property_overrides: Vec::new(),
            traversal_values: None,
        }
    }

    /// Whether the class, an ancestor, or an interface is configured as excluded
    fn is_excluded(&self, class: &str) -> bool {
        self.config
            .objects_exclude
            .iter()
            .any(|name| members::is_a(self.reflector(), class, name))
    }

    fn run_start_hooks(&self, draft: &mut ObjectDraft, ctx: &HookContext<'_>) -> Propagation {
        for hook in &self.hooks {
            if hook.on_start(draft, ctx) == Propagation::Stop {
                trace!(class = %draft.snapshot.class_name, "start hook stopped processing");
                return Propagation::Stop;
            }
        }
        Propagation::Continue
    }

    fn populate(
        &self,
        instance: &dyn Instance,
        draft: ObjectDraft,
        method: &str,
        child_ctx: &TraversalContext,
    ) -> ObjectSnapshot {
        let ObjectDraft {
            mut snapshot,
            collect_property_values,
            use_debug_info,
            property_overrides,
            traversal_values,
        } = draft;
        let reflector = self.reflector();
        let class = snapshot.class_name.clone();

        if self.config.collect_constants {
            let mut constants: Vec<(String, Snapshot)> = members::constants(reflector, &class)
                .into_iter()
                .map(|(name, value)| (name, self.abstract_in(&value, method, child_ctx)))
                .collect();
            if self.config.object_sort != ObjectSort::None {
                constants.sort_by(|a, b| a.0.cmp(&b.0));
            }
            snapshot.constants = constants;
        }

        snapshot.extends = members::ancestors(reflector, &class);
        snapshot.documentation = self
            .docs
            .parse_opt(reflector.doc_comment(&class))
            .without_tags();

        let pending = self.collect_properties(
            instance,
            &class,
            collect_property_values,
            use_debug_info,
            &property_overrides,
        );
        snapshot.properties = pending
            .into_iter()
            .map(|p| {
                let mut record = p.record;
                record.value = self.abstract_in(&p.raw, method, child_ctx);
                record
            })
            .collect();

        if let Some(values) = traversal_values {
            snapshot.traversal_values = Some(self.abstract_entries(values, method, child_ctx));
        }

        snapshot.methods = self.collect_methods(
            instance,
            &class,
            snapshot.collect_methods,
            collect_property_values,
            method,
            child_ctx,
        );
        snapshot
    }
}

// ============================================================================
// Sorting
// ============================================================================

fn sort_members(snapshot: &mut ObjectSnapshot, sort: ObjectSort) {
    match sort {
        ObjectSort::None => {}
        ObjectSort::Name => {
            snapshot.properties.sort_by(|a, b| name_order(&a.name, &b.name));
            snapshot.methods.sort_by(|a, b| {
                constructor_first(a, b).then_with(|| name_order(&a.name, &b.name))
            });
        }
        ObjectSort::Visibility => {
            snapshot.properties.sort_by(property_visibility_order);
            snapshot.methods.sort_by(|a, b| {
                constructor_first(a, b)
                    .then_with(|| a.visibility.cmp(&b.visibility))
                    .then_with(|| name_order(&a.name, &b.name))
            });
        }
    }
}

/// Case-insensitive, exact spelling breaks ties
fn name_order(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn constructor_first(a: &MethodRecord, b: &MethodRecord) -> Ordering {
    let a_ctor = a.name.eq_ignore_ascii_case(CONSTRUCTOR);
    let b_ctor = b.name.eq_ignore_ascii_case(CONSTRUCTOR);
    b_ctor.cmp(&a_ctor)
}

fn property_visibility_order(a: &PropertyRecord, b: &PropertyRecord) -> Ordering {
    a.primary_visibility()
        .cmp(&b.primary_visibility())
        .then_with(|| name_order(&a.name, &b.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Visibility;
    use pretty_assertions::assert_eq;

    fn names(snapshot: &ObjectSnapshot) -> (Vec<&str>, Vec<&str>) {
        (
            snapshot.properties.iter().map(|p| p.name.as_str()).collect(),
            snapshot.methods.iter().map(|m| m.name.as_str()).collect(),
        )
    }

    fn sample() -> ObjectSnapshot {
        let mut snapshot = ObjectSnapshot::new("Sample");
        snapshot.properties = vec![
            PropertyRecord::new("zeta", Visibility::Public),
            PropertyRecord::new("alpha", Visibility::Private),
            PropertyRecord::new("Beta", Visibility::Protected),
            PropertyRecord::new("gamma", Visibility::Public),
        ];
        snapshot.methods = vec![
            MethodRecord::new("run", Visibility::Public),
            MethodRecord::new("helper", Visibility::Private),
            MethodRecord::new("__construct", Visibility::Public),
            MethodRecord::new("check", Visibility::Protected),
        ];
        snapshot
    }

    #[test]
    fn test_sort_by_visibility() {
        let mut snapshot = sample();
        sort_members(&mut snapshot, ObjectSort::Visibility);
        let (props, methods) = names(&snapshot);
        assert_eq!(props, vec!["gamma", "zeta", "Beta", "alpha"]);
        assert_eq!(methods, vec!["__construct", "run", "check", "helper"]);
    }

    #[test]
    fn test_sort_by_name() {
        let mut snapshot = sample();
        sort_members(&mut snapshot, ObjectSort::Name);
        let (props, methods) = names(&snapshot);
        assert_eq!(props, vec!["alpha", "Beta", "gamma", "zeta"]);
        assert_eq!(methods, vec!["__construct", "check", "helper", "run"]);
    }

    #[test]
    fn test_no_sort_keeps_order() {
        let mut snapshot = sample();
        sort_members(&mut snapshot, ObjectSort::None);
        let (props, _) = names(&snapshot);
        assert_eq!(props, vec!["zeta", "alpha", "Beta", "gamma"]);
    }
}
