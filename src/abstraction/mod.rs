//! Object/value abstraction engine.
//!
//! [`Abstracter`] turns a live [`Value`] into a self-contained [`Snapshot`].
//! Primitives pass through; arrays are abstracted element by element;
//! objects go through the pipeline in [`object`]: seed a draft, run start
//! hooks, collect constants, properties and methods, run end hooks, sort.
//!
//! Cycles are cut with a per-path [`TraversalContext`]. Abstraction never
//! fails: anything the engine can't read becomes [`Snapshot::Undefined`].

mod context;
mod hooks;
mod methods;
mod object;
mod properties;

pub use context::{Identity, TraversalContext};
pub use hooks::{BuiltinObjects, HookContext, ObjectDraft, ObjectHook, Propagation};
pub use methods::MethodCache;

use std::rc::Rc;

use tracing::trace;

use crate::classify;
use crate::config::Config;
use crate::doc::DocCache;
use crate::reflection::Reflector;
use crate::snapshot::{
    ArraySnapshot, CallableSnapshot, RecursionMarker, ResourceSnapshot, Scalar, Snapshot,
};
use crate::value::{Array, ArrayEntries, ArrayKey, Callable, Resource, Value};

/// Shared abstraction engine; one per debug console.
pub struct Abstracter {
    config: Config,
    reflector: Rc<dyn Reflector>,
    docs: DocCache,
    hooks: Vec<Rc<dyn ObjectHook>>,
    method_cache: MethodCache,
}

impl Abstracter {
    pub fn new(config: Config, reflector: Rc<dyn Reflector>) -> Self {
        Self {
            config,
            reflector,
            docs: DocCache::new(),
            hooks: vec![Rc::new(BuiltinObjects)],
            method_cache: MethodCache::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn reflector(&self) -> &dyn Reflector {
        &*self.reflector
    }

    pub fn docs(&self) -> &DocCache {
        &self.docs
    }

    pub fn method_cache(&self) -> &MethodCache {
        &self.method_cache
    }

    /// Append a hook; hooks run in registration order
    pub fn add_hook(&mut self, hook: Rc<dyn ObjectHook>) {
        self.hooks.push(hook);
    }

    pub fn clear_caches(&self) {
        self.method_cache.clear();
        self.docs.clear();
    }

    /// Abstract a top-level value for the operation `method`
    pub fn abstract_value(&self, value: &Value, method: &str) -> Snapshot {
        self.abstract_in(value, method, &TraversalContext::new())
    }

    /// Abstract a top-level value as seen from inside `scope_class`
    pub fn abstract_in_scope(&self, value: &Value, method: &str, scope_class: &str) -> Snapshot {
        self.abstract_in(value, method, &TraversalContext::in_scope(scope_class))
    }

    /// Abstract a value somewhere below the top level
    pub fn abstract_in(&self, value: &Value, method: &str, ctx: &TraversalContext) -> Snapshot {
        match value {
            Value::Null => Snapshot::Primitive(Scalar::Null),
            Value::Bool(b) => Snapshot::Primitive(Scalar::Bool(*b)),
            Value::Int(i) => Snapshot::Primitive(Scalar::Int(*i)),
            Value::Float(x) => Snapshot::Primitive(Scalar::Float(*x)),
            Value::String(s) => Snapshot::Primitive(Scalar::String(s.clone())),
            Value::Undefined => Snapshot::Undefined,
            Value::Snapshot(s) => (**s).clone(),
            Value::Array(arr) => self.abstract_array(value, arr, method, ctx),
            Value::Object(obj) => self.abstract_object(obj, method, ctx),
            Value::Resource(res) => Snapshot::Resource(resource_snapshot(res)),
            Value::Callable(callable) => Snapshot::Callable(callable_snapshot(callable)),
        }
    }

    fn abstract_array(
        &self,
        value: &Value,
        arr: &Array,
        method: &str,
        ctx: &TraversalContext,
    ) -> Snapshot {
        if classify::is_callable_array(value) {
            if let (Some(Value::Object(target)), Some(Value::String(name))) =
                (arr.get(0i64), arr.get(1i64))
            {
                let class_name = target.class_name().to_string();
                return Snapshot::Callable(CallableSnapshot {
                    value: format!("{}::{}", class_name, name),
                    class_name,
                    method: name,
                });
            }
        }
        let id = Identity::Array(arr.id());
        if ctx.contains(id) {
            trace!(len = arr.len(), "array recursion");
            return Snapshot::Recursion(RecursionMarker { class_name: None });
        }
        let entries = self.abstract_entries(arr.entries(), method, &ctx.descend(id));
        Snapshot::Array(ArraySnapshot { entries })
    }

    pub(crate) fn abstract_entries(
        &self,
        entries: ArrayEntries,
        method: &str,
        ctx: &TraversalContext,
    ) -> Vec<(ArrayKey, Snapshot)> {
        entries
            .into_iter()
            .map(|(key, value)| (key, self.abstract_in(&value, method, ctx)))
            .collect()
    }
}

fn resource_snapshot(res: &Resource) -> ResourceSnapshot {
    let type_name = res.type_name.clone().unwrap_or_else(|| "Unknown".to_string());
    ResourceSnapshot {
        value: format!("Resource id #{}: {}", res.id, type_name),
        type_name,
    }
}

fn callable_snapshot(callable: &Callable) -> CallableSnapshot {
    let class_name = callable.class_name().to_string();
    CallableSnapshot {
        value: format!("{}::{}", class_name, callable.method),
        class_name,
        method: callable.method.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::ClassRegistry;
    use crate::value::Object;
    use pretty_assertions::assert_eq;

    fn abstracter() -> Abstracter {
        Abstracter::new(Config::default(), Rc::new(ClassRegistry::new()))
    }

    #[test]
    fn test_primitives_pass_through() {
        let abs = abstracter();
        assert_eq!(abs.abstract_value(&Value::Int(3), "log"), Snapshot::int(3));
        assert_eq!(
            abs.abstract_value(&Value::from("hi"), "log"),
            Snapshot::string("hi")
        );
        assert_eq!(
            abs.abstract_value(&Value::Undefined, "log"),
            Snapshot::Undefined
        );
    }

    #[test]
    fn test_snapshot_value_is_not_reabstracted() {
        let abs = abstracter();
        let snap = Snapshot::string("already");
        assert_eq!(abs.abstract_value(&Value::from(snap.clone()), "log"), snap);
    }

    #[test]
    fn test_self_containing_array() {
        let abs = abstracter();
        let arr = Array::new();
        arr.insert("a", 1);
        arr.insert("self", arr.clone());

        let snap = abs.abstract_value(&Value::Array(arr), "log");
        assert_eq!(snap.get("a"), Some(&Snapshot::int(1)));
        assert!(snap.get("self").is_some_and(Snapshot::is_recursion));
    }

    #[test]
    fn test_shared_array_in_sibling_slots_is_not_recursion() {
        let abs = abstracter();
        let shared = Array::list(vec![Value::Int(1)]);
        let outer = Array::list(vec![shared.clone().into(), shared.into()]);

        let snap = abs.abstract_value(&Value::Array(outer), "log");
        assert!(!snap.contains_marker());
    }

    #[test]
    fn test_resource_snapshot() {
        let abs = abstracter();
        let open = abs.abstract_value(&Value::Resource(Resource::new(4, "stream")), "log");
        let closed = abs.abstract_value(&Value::Resource(Resource::closed(5)), "log");
        match (open, closed) {
            (Snapshot::Resource(open), Snapshot::Resource(closed)) => {
                assert_eq!(open.value, "Resource id #4: stream");
                assert_eq!(closed.type_name, "Unknown");
            }
            other => panic!("expected resources, got {:?}", other),
        }
    }

    #[test]
    fn test_callable_array_becomes_callable() {
        let abs = abstracter();
        let obj = Object::new("Worker").into_ref();
        let value = Value::list(vec![Value::from(obj), Value::from("run")]);
        match abs.abstract_value(&value, "log") {
            Snapshot::Callable(c) => {
                assert_eq!(c.value, "Worker::run");
                assert_eq!(c.method, "run");
            }
            other => panic!("expected callable, got {:?}", other),
        }
    }
}
