//! Method collection.
//!
//! Full method metadata depends only on the class, so it is cached per class
//! name. The stringify method's live return value and any parameter default
//! that still needs abstraction are filled in per instance after the cache
//! lookup, under the caller's traversal context.

use std::cell::RefCell;
use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use super::context::TraversalContext;
use super::Abstracter;
use crate::classify;
use crate::doc::{DocBlock, MethodTag};
use crate::reflection::{members, MethodDef, ParamDef};
use crate::snapshot::{MethodRecord, ParamRecord, Scalar, Snapshot, Visibility};
use crate::value::Instance;

const STRINGIFY: &str = "__toString";
const MAGIC_GET: &str = "__get";
const MAGIC_SET: &str = "__set";
const MAGIC_CALL: &str = "__call";
const MAGIC_CALL_STATIC: &str = "__callStatic";

/// Methods recorded when full method collection is off
const MINIMAL_METHODS: [&str; 3] = [STRINGIFY, MAGIC_GET, MAGIC_SET];

/// Runtime interfaces whose methods are attributed to them
const WELL_KNOWN_INTERFACES: &[(&str, &[&str])] = &[
    (
        "ArrayAccess",
        &["offsetExists", "offsetGet", "offsetSet", "offsetUnset"],
    ),
    ("BackedEnum", &["from", "tryFrom"]),
    ("Countable", &["count"]),
    ("Iterator", &["current", "key", "next", "rewind", "valid"]),
    ("IteratorAggregate", &["getIterator"]),
    ("JsonSerializable", &["jsonSerialize"]),
    ("Serializable", &["serialize", "unserialize"]),
    ("Stringable", &["__toString"]),
    ("UnitEnum", &["cases"]),
];

/// `Foo::BAR`, `self::BAR` or a bare `UPPER_CASE` name
static CONSTANT_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\\?[A-Za-z_][A-Za-z0-9_\\]*::[A-Za-z_][A-Za-z0-9_]*|[A-Z_][A-Z0-9_]*)$")
        .expect("valid regex")
});

// ============================================================================
// Cache
// ============================================================================

/// Per-class method metadata
#[derive(Debug, Default)]
pub struct MethodCache {
    entries: RefCell<HashMap<String, Vec<MethodRecord>>>,
}

impl MethodCache {
    pub fn get(&self, class: &str) -> Option<Vec<MethodRecord>> {
        self.entries.borrow().get(class).cloned()
    }

    pub fn insert(&self, class: &str, methods: Vec<MethodRecord>) {
        self.entries.borrow_mut().insert(class.to_string(), methods);
    }

    pub fn contains(&self, class: &str) -> bool {
        self.entries.borrow().contains_key(class)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

// ============================================================================
// Collection
// ============================================================================

impl Abstracter {
    pub(super) fn collect_methods(
        &self,
        instance: &dyn Instance,
        class: &str,
        collect_all: bool,
        collect_values: bool,
        method: &str,
        ctx: &TraversalContext,
    ) -> Vec<MethodRecord> {
        let mut records = if collect_all {
            self.full_methods(class, method)
        } else {
            self.minimal_methods(class, method)
        };
        self.fill_param_defaults(class, &mut records, method, ctx);
        if collect_values {
            if let Some(stringify) = records.iter_mut().find(|m| m.name == STRINGIFY) {
                stringify.return_value = instance.to_display_string().map(Snapshot::string);
            }
        }
        records
    }

    fn full_methods(&self, class: &str, method: &str) -> Vec<MethodRecord> {
        if self.config.cache_methods {
            if let Some(cached) = self.method_cache.get(class) {
                trace!(class, "method cache hit");
                return cached;
            }
        }
        let implements = members::interfaces(self.reflector(), class);
        let mut records: Vec<MethodRecord> = members::methods(self.reflector(), class)
            .into_iter()
            .map(|(declaring, def)| self.method_record(class, &declaring, def, &implements, method))
            .collect();
        self.add_magic_methods(class, &mut records);

        if self.config.cache_methods {
            self.method_cache.insert(class, records.clone());
        }
        records
    }

    fn minimal_methods(&self, class: &str, method: &str) -> Vec<MethodRecord> {
        let implements = members::interfaces(self.reflector(), class);
        MINIMAL_METHODS
            .iter()
            .filter_map(|name| members::find_method(self.reflector(), class, name))
            .map(|(declaring, def)| self.method_record(class, &declaring, def, &implements, method))
            .collect()
    }

    /// Abstract object and array defaults under `ctx`, so a default that
    /// refers back into the current path ends in a recursion marker
    fn fill_param_defaults(
        &self,
        class: &str,
        records: &mut [MethodRecord],
        method: &str,
        ctx: &TraversalContext,
    ) {
        let reflector = self.reflector();
        let declared = members::methods(reflector, class);
        for record in records.iter_mut().filter(|m| m.visibility != Visibility::Magic) {
            let def = declared
                .iter()
                .find(|(_, d)| d.name == record.name)
                .map(|(_, d)| *d)
                .or_else(|| members::find_method(reflector, class, &record.name).map(|(_, d)| d));
            let Some(def) = def else {
                continue;
            };
            for (param, param_def) in record.params.iter_mut().zip(&def.params) {
                if let Some(value) = param_def
                    .default
                    .as_ref()
                    .filter(|v| classify::needs_abstraction(v))
                {
                    param.default_value = self.abstract_in(value, method, ctx);
                }
            }
        }
    }

    fn method_record(
        &self,
        class: &str,
        declaring: &str,
        def: &MethodDef,
        implements: &[String],
        method: &str,
    ) -> MethodRecord {
        let doc = self.method_doc(class, def);

        let mut record = MethodRecord::new(def.name.clone(), def.visibility);
        record.is_static = def.is_static;
        record.is_abstract = def.is_abstract;
        record.is_final = def.is_final;
        record.is_deprecated = doc.is_deprecated();
        if declaring != class {
            record.declaring_class = Some(declaring.to_string());
        }
        record.implements_interface = interface_for(&def.name, implements);
        record.return_type = def
            .return_type
            .clone()
            .or_else(|| doc.return_tag().map(|r| r.type_hint.clone()));
        record.params = def
            .params
            .iter()
            .map(|p| self.param_record(p, &doc, method))
            .collect();
        record.documentation = doc;
        record
    }

    /// Method doc with `{@inheritDoc}` resolved against the nearest
    /// ancestor or interface declaration that has real documentation
    fn method_doc(&self, class: &str, def: &MethodDef) -> DocBlock {
        let own = self.docs.parse_opt(def.doc.as_deref());
        if !own.is_inherit_doc() {
            return (*own).clone();
        }
        members::method_declarations(self.reflector(), class, &def.name)
            .into_iter()
            .filter(|(_, candidate)| !std::ptr::eq(*candidate, def))
            .map(|(_, candidate)| self.docs.parse_opt(candidate.doc.as_deref()))
            .find(|doc| !doc.is_empty() && !doc.is_inherit_doc())
            .map(|doc| (*doc).clone())
            .unwrap_or_else(|| (*own).clone())
    }

    fn param_record(&self, param: &ParamDef, doc: &DocBlock, method: &str) -> ParamRecord {
        let tag = doc.param(&param.name);
        // object and array defaults are filled per instance
        let default_value = match &param.default {
            Some(value) if !classify::needs_abstraction(value) => {
                self.abstract_in(value, method, &TraversalContext::new())
            }
            _ => Snapshot::Undefined,
        };
        ParamRecord {
            name: param.name.clone(),
            type_hint: param
                .type_hint
                .clone()
                .or_else(|| tag.and_then(|t| t.type_hint.clone())),
            description: tag.and_then(|t| t.description.clone()),
            default_value,
            default_is_constant: param.default_constant.is_some(),
            is_optional: param.is_optional(),
            is_variadic: param.is_variadic,
        }
    }

    /// `@method` tags, honored only when the class has a generic invoker
    fn add_magic_methods(&self, class: &str, records: &mut Vec<MethodRecord>) {
        let reflector = self.reflector();
        if !members::has_method(reflector, class, MAGIC_CALL)
            && !members::has_method(reflector, class, MAGIC_CALL_STATIC)
        {
            return;
        }
        for source in members::lineage(reflector, class) {
            let doc = self.docs.parse_opt(reflector.doc_comment(&source));
            for tag in doc.method_tags() {
                if records.iter().any(|m| m.name == tag.name) {
                    continue;
                }
                let mut record = magic_method(tag);
                if source != class {
                    record.declaring_class = Some(source.clone());
                }
                records.push(record);
            }
        }
    }
}

fn interface_for(method: &str, implements: &[String]) -> Option<String> {
    WELL_KNOWN_INTERFACES
        .iter()
        .find(|(iface, methods)| {
            methods.contains(&method) && implements.iter().any(|i| i == iface)
        })
        .map(|(iface, _)| iface.to_string())
}

fn magic_method(tag: &MethodTag) -> MethodRecord {
    let mut record = MethodRecord::new(tag.name.clone(), Visibility::Magic);
    record.is_static = tag.is_static;
    record.return_type = tag.return_type.clone();
    record.documentation = DocBlock {
        summary: tag.description.clone().unwrap_or_default(),
        ..Default::default()
    };
    record.params = tag
        .params
        .iter()
        .map(|p| {
            let (default_value, default_is_constant) = match p.default.as_deref() {
                Some(raw) => parse_default_literal(raw),
                None => (Snapshot::Undefined, false),
            };
            ParamRecord {
                name: p.name.clone(),
                type_hint: p.type_hint.clone(),
                description: None,
                is_optional: p.default.is_some() || p.is_variadic,
                is_variadic: p.is_variadic,
                default_value,
                default_is_constant,
            }
        })
        .collect();
    record
}

/// Interpret a default value written in a `@method` tag
fn parse_default_literal(raw: &str) -> (Snapshot, bool) {
    let raw = raw.trim();
    let unquoted = raw
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')));
    if let Some(s) = unquoted {
        return (Snapshot::string(s), false);
    }
    match raw.to_ascii_lowercase().as_str() {
        "null" => return (Snapshot::null(), false),
        "true" => return (Snapshot::Primitive(Scalar::Bool(true)), false),
        "false" => return (Snapshot::Primitive(Scalar::Bool(false)), false),
        _ => {}
    }
    if let Ok(i) = raw.parse::<i64>() {
        return (Snapshot::int(i), false);
    }
    if let Ok(x) = raw.parse::<f64>() {
        return (Snapshot::Primitive(Scalar::Float(x)), false);
    }
    (Snapshot::string(raw), CONSTANT_NAME_RE.is_match(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_default_literal() {
        assert_eq!(parse_default_literal("'abc'"), (Snapshot::string("abc"), false));
        assert_eq!(parse_default_literal("null"), (Snapshot::null(), false));
        assert_eq!(parse_default_literal("42"), (Snapshot::int(42), false));
        assert_eq!(
            parse_default_literal("self::MODE_FAST"),
            (Snapshot::string("self::MODE_FAST"), true)
        );
        assert_eq!(
            parse_default_literal("PHP_EOL"),
            (Snapshot::string("PHP_EOL"), true)
        );
        assert_eq!(parse_default_literal("[]"), (Snapshot::string("[]"), false));
    }

    #[test]
    fn test_interface_attribution_needs_the_interface() {
        let implements = vec!["Countable".to_string()];
        assert_eq!(
            interface_for("count", &implements),
            Some("Countable".to_string())
        );
        assert_eq!(interface_for("getIterator", &implements), None);
        assert_eq!(interface_for("count", &[]), None);
    }

    #[test]
    fn test_cache_roundtrip() {
        let cache = MethodCache::default();
        assert!(cache.is_empty());
        cache.insert("Foo", vec![MethodRecord::new("bar", Visibility::Public)]);
        assert!(cache.contains("Foo"));
        assert_eq!(cache.get("Foo").map(|m| m.len()), Some(1));
        cache.clear();
        assert_eq!(cache.len(), 0);
    }
}
