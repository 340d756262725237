//! Property collection.
//!
//! Sources are applied in a fixed order so the winner for a name is
//! deterministic: declared properties (most-derived first), dynamic runtime
//! properties, runtime overrides, doc-declared magic properties, and last the
//! object's own debug-info description. Raw values stay pending until the
//! caller abstracts them under the child context.

use tracing::trace;

use super::Abstracter;
use crate::doc::PropertyAccess;
use crate::reflection::{members, PropertyDef};
use crate::snapshot::{PropertyRecord, ValueSource, Visibility};
use crate::value::{Instance, Value};

const MAGIC_GET: &str = "__get";

pub(super) struct PendingProperty {
    pub record: PropertyRecord,
    pub raw: Value,
    /// Class holding the winning declaration
    declared_in: String,
}

impl Abstracter {
    pub(super) fn collect_properties(
        &self,
        instance: &dyn Instance,
        class: &str,
        collect_values: bool,
        use_debug_info: bool,
        overrides: &[(String, Value)],
    ) -> Vec<PendingProperty> {
        let mut props: Vec<PendingProperty> = Vec::new();

        for (declaring, def) in members::properties(self.reflector(), class) {
            if let Some(existing) = props.iter_mut().find(|p| p.record.name == def.name) {
                if def.visibility != Visibility::Private && existing.record.overridden_from.is_none()
                {
                    existing.record.overridden_from = Some(declaring);
                    existing.record.declaring_class = Some(existing.declared_in.clone());
                }
                continue;
            }
            props.push(self.declared_property(instance, class, declaring, def, collect_values));
        }

        if collect_values {
            for (name, raw) in instance.properties() {
                if props.iter().any(|p| p.record.name == name) {
                    continue;
                }
                props.push(PendingProperty {
                    record: PropertyRecord::new(name, Visibility::Public),
                    raw,
                    declared_in: class.to_string(),
                });
            }
        }

        for (name, value) in overrides {
            match props.iter_mut().find(|p| p.record.name == *name) {
                Some(existing) => {
                    existing.raw = value.clone();
                    existing.record.value_source = ValueSource::RuntimeOverride;
                }
                None => {
                    let mut record = PropertyRecord::new(name.clone(), Visibility::Public);
                    record.value_source = ValueSource::RuntimeOverride;
                    props.push(PendingProperty {
                        record,
                        raw: value.clone(),
                        declared_in: class.to_string(),
                    });
                }
            }
        }

        self.add_magic_properties(class, &mut props);

        if use_debug_info && collect_values {
            if let Some(info) = instance.debug_info() {
                merge_debug_info(class, &mut props, info);
            }
        }
        props
    }

    fn declared_property(
        &self,
        instance: &dyn Instance,
        class: &str,
        declaring: String,
        def: &PropertyDef,
        collect_values: bool,
    ) -> PendingProperty {
        let doc = self.docs.parse_opt(def.doc.as_deref());
        let var = doc.var_tag(&def.name);

        let mut record = PropertyRecord::new(def.name.clone(), def.visibility);
        record.is_static = def.is_static;
        record.type_hint = def
            .type_hint
            .clone()
            .or_else(|| var.and_then(|v| v.type_hint.clone()));
        record.description = if doc.summary.is_empty() {
            var.and_then(|v| v.description.clone())
        } else {
            Some(doc.summary.clone())
        };
        if declaring != class {
            record.declaring_class = Some(declaring.clone());
        }

        let raw = if !collect_values {
            Value::Undefined
        } else if def.is_static {
            def.static_value.clone().unwrap_or(Value::Null)
        } else {
            instance.property(&def.name).unwrap_or(Value::Undefined)
        };
        PendingProperty {
            record,
            raw,
            declared_in: declaring,
        }
    }

    /// `@property`, `@property-read` and `@property-write` tags from the class
    /// doc, and from ancestor docs when a magic getter is present
    fn add_magic_properties(&self, class: &str, props: &mut Vec<PendingProperty>) {
        let reflector = self.reflector();
        let sources = if members::has_method(reflector, class, MAGIC_GET) {
            members::lineage(reflector, class)
        } else {
            vec![class.to_string()]
        };

        for source in sources {
            let doc = self.docs.parse_opt(reflector.doc_comment(&source));
            for tag in doc.property_tags() {
                if let Some(existing) = props.iter_mut().find(|p| p.record.name == tag.name) {
                    if existing.record.type_hint.is_none() {
                        existing.record.type_hint = tag.type_hint.clone();
                    }
                    if existing.record.description.is_none() {
                        existing.record.description = tag.description.clone();
                    }
                    continue;
                }
                let visibility = match tag.access {
                    PropertyAccess::ReadWrite => Visibility::Magic,
                    PropertyAccess::Read => Visibility::MagicRead,
                    PropertyAccess::Write => Visibility::MagicWrite,
                };
                let mut record = PropertyRecord::new(tag.name.clone(), visibility);
                record.type_hint = tag.type_hint.clone();
                record.description = tag.description.clone();
                if source != class {
                    record.declaring_class = Some(source.clone());
                }
                props.push(PendingProperty {
                    record,
                    raw: Value::Undefined,
                    declared_in: source.clone(),
                });
            }
        }
    }
}

/// Apply an object's own debug-info description.
///
/// Listed names win over reflected values (unless overridden at runtime);
/// anything the description leaves out is marked excluded, except private
/// properties inherited from an ancestor. Names it adds become `debug`
/// visibility records.
fn merge_debug_info(class: &str, props: &mut Vec<PendingProperty>, info: Vec<(String, Value)>) {
    let mut remaining = info;
    for prop in props.iter_mut() {
        let listed = remaining.iter().position(|(n, _)| *n == prop.record.name);
        if prop.record.value_source == ValueSource::RuntimeOverride {
            if let Some(idx) = listed {
                remaining.remove(idx);
            }
            continue;
        }
        match listed {
            Some(idx) => {
                let (_, value) = remaining.remove(idx);
                if !value.same_as(&prop.raw) {
                    prop.raw = value;
                    prop.record.value_source = ValueSource::DebugInfoHook;
                }
            }
            None => {
                let inherited_private =
                    prop.record.has_visibility(Visibility::Private) && prop.declared_in != class;
                if !inherited_private {
                    trace!(property = %prop.record.name, "excluded by debug info");
                    prop.record.is_excluded = true;
                }
            }
        }
    }
    for (name, raw) in remaining {
        let mut record = PropertyRecord::new(name, Visibility::Debug);
        record.value_source = ValueSource::DebugInfoHook;
        props.push(PendingProperty {
            record,
            raw,
            declared_in: class.to_string(),
        });
    }
}
