//! Serializable abstraction records.
//!
//! A [`Snapshot`] is what a live [`Value`](crate::value::Value) becomes once
//! it has been abstracted: a self-contained tree with no references back into
//! the runtime. Markers for "not present" and "already visited" are enum
//! variants, so they can never collide with user data.

use serde::{Deserialize, Serialize};

use crate::doc::DocBlock;
use crate::value::ArrayKey;

// ============================================================================
// Snapshot
// ============================================================================

/// Pass-through primitive
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// Abstracted value
///
/// Serializes adjacently tagged: `{"kind": "object", "value": {...}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Snapshot {
    Primitive(Scalar),
    Undefined,
    Recursion(RecursionMarker),
    Array(ArraySnapshot),
    Object(Box<ObjectSnapshot>),
    Resource(ResourceSnapshot),
    Callable(CallableSnapshot),
}

impl Snapshot {
    pub fn null() -> Self {
        Snapshot::Primitive(Scalar::Null)
    }

    pub fn string(s: impl Into<String>) -> Self {
        Snapshot::Primitive(Scalar::String(s.into()))
    }

    pub fn int(i: i64) -> Self {
        Snapshot::Primitive(Scalar::Int(i))
    }

    /// Array element lookup
    pub fn get(&self, key: impl Into<ArrayKey>) -> Option<&Snapshot> {
        match self {
            Snapshot::Array(arr) => arr.get(&key.into()),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Snapshot::Primitive(Scalar::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Snapshot::Primitive(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectSnapshot> {
        match self {
            Snapshot::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArraySnapshot> {
        match self {
            Snapshot::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn is_recursion(&self) -> bool {
        matches!(self, Snapshot::Recursion(_))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Snapshot::Undefined)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Snapshot::Primitive(_))
    }

    /// Whether a recursion or undefined marker appears anywhere in the tree
    pub fn contains_marker(&self) -> bool {
        match self {
            Snapshot::Undefined | Snapshot::Recursion(_) => true,
            Snapshot::Array(arr) => arr.entries.iter().any(|(_, v)| v.contains_marker()),
            Snapshot::Object(obj) => {
                obj.properties.iter().any(|p| p.value.contains_marker())
                    || obj.constants.iter().any(|(_, v)| v.contains_marker())
            }
            _ => false,
        }
    }
}

impl From<Scalar> for Snapshot {
    fn from(s: Scalar) -> Self {
        Snapshot::Primitive(s)
    }
}

/// Emitted in place of an object or array already on the current path
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecursionMarker {
    /// `None` for arrays
    pub class_name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ArraySnapshot {
    pub entries: Vec<(ArrayKey, Snapshot)>,
}

impl ArraySnapshot {
    pub fn get(&self, key: &ArrayKey) -> Option<&Snapshot> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSnapshot {
    pub type_name: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallableSnapshot {
    pub class_name: String,
    pub method: String,
    pub value: String,
}

// ============================================================================
// Objects
// ============================================================================

/// Member visibility, in display order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Visibility {
    Public,
    Protected,
    Private,
    Magic,
    MagicRead,
    MagicWrite,
    Debug,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
            Visibility::Magic => "magic",
            Visibility::MagicRead => "magic-read",
            Visibility::MagicWrite => "magic-write",
            Visibility::Debug => "debug",
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a property's value came from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueSource {
    #[default]
    Declared,
    RuntimeOverride,
    DebugInfoHook,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRecord {
    pub name: String,
    pub value: Snapshot,
    pub value_source: ValueSource,
    #[serde(rename = "type")]
    pub type_hint: Option<String>,
    pub description: Option<String>,
    pub visibility: Vec<Visibility>,
    pub is_static: bool,
    pub declaring_class: Option<String>,
    pub overridden_from: Option<String>,
    pub force_show: bool,
    pub is_excluded: bool,
}

impl PropertyRecord {
    pub fn new(name: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            name: name.into(),
            value: Snapshot::Undefined,
            value_source: ValueSource::Declared,
            type_hint: None,
            description: None,
            visibility: vec![visibility],
            is_static: false,
            declaring_class: None,
            overridden_from: None,
            force_show: false,
            is_excluded: false,
        }
    }

    pub fn has_visibility(&self, vis: Visibility) -> bool {
        self.visibility.contains(&vis)
    }

    /// Lowest-ranked visibility, used for sorting
    pub fn primary_visibility(&self) -> Visibility {
        self.visibility
            .iter()
            .min()
            .copied()
            .unwrap_or(Visibility::Public)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub type_hint: Option<String>,
    pub description: Option<String>,
    /// `Undefined` when the parameter has no default
    pub default_value: Snapshot,
    pub default_is_constant: bool,
    pub is_optional: bool,
    pub is_variadic: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodRecord {
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_final: bool,
    pub is_deprecated: bool,
    pub declaring_class: Option<String>,
    pub implements_interface: Option<String>,
    pub params: Vec<ParamRecord>,
    pub return_type: Option<String>,
    pub documentation: DocBlock,
    /// Only for the stringify method
    pub return_value: Option<Snapshot>,
}

impl MethodRecord {
    pub fn new(name: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            name: name.into(),
            visibility,
            is_static: false,
            is_abstract: false,
            is_final: false,
            is_deprecated: false,
            declaring_class: None,
            implements_interface: None,
            params: Vec::new(),
            return_type: None,
            documentation: DocBlock::default(),
            return_value: None,
        }
    }
}

/// Snapshot of an object instance
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSnapshot {
    pub class_name: String,
    pub extends: Vec<String>,
    pub implements: Vec<String>,
    pub constants: Vec<(String, Snapshot)>,
    pub properties: Vec<PropertyRecord>,
    pub methods: Vec<MethodRecord>,
    /// Whether `methods` is the complete list or only the minimal set
    pub collect_methods: bool,
    pub documentation: DocBlock,
    pub is_excluded: bool,
    pub is_max_depth: bool,
    pub stringified_value: Option<String>,
    pub scope_class: Option<String>,
    pub traversal_values: Option<Vec<(ArrayKey, Snapshot)>>,
    /// Operation that requested the abstraction
    pub debug_method: String,
}

impl ObjectSnapshot {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Default::default()
        }
    }

    pub fn property(&self, name: &str) -> Option<&PropertyRecord> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn property_mut(&mut self, name: &str) -> Option<&mut PropertyRecord> {
        self.properties.iter_mut().find(|p| p.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&MethodRecord> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn constant(&self, name: &str) -> Option<&Snapshot> {
        self.constants.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Whether the class is, extends or implements `name`
    pub fn is_a(&self, name: &str) -> bool {
        self.class_name == name
            || self.extends.iter().any(|c| c == name)
            || self.implements.iter().any(|i| i == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_visibility_ordering() {
        let mut v = vec![
            Visibility::Debug,
            Visibility::MagicRead,
            Visibility::Public,
            Visibility::Private,
            Visibility::Magic,
            Visibility::Protected,
            Visibility::MagicWrite,
        ];
        v.sort();
        assert_eq!(
            v,
            vec![
                Visibility::Public,
                Visibility::Protected,
                Visibility::Private,
                Visibility::Magic,
                Visibility::MagicRead,
                Visibility::MagicWrite,
                Visibility::Debug,
            ]
        );
    }

    #[test]
    fn test_markers_serialize_distinctly_from_strings() {
        let undefined = serde_json::to_value(Snapshot::Undefined).unwrap();
        let string = serde_json::to_value(Snapshot::string("undefined")).unwrap();
        assert_eq!(undefined, serde_json::json!({"kind": "undefined"}));
        assert_eq!(
            string,
            serde_json::json!({"kind": "primitive", "value": "undefined"})
        );
    }

    #[test]
    fn test_snapshot_json_roundtrip() {
        let mut obj = ObjectSnapshot::new("Foo");
        let mut prop = PropertyRecord::new("bar", Visibility::Protected);
        prop.value = Snapshot::Array(ArraySnapshot {
            entries: vec![(ArrayKey::from("k"), Snapshot::int(1))],
        });
        obj.properties.push(prop);
        let snap = Snapshot::Object(Box::new(obj));

        let json = serde_json::to_string(&snap).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }

    #[test]
    fn test_contains_marker() {
        let arr = Snapshot::Array(ArraySnapshot {
            entries: vec![
                (ArrayKey::from(0usize), Snapshot::int(1)),
                (
                    ArrayKey::from(1usize),
                    Snapshot::Recursion(RecursionMarker { class_name: None }),
                ),
            ],
        });
        assert!(arr.contains_marker());
        assert!(!Snapshot::int(3).contains_marker());
    }
}
