//! Type classification.
//!
//! Decides what category a value falls in and whether it still has to go
//! through the abstraction engine. Pure, no recursion.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::snapshot::{Scalar, Snapshot};
use crate::value::{ArrayKey, Value};

static NUMERIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?\s*$").expect("valid numeric regex")
});

static METHOD_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid method name regex"));

/// Value category
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Kind {
    Null,
    Bool,
    Int,
    Float,
    String,
    Array,
    Object,
    Resource,
    Callable,
    Undefined,
    Recursion,
    /// Already abstracted array/object/resource/callable
    Abstraction,
}

/// Refinement of a [`Kind`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeHint {
    /// String that parses as a number
    Numeric,
    /// Resource whose handle has been closed
    ClosedResource,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypeInfo {
    pub kind: Kind,
    pub hint: Option<TypeHint>,
    pub needs_abstraction: bool,
}

impl TypeInfo {
    fn done(kind: Kind) -> Self {
        Self {
            kind,
            hint: None,
            needs_abstraction: false,
        }
    }

    fn raw(kind: Kind) -> Self {
        Self {
            kind,
            hint: None,
            needs_abstraction: true,
        }
    }

    fn with_hint(mut self, hint: TypeHint) -> Self {
        self.hint = Some(hint);
        self
    }
}

/// Classify a value
pub fn classify(value: &Value) -> TypeInfo {
    match value {
        Value::Null => TypeInfo::done(Kind::Null),
        Value::Bool(_) => TypeInfo::done(Kind::Bool),
        Value::Int(_) => TypeInfo::done(Kind::Int),
        Value::Float(_) => TypeInfo::done(Kind::Float),
        Value::String(s) => {
            let info = TypeInfo::done(Kind::String);
            if is_numeric(s) {
                info.with_hint(TypeHint::Numeric)
            } else {
                info
            }
        }
        Value::Undefined => TypeInfo::done(Kind::Undefined),
        Value::Array(_) if is_callable_array(value) => TypeInfo::raw(Kind::Callable),
        Value::Array(_) => TypeInfo::raw(Kind::Array),
        Value::Object(_) => TypeInfo::raw(Kind::Object),
        Value::Resource(r) => {
            let info = TypeInfo::raw(Kind::Resource);
            if r.is_closed() {
                info.with_hint(TypeHint::ClosedResource)
            } else {
                info
            }
        }
        Value::Callable(_) => TypeInfo::raw(Kind::Callable),
        Value::Snapshot(snap) => classify_snapshot(snap),
    }
}

fn classify_snapshot(snap: &Snapshot) -> TypeInfo {
    match snap {
        Snapshot::Undefined => TypeInfo::done(Kind::Undefined),
        Snapshot::Recursion(_) => TypeInfo::done(Kind::Recursion),
        Snapshot::Primitive(scalar) => {
            let kind = match scalar {
                Scalar::Null => Kind::Null,
                Scalar::Bool(_) => Kind::Bool,
                Scalar::Int(_) => Kind::Int,
                Scalar::Float(_) => Kind::Float,
                Scalar::String(_) => Kind::String,
            };
            TypeInfo::done(kind)
        }
        _ => TypeInfo::done(Kind::Abstraction),
    }
}

/// Whether the value must still be abstracted
pub fn needs_abstraction(value: &Value) -> bool {
    classify(value).needs_abstraction
}

pub fn is_numeric(s: &str) -> bool {
    NUMERIC_RE.is_match(s)
}

/// `[object, "method"]` shape test
pub fn is_callable_array(value: &Value) -> bool {
    let Value::Array(arr) = value else {
        return false;
    };
    if arr.len() != 2 {
        return false;
    }
    let target = arr.get(ArrayKey::Int(0));
    let method = arr.get(ArrayKey::Int(1));
    matches!(
        (target, method),
        (Some(Value::Object(_)), Some(Value::String(ref m))) if METHOD_NAME_RE.is_match(m)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{ArraySnapshot, RecursionMarker};
    use crate::value::{Object, Resource};

    #[test]
    fn test_primitives_need_no_abstraction() {
        for v in [
            Value::Null,
            Value::Bool(true),
            Value::Int(3),
            Value::Float(1.5),
            Value::from("x"),
        ] {
            assert!(!classify(&v).needs_abstraction, "{:?}", v);
        }
    }

    #[test]
    fn test_numeric_string_hint() {
        assert_eq!(classify(&Value::from("12.5")).hint, Some(TypeHint::Numeric));
        assert_eq!(classify(&Value::from(" -3e4")).hint, Some(TypeHint::Numeric));
        assert_eq!(classify(&Value::from("12px")).hint, None);
        assert_eq!(classify(&Value::from("")).hint, None);
    }

    #[test]
    fn test_marker_lookalike_strings_stay_strings() {
        let info = classify(&Value::from("\u{0}undefined\u{0}"));
        assert_eq!(info.kind, Kind::String);
    }

    #[test]
    fn test_raw_containers_need_abstraction() {
        assert_eq!(classify(&Value::list(vec![])).kind, Kind::Array);
        assert!(classify(&Object::new("Foo").into_value()).needs_abstraction);
        let res = classify(&Value::from(Resource::new(1, "stream")));
        assert!(res.needs_abstraction);
        assert_eq!(res.hint, None);
    }

    #[test]
    fn test_closed_resource_hint() {
        let info = classify(&Value::from(Resource::closed(4)));
        assert_eq!(info.kind, Kind::Resource);
        assert_eq!(info.hint, Some(TypeHint::ClosedResource));
    }

    #[test]
    fn test_callable_array_shape() {
        let obj = Object::new("Foo").into_value();
        let callable = Value::list(vec![obj.clone(), Value::from("bar")]);
        assert_eq!(classify(&callable).kind, Kind::Callable);

        let not_method = Value::list(vec![obj.clone(), Value::from("not a method")]);
        assert_eq!(classify(&not_method).kind, Kind::Array);

        let three = Value::list(vec![obj, Value::from("bar"), Value::Null]);
        assert_eq!(classify(&three).kind, Kind::Array);
    }

    #[test]
    fn test_already_abstracted_is_idempotent() {
        let snap = Snapshot::Array(ArraySnapshot::default());
        let info = classify(&Value::from(snap));
        assert_eq!(info.kind, Kind::Abstraction);
        assert!(!info.needs_abstraction);

        let rec = Value::from(Snapshot::Recursion(RecursionMarker { class_name: None }));
        assert_eq!(classify(&rec).kind, Kind::Recursion);
        assert_eq!(classify(&Value::from(Snapshot::Undefined)).kind, Kind::Undefined);
    }
}
