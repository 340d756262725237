//! Live input values.
//!
//! These are the values a caller hands to a logging operation. Arrays and
//! objects are shared, identity-bearing handles so that cyclic graphs can be
//! expressed; the abstraction engine turns them into [`Snapshot`]s that hold
//! no live references.
//!
//! [`Snapshot`]: crate::snapshot::Snapshot

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::snapshot::Snapshot;

// ============================================================================
// Array keys
// ============================================================================

/// Key of an ordered array entry
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArrayKey {
    Int(i64),
    String(String),
}

impl From<i64> for ArrayKey {
    fn from(i: i64) -> Self {
        ArrayKey::Int(i)
    }
}

impl From<i32> for ArrayKey {
    fn from(i: i32) -> Self {
        ArrayKey::Int(i64::from(i))
    }
}

impl From<usize> for ArrayKey {
    fn from(i: usize) -> Self {
        ArrayKey::Int(i as i64)
    }
}

impl From<&str> for ArrayKey {
    fn from(s: &str) -> Self {
        ArrayKey::String(s.to_string())
    }
}

impl From<String> for ArrayKey {
    fn from(s: String) -> Self {
        ArrayKey::String(s)
    }
}

impl fmt::Display for ArrayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayKey::Int(i) => write!(f, "{}", i),
            ArrayKey::String(s) => write!(f, "{}", s),
        }
    }
}

pub type ArrayEntries = Vec<(ArrayKey, Value)>;

// ============================================================================
// Arrays
// ============================================================================

/// Shared ordered array.
///
/// Cloning an `Array` clones the handle, not the entries; two handles to the
/// same storage have the same [`Array::id`].
#[derive(Clone, Default)]
pub struct Array(Rc<RefCell<ArrayEntries>>);

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: ArrayEntries) -> Self {
        Self(Rc::new(RefCell::new(entries)))
    }

    /// Build a list with sequential integer keys
    pub fn list(values: impl IntoIterator<Item = Value>) -> Self {
        let entries = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| (ArrayKey::from(i), v))
            .collect();
        Self::from_entries(entries)
    }

    /// Insert or overwrite in place
    pub fn insert(&self, key: impl Into<ArrayKey>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        let mut entries = self.0.borrow_mut();
        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => entries.push((key, value)),
        }
    }

    /// Append with the next integer key.
    ///
    /// Returns the key used, or `None` when the largest key is already
    /// `i64::MAX` and nothing was appended.
    pub fn push(&self, value: impl Into<Value>) -> Option<ArrayKey> {
        let largest = self
            .0
            .borrow()
            .iter()
            .filter_map(|(k, _)| match k {
                ArrayKey::Int(i) => Some(*i),
                ArrayKey::String(_) => None,
            })
            .max();
        let next = match largest {
            Some(i) => i.checked_add(1)?,
            None => 0,
        };
        self.0.borrow_mut().push((ArrayKey::Int(next), value.into()));
        Some(ArrayKey::Int(next))
    }

    pub fn get(&self, key: impl Into<ArrayKey>) -> Option<Value> {
        let key = key.into();
        self.0
            .borrow()
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.clone())
    }

    /// Copy of the entries; the internal borrow is released on return.
    pub fn entries(&self) -> ArrayEntries {
        self.0.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Pointer identity of the underlying storage
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub fn ptr_eq(&self, other: &Array) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Shallow on purpose: arrays may contain themselves.
        write!(f, "Array(len={})", self.len())
    }
}

// ============================================================================
// Objects
// ============================================================================

/// A live object instance.
///
/// Structure (declared properties, methods, constants) comes from a
/// [`Reflector`](crate::reflection::Reflector); the instance only answers
/// questions about its own runtime state.
pub trait Instance {
    fn class_name(&self) -> &str;

    /// Current value of a property (declared or dynamic)
    fn property(&self, name: &str) -> Option<Value>;

    /// All properties currently set on the instance, in definition order
    fn properties(&self) -> Vec<(String, Value)>;

    /// Custom name→value description (`__debugInfo`)
    fn debug_info(&self) -> Option<Vec<(String, Value)>> {
        None
    }

    /// Result of the designated stringify method (`__toString`)
    fn to_display_string(&self) -> Option<String> {
        None
    }

    /// Items yielded when the instance is traversed
    fn iterate(&self) -> Option<ArrayEntries> {
        None
    }
}

pub type ObjectRef = Rc<dyn Instance>;

/// Pointer identity of an object handle
pub fn object_id(obj: &ObjectRef) -> usize {
    Rc::as_ptr(obj) as *const () as usize
}

/// Stock [`Instance`] backed by interior-mutable maps.
#[derive(Default)]
pub struct Object {
    class_name: String,
    properties: RefCell<Vec<(String, Value)>>,
    debug_info: RefCell<Option<Vec<(String, Value)>>>,
    display: RefCell<Option<String>>,
    items: RefCell<Option<ArrayEntries>>,
}

impl Object {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Default::default()
        }
    }

    pub fn with_property(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_property(name, value);
        self
    }

    pub fn with_debug_info(self, info: Vec<(String, Value)>) -> Self {
        *self.debug_info.borrow_mut() = Some(info);
        self
    }

    pub fn with_display_string(self, s: impl Into<String>) -> Self {
        *self.display.borrow_mut() = Some(s.into());
        self
    }

    pub fn with_items(self, items: ArrayEntries) -> Self {
        *self.items.borrow_mut() = Some(items);
        self
    }

    pub fn set_property(&self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        let mut props = self.properties.borrow_mut();
        match props.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => props.push((name, value)),
        }
    }

    pub fn into_ref(self) -> Rc<Object> {
        Rc::new(self)
    }

    pub fn into_value(self) -> Value {
        Value::Object(Rc::new(self))
    }
}

impl Instance for Object {
    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn property(&self, name: &str) -> Option<Value> {
        self.properties
            .borrow()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    fn properties(&self) -> Vec<(String, Value)> {
        self.properties.borrow().clone()
    }

    fn debug_info(&self) -> Option<Vec<(String, Value)>> {
        self.debug_info.borrow().clone()
    }

    fn to_display_string(&self) -> Option<String> {
        self.display.borrow().clone()
    }

    fn iterate(&self) -> Option<ArrayEntries> {
        self.items.borrow().clone()
    }
}

// ============================================================================
// Resources and callables
// ============================================================================

/// Handle to an external runtime resource (stream, connection, ...)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resource {
    pub id: u64,
    /// `None` once the handle has been closed
    pub type_name: Option<String>,
}

impl Resource {
    pub fn new(id: u64, type_name: impl Into<String>) -> Self {
        Self {
            id,
            type_name: Some(type_name.into()),
        }
    }

    pub fn closed(id: u64) -> Self {
        Self {
            id,
            type_name: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.type_name.is_none()
    }
}

#[derive(Clone)]
pub enum CallableTarget {
    Class(String),
    Object(ObjectRef),
}

/// `[object-or-class, method]` callable
#[derive(Clone)]
pub struct Callable {
    pub target: CallableTarget,
    pub method: String,
}

impl Callable {
    pub fn class_name(&self) -> &str {
        match &self.target {
            CallableTarget::Class(c) => c,
            CallableTarget::Object(o) => o.class_name(),
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callable({}::{})", self.class_name(), self.method)
    }
}

// ============================================================================
// Value
// ============================================================================

/// Any value that can be handed to a logging operation
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Array),
    Object(ObjectRef),
    Resource(Resource),
    Callable(Callable),
    /// Intentionally absent (distinct from null)
    Undefined,
    /// Already abstracted
    Snapshot(Box<Snapshot>),
}

impl Value {
    pub fn array(entries: ArrayEntries) -> Self {
        Value::Array(Array::from_entries(entries))
    }

    pub fn list(values: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(Array::list(values))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Strict identity/equality: handles compare by pointer, scalars by value.
    pub fn same_as(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) | (Value::Undefined, Value::Undefined) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => object_id(a) == object_id(b),
            (Value::Resource(a), Value::Resource(b)) => a == b,
            (Value::Callable(a), Value::Callable(b)) => {
                a.method == b.method
                    && match (&a.target, &b.target) {
                        (CallableTarget::Class(x), CallableTarget::Class(y)) => x == y,
                        (CallableTarget::Object(x), CallableTarget::Object(y)) => {
                            object_id(x) == object_id(y)
                        }
                        _ => false,
                    }
            }
            (Value::Snapshot(a), Value::Snapshot(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Int(i) => write!(f, "Int({})", i),
            Value::Float(x) => write!(f, "Float({})", x),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Array(a) => a.fmt(f),
            Value::Object(o) => write!(f, "Object({})", o.class_name()),
            Value::Resource(r) => write!(f, "{:?}", r),
            Value::Callable(c) => c.fmt(f),
            Value::Undefined => write!(f, "Undefined"),
            Value::Snapshot(s) => write!(f, "Snapshot({:?})", s),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Value::Array(a)
    }
}

impl From<Rc<Object>> for Value {
    fn from(o: Rc<Object>) -> Self {
        Value::Object(o)
    }
}

impl From<Resource> for Value {
    fn from(r: Resource) -> Self {
        Value::Resource(r)
    }
}

impl From<Snapshot> for Value {
    fn from(s: Snapshot) -> Self {
        Value::Snapshot(Box::new(s))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_insert_overwrites_in_place() {
        let arr = Array::new();
        arr.insert("a", 1);
        arr.insert("b", 2);
        arr.insert("a", 3);
        let keys: Vec<_> = arr.entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![ArrayKey::from("a"), ArrayKey::from("b")]);
        assert!(arr.get("a").unwrap().same_as(&Value::Int(3)));
    }

    #[test]
    fn test_array_push_uses_next_int_key() {
        let arr = Array::new();
        arr.insert(5i64, "x");
        arr.insert("k", "y");
        assert_eq!(arr.push("z"), Some(ArrayKey::Int(6)));
        assert!(arr.get(6i64).is_some());
    }

    #[test]
    fn test_array_push_refuses_past_max_key() {
        let arr = Array::new();
        arr.insert(i64::MAX, "last");
        assert_eq!(arr.push("overflow"), None);
        assert_eq!(arr.len(), 1);
    }

    #[test]
    fn test_array_identity_survives_clone() {
        let a = Array::new();
        let b = a.clone();
        assert_eq!(a.id(), b.id());
        assert!(!a.ptr_eq(&Array::new()));
    }

    #[test]
    fn test_self_referencing_object() {
        let obj = Object::new("Node").into_ref();
        obj.set_property("me", obj.clone());
        let me = obj.property("me").unwrap();
        let inner = me.as_object().unwrap();
        let outer: ObjectRef = obj.clone();
        assert_eq!(object_id(inner), object_id(&outer));
    }

    #[test]
    fn test_same_as_compares_handles_by_identity() {
        let a = Value::from(Object::new("A").into_ref());
        let b = Value::from(Object::new("A").into_ref());
        assert!(a.same_as(&a.clone()));
        assert!(!a.same_as(&b));
        assert!(Value::from("x").same_as(&Value::from("x")));
        assert!(!Value::Int(1).same_as(&Value::Float(1.0)));
    }
}
