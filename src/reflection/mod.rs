//! Class structure introspection.
//!
//! The abstraction engine never talks to a concrete reflection API. It asks a
//! [`Reflector`] for per-class declarations and derives inherited structure
//! itself (see [`members`]). [`ClassRegistry`] is the stock adapter: a
//! registry of [`ClassDef`]s assembled up front by the host.

pub mod members;
mod registry;

pub use registry::ClassRegistry;

use crate::snapshot::Visibility;
use crate::value::Value;

// ============================================================================
// Declarations
// ============================================================================

#[derive(Clone, Debug)]
pub struct ConstantDef {
    pub name: String,
    pub value: Value,
}

#[derive(Clone, Debug)]
pub struct PropertyDef {
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub type_hint: Option<String>,
    pub doc: Option<String>,
    /// Current value of a static property
    pub static_value: Option<Value>,
}

impl PropertyDef {
    pub fn new(name: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            name: name.into(),
            visibility,
            is_static: false,
            type_hint: None,
            doc: None,
            static_value: None,
        }
    }

    pub fn typed(mut self, type_hint: impl Into<String>) -> Self {
        self.type_hint = Some(type_hint.into());
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn static_value(mut self, value: impl Into<Value>) -> Self {
        self.is_static = true;
        self.static_value = Some(value.into());
        self
    }
}

#[derive(Clone, Debug)]
pub struct ParamDef {
    pub name: String,
    pub type_hint: Option<String>,
    pub default: Option<Value>,
    /// Name of the constant used as default, if any
    pub default_constant: Option<String>,
    pub is_variadic: bool,
}

impl ParamDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_hint: None,
            default: None,
            default_constant: None,
            is_variadic: false,
        }
    }

    pub fn typed(mut self, type_hint: impl Into<String>) -> Self {
        self.type_hint = Some(type_hint.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn default_constant(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.default_constant = Some(name.into());
        self.default = Some(value.into());
        self
    }

    pub fn variadic(mut self) -> Self {
        self.is_variadic = true;
        self
    }

    pub fn is_optional(&self) -> bool {
        self.default.is_some() || self.is_variadic
    }
}

#[derive(Clone, Debug)]
pub struct MethodDef {
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_final: bool,
    pub params: Vec<ParamDef>,
    pub return_type: Option<String>,
    pub doc: Option<String>,
}

impl MethodDef {
    pub fn new(name: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            name: name.into(),
            visibility,
            is_static: false,
            is_abstract: false,
            is_final: false,
            params: Vec::new(),
            return_type: None,
            doc: None,
        }
    }

    pub fn public(name: impl Into<String>) -> Self {
        Self::new(name, Visibility::Public)
    }

    pub fn param(mut self, param: ParamDef) -> Self {
        self.params.push(param);
        self
    }

    pub fn returns(mut self, type_hint: impl Into<String>) -> Self {
        self.return_type = Some(type_hint.into());
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn set_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn set_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn set_final(mut self) -> Self {
        self.is_final = true;
        self
    }
}

/// Everything a single class (or interface) declares itself
#[derive(Clone, Debug, Default)]
pub struct ClassDef {
    pub name: String,
    pub parent: Option<String>,
    /// Directly implemented interfaces; for an interface, the ones it extends
    pub interfaces: Vec<String>,
    pub is_interface: bool,
    pub constants: Vec<ConstantDef>,
    pub properties: Vec<PropertyDef>,
    pub methods: Vec<MethodDef>,
    pub doc: Option<String>,
}

impl ClassDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_interface: true,
            ..Default::default()
        }
    }

    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn constant(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constants.push(ConstantDef {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn property(mut self, prop: PropertyDef) -> Self {
        self.properties.push(prop);
        self
    }

    pub fn method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }
}

// ============================================================================
// Capability interface
// ============================================================================

/// Which kind of member a lookup refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberKind {
    Constant,
    Property,
    Method,
}

/// Per-class reflection capability.
///
/// Implementors only report what a class declares itself; inheritance is
/// resolved by the provided methods and by [`members`].
pub trait Reflector {
    fn class(&self, name: &str) -> Option<&ClassDef>;

    fn class_exists(&self, name: &str) -> bool {
        self.class(name).is_some()
    }

    fn parent_class(&self, name: &str) -> Option<&str> {
        self.class(name).and_then(|c| c.parent.as_deref())
    }

    fn list_constants(&self, name: &str) -> &[ConstantDef] {
        self.class(name)
            .map(|c| c.constants.as_slice())
            .unwrap_or(&[])
    }

    fn list_properties(&self, name: &str) -> &[PropertyDef] {
        self.class(name)
            .map(|c| c.properties.as_slice())
            .unwrap_or(&[])
    }

    fn list_methods(&self, name: &str) -> &[MethodDef] {
        self.class(name)
            .map(|c| c.methods.as_slice())
            .unwrap_or(&[])
    }

    fn doc_comment(&self, name: &str) -> Option<&str> {
        self.class(name).and_then(|c| c.doc.as_deref())
    }

    /// Parent chain, nearest first
    fn ancestors(&self, name: &str) -> Vec<String> {
        members::ancestors(self, name)
    }

    /// Class in `name`'s hierarchy that declares the member
    fn declaring_class(&self, name: &str, kind: MemberKind, member: &str) -> Option<String> {
        members::declaring_class(self, name, kind, member)
    }
}
