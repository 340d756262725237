//! Doc-comment parsing.
//!
//! Turns a `/** ... */` documentation comment into a [`DocBlock`]: a summary,
//! a long description, and typed tags (`@param`, `@return`, `@var`,
//! `@property[-read|-write]`, `@method`, ...). Parsing never fails; tags that
//! don't match their expected grammar are kept as [`DocTag::Other`].
//!
//! [`DocCache`] memoizes parse results per comment text.

mod parser;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

pub use parser::parse_doc_block;

/// Parsed documentation comment
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DocBlock {
    pub summary: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<DocTag>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "camelCase")]
pub enum DocTag {
    Param(ParamTag),
    Return(TypeTag),
    Throws(TypeTag),
    Var(VarTag),
    Property(PropertyTag),
    Method(MethodTag),
    Deprecated { description: Option<String> },
    Other { name: String, value: String },
}

impl DocTag {
    pub fn name(&self) -> &str {
        match self {
            DocTag::Param(_) => "param",
            DocTag::Return(_) => "return",
            DocTag::Throws(_) => "throws",
            DocTag::Var(_) => "var",
            DocTag::Property(p) => p.access.tag_name(),
            DocTag::Method(_) => "method",
            DocTag::Deprecated { .. } => "deprecated",
            DocTag::Other { name, .. } => name,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamTag {
    #[serde(rename = "type")]
    pub type_hint: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub is_variadic: bool,
    pub by_ref: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeTag {
    #[serde(rename = "type")]
    pub type_hint: String,
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VarTag {
    #[serde(rename = "type")]
    pub type_hint: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Which accessor a `@property` tag declares
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyAccess {
    ReadWrite,
    Read,
    Write,
}

impl PropertyAccess {
    pub fn tag_name(&self) -> &'static str {
        match self {
            PropertyAccess::ReadWrite => "property",
            PropertyAccess::Read => "property-read",
            PropertyAccess::Write => "property-write",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyTag {
    pub access: PropertyAccess,
    #[serde(rename = "type")]
    pub type_hint: Option<String>,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodTag {
    pub is_static: bool,
    pub return_type: Option<String>,
    pub name: String,
    pub params: Vec<MethodTagParam>,
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodTagParam {
    #[serde(rename = "type")]
    pub type_hint: Option<String>,
    /// Empty when the tag only lists a type
    pub name: String,
    /// Default value as written
    pub default: Option<String>,
    pub is_variadic: bool,
    pub by_ref: bool,
}

impl DocBlock {
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty() && self.description.is_empty() && self.tags.is_empty()
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.name().eq_ignore_ascii_case(name))
    }

    pub fn is_deprecated(&self) -> bool {
        self.tags
            .iter()
            .any(|t| matches!(t, DocTag::Deprecated { .. }))
    }

    /// Whether this block defers to the parent's documentation
    pub fn is_inherit_doc(&self) -> bool {
        if self.is_empty() {
            return true;
        }
        let inline = |s: &str| s.to_ascii_lowercase().contains("{@inheritdoc}");
        let only_marker = self.tags.is_empty()
            && inline(&self.summary)
            && self.description.trim().is_empty()
            && self.summary.trim().len() == "{@inheritdoc}".len();
        only_marker || self.has_tag("inheritdoc")
    }

    pub fn param(&self, name: &str) -> Option<&ParamTag> {
        self.tags.iter().find_map(|t| match t {
            DocTag::Param(p) if p.name == name => Some(p),
            _ => None,
        })
    }

    pub fn return_tag(&self) -> Option<&TypeTag> {
        self.tags.iter().find_map(|t| match t {
            DocTag::Return(r) => Some(r),
            _ => None,
        })
    }

    /// `@var` tag naming `name`, or the first unnamed one
    pub fn var_tag(&self, name: &str) -> Option<&VarTag> {
        let vars = || {
            self.tags.iter().filter_map(|t| match t {
                DocTag::Var(v) => Some(v),
                _ => None,
            })
        };
        vars()
            .find(|v| v.name.as_deref() == Some(name))
            .or_else(|| vars().find(|v| v.name.is_none()))
    }

    pub fn property_tags(&self) -> impl Iterator<Item = &PropertyTag> {
        self.tags.iter().filter_map(|t| match t {
            DocTag::Property(p) => Some(p),
            _ => None,
        })
    }

    pub fn method_tags(&self) -> impl Iterator<Item = &MethodTag> {
        self.tags.iter().filter_map(|t| match t {
            DocTag::Method(m) => Some(m),
            _ => None,
        })
    }

    /// Summary and description only
    pub fn without_tags(&self) -> DocBlock {
        DocBlock {
            summary: self.summary.clone(),
            description: self.description.clone(),
            tags: Vec::new(),
        }
    }
}

// ============================================================================
// Cache
// ============================================================================

/// Memoized parser keyed by comment text
#[derive(Debug, Default)]
pub struct DocCache {
    entries: RefCell<HashMap<String, Rc<DocBlock>>>,
}

impl DocCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(&self, text: &str) -> Rc<DocBlock> {
        if let Some(hit) = self.entries.borrow().get(text) {
            return Rc::clone(hit);
        }
        let block = Rc::new(parse_doc_block(text));
        self.entries
            .borrow_mut()
            .insert(text.to_string(), Rc::clone(&block));
        block
    }

    /// Parse an optional comment; absent comments yield an empty block
    pub fn parse_opt(&self, text: Option<&str>) -> Rc<DocBlock> {
        match text {
            Some(t) => self.parse(t),
            None => Rc::new(DocBlock::default()),
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_returns_same_block() {
        let cache = DocCache::new();
        let a = cache.parse("/** Hello. */");
        let b = cache.parse("/** Hello. */");
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_inherit_doc_detection() {
        assert!(parse_doc_block("/** {@inheritDoc} */").is_inherit_doc());
        assert!(parse_doc_block("/** @inheritdoc */").is_inherit_doc());
        assert!(parse_doc_block("").is_inherit_doc());
        assert!(!parse_doc_block("/** Does things. */").is_inherit_doc());
    }

    #[test]
    fn test_var_tag_lookup_prefers_named() {
        let block = parse_doc_block(
            "/**\n * @var int\n * @var string $name the name\n */",
        );
        assert_eq!(
            block.var_tag("name").unwrap().type_hint.as_deref(),
            Some("string")
        );
        assert_eq!(
            block.var_tag("other").unwrap().type_hint.as_deref(),
            Some("int")
        );
    }
}
