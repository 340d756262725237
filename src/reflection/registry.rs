//! Registry-backed reflector

use std::collections::HashMap;

use super::{ClassDef, Reflector};

/// Reflector over class definitions registered up front.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: HashMap<String, ClassDef>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class; a later definition with the same name replaces it
    pub fn register(&mut self, class: ClassDef) -> &mut Self {
        self.classes.insert(class.name.clone(), class);
        self
    }

    pub fn with(mut self, class: ClassDef) -> Self {
        self.register(class);
        self
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl Reflector for ClassRegistry {
    fn class(&self, name: &str) -> Option<&ClassDef> {
        self.classes.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::{MemberKind, MethodDef, PropertyDef};
    use crate::snapshot::Visibility;

    fn registry() -> ClassRegistry {
        ClassRegistry::new()
            .with(
                ClassDef::new("Base")
                    .property(PropertyDef::new("id", Visibility::Protected))
                    .method(MethodDef::public("save")),
            )
            .with(ClassDef::new("Child").extends("Base"))
            .with(ClassDef::new("GrandChild").extends("Child"))
    }

    #[test]
    fn test_lookup_and_parent() {
        let reg = registry();
        assert_eq!(reg.len(), 3);
        assert!(reg.class_exists("Child"));
        assert!(!reg.class_exists("Missing"));
        assert_eq!(reg.parent_class("Child"), Some("Base"));
        assert!(reg.list_properties("Missing").is_empty());
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let reg = registry();
        assert_eq!(reg.ancestors("GrandChild"), vec!["Child", "Base"]);
    }

    #[test]
    fn test_declaring_class_walks_up() {
        let reg = registry();
        assert_eq!(
            reg.declaring_class("GrandChild", MemberKind::Method, "save"),
            Some("Base".to_string())
        );
        assert_eq!(
            reg.declaring_class("GrandChild", MemberKind::Property, "nope"),
            None
        );
    }
}
