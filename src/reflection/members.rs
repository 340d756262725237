//! Inherited structure derived from per-class declarations.
//!
//! Everything here is a pure function of a [`Reflector`]; no live instance
//! is involved. Walks are guarded against malformed registries whose parent
//! links form a loop.

use super::{ConstantDef, MemberKind, MethodDef, PropertyDef, Reflector};
use crate::snapshot::Visibility;
use crate::value::Value;

/// Parent chain, nearest first
pub fn ancestors<R: Reflector + ?Sized>(reflector: &R, class: &str) -> Vec<String> {
    let mut chain: Vec<String> = Vec::new();
    let mut current = reflector.parent_class(class).map(str::to_string);
    while let Some(name) = current {
        if name == class || chain.contains(&name) {
            break;
        }
        current = reflector.parent_class(&name).map(str::to_string);
        chain.push(name);
    }
    chain
}

/// The class itself followed by its ancestors
pub fn lineage<R: Reflector + ?Sized>(reflector: &R, class: &str) -> Vec<String> {
    let mut chain = vec![class.to_string()];
    chain.extend(ancestors(reflector, class));
    chain
}

/// Every interface implemented by the class, its ancestors, or extended by
/// those interfaces. Breadth-first, nearest declarations first.
pub fn interfaces<R: Reflector + ?Sized>(reflector: &R, class: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let mut queue: Vec<String> = Vec::new();
    for name in lineage(reflector, class) {
        if let Some(def) = reflector.class(&name) {
            queue.extend(def.interfaces.iter().cloned());
        }
    }
    let mut i = 0;
    while i < queue.len() {
        let iface = queue[i].clone();
        i += 1;
        if found.contains(&iface) {
            continue;
        }
        if let Some(def) = reflector.class(&iface) {
            queue.extend(def.interfaces.iter().cloned());
        }
        found.push(iface);
    }
    found
}

/// Constants visible on the class.
///
/// Interface constants first, then root ancestor down to the class, so a
/// more-derived declaration overwrites the value while keeping the original
/// position.
pub fn constants<R: Reflector + ?Sized>(reflector: &R, class: &str) -> Vec<(String, Value)> {
    let mut merged: Vec<(String, Value)> = Vec::new();
    for iface in interfaces(reflector, class).iter().rev() {
        merge_constants(&mut merged, reflector.list_constants(iface));
    }
    for name in lineage(reflector, class).iter().rev() {
        merge_constants(&mut merged, reflector.list_constants(name));
    }
    merged
}

fn merge_constants(merged: &mut Vec<(String, Value)>, defs: &[ConstantDef]) {
    for def in defs {
        match merged.iter_mut().find(|(name, _)| *name == def.name) {
            Some(slot) => slot.1 = def.value.clone(),
            None => merged.push((def.name.clone(), def.value.clone())),
        }
    }
}

/// Every property declaration in the lineage, most-derived first, paired
/// with its declaring class. Redeclarations are all returned.
pub fn properties<'r, R: Reflector + ?Sized>(
    reflector: &'r R,
    class: &str,
) -> Vec<(String, &'r PropertyDef)> {
    lineage(reflector, class)
        .into_iter()
        .flat_map(|name| {
            reflector
                .list_properties(&name)
                .iter()
                .map(move |def| (name.clone(), def))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Methods callable on the class: the nearest declaration of each name,
/// skipping private methods of ancestors.
pub fn methods<'r, R: Reflector + ?Sized>(
    reflector: &'r R,
    class: &str,
) -> Vec<(String, &'r MethodDef)> {
    let mut out: Vec<(String, &'r MethodDef)> = Vec::new();
    for (depth, name) in lineage(reflector, class).into_iter().enumerate() {
        for def in reflector.list_methods(&name) {
            if depth > 0 && def.visibility == Visibility::Private {
                continue;
            }
            if out.iter().any(|(_, m)| m.name == def.name) {
                continue;
            }
            out.push((name.clone(), def));
        }
    }
    out
}

/// Every declaration of `method` in the lineage and then the interfaces,
/// nearest first
pub fn method_declarations<'r, R: Reflector + ?Sized>(
    reflector: &'r R,
    class: &str,
    method: &str,
) -> Vec<(String, &'r MethodDef)> {
    let mut classes = lineage(reflector, class);
    classes.extend(interfaces(reflector, class));
    classes
        .into_iter()
        .filter_map(|name| {
            reflector
                .list_methods(&name)
                .iter()
                .find(|m| m.name == method)
                .map(|def| (name, def))
        })
        .collect()
}

/// Nearest declaration of a method, private ancestors included
pub fn find_method<'r, R: Reflector + ?Sized>(
    reflector: &'r R,
    class: &str,
    method: &str,
) -> Option<(String, &'r MethodDef)> {
    lineage(reflector, class).into_iter().find_map(|name| {
        reflector
            .list_methods(&name)
            .iter()
            .find(|m| m.name == method)
            .map(|def| (name, def))
    })
}

pub fn has_method<R: Reflector + ?Sized>(reflector: &R, class: &str, method: &str) -> bool {
    find_method(reflector, class, method).is_some()
}

pub fn declaring_class<R: Reflector + ?Sized>(
    reflector: &R,
    class: &str,
    kind: MemberKind,
    member: &str,
) -> Option<String> {
    let mut candidates = lineage(reflector, class);
    if kind == MemberKind::Constant {
        candidates.extend(interfaces(reflector, class));
    }
    candidates.into_iter().find(|name| match kind {
        MemberKind::Constant => reflector
            .list_constants(name)
            .iter()
            .any(|c| c.name == member),
        MemberKind::Property => reflector
            .list_properties(name)
            .iter()
            .any(|p| p.name == member),
        MemberKind::Method => reflector.list_methods(name).iter().any(|m| m.name == member),
    })
}

/// Whether the class is, extends, or implements `name`
pub fn is_a<R: Reflector + ?Sized>(reflector: &R, class: &str, name: &str) -> bool {
    lineage(reflector, class).iter().any(|c| c == name)
        || interfaces(reflector, class).iter().any(|i| i == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::{ClassDef, ClassRegistry, MethodDef, PropertyDef};
    use pretty_assertions::assert_eq;

    fn registry() -> ClassRegistry {
        ClassRegistry::new()
            .with(ClassDef::interface("Countable").method(MethodDef::public("count")))
            .with(
                ClassDef::interface("HasLimits")
                    .implements("Countable")
                    .constant("LIMIT", 10),
            )
            .with(
                ClassDef::new("Base")
                    .implements("HasLimits")
                    .constant("A", "base-a")
                    .constant("B", "base-b")
                    .property(PropertyDef::new("name", Visibility::Protected))
                    .property(PropertyDef::new("secret", Visibility::Private))
                    .method(MethodDef::public("save"))
                    .method(MethodDef::new("hidden", Visibility::Private)),
            )
            .with(
                ClassDef::new("Child")
                    .extends("Base")
                    .constant("A", "child-a")
                    .constant("C", "child-c")
                    .property(PropertyDef::new("name", Visibility::Public))
                    .method(MethodDef::public("save"))
                    .method(MethodDef::public("count")),
            )
            .with(ClassDef::new("Loop1").extends("Loop2"))
            .with(ClassDef::new("Loop2").extends("Loop1"))
    }

    #[test]
    fn test_ancestor_loop_terminates() {
        let reg = registry();
        assert_eq!(ancestors(&reg, "Loop1"), vec!["Loop2"]);
    }

    #[test]
    fn test_interfaces_include_extended() {
        let reg = registry();
        assert_eq!(interfaces(&reg, "Child"), vec!["HasLimits", "Countable"]);
        assert!(is_a(&reg, "Child", "Countable"));
        assert!(!is_a(&reg, "Base", "Child"));
    }

    #[test]
    fn test_constants_derived_wins_in_place() {
        let reg = registry();
        let names: Vec<_> = constants(&reg, "Child")
            .into_iter()
            .map(|(n, v)| format!("{}={}", n, v.as_str().map_or("?".into(), String::from)))
            .collect();
        assert_eq!(names, vec!["LIMIT=?", "A=child-a", "B=base-b", "C=child-c"]);
    }

    #[test]
    fn test_properties_include_redeclarations() {
        let reg = registry();
        let props: Vec<_> = properties(&reg, "Child")
            .into_iter()
            .map(|(cls, p)| format!("{}::{}", cls, p.name))
            .collect();
        assert_eq!(props, vec!["Child::name", "Base::name", "Base::secret"]);
    }

    #[test]
    fn test_methods_skip_inherited_private() {
        let reg = registry();
        let methods: Vec<_> = methods(&reg, "Child")
            .into_iter()
            .map(|(cls, m)| format!("{}::{}", cls, m.name))
            .collect();
        assert_eq!(methods, vec!["Child::save", "Child::count"]);
        assert!(has_method(&reg, "Child", "hidden"));
    }

    #[test]
    fn test_method_declarations_reach_interfaces() {
        let reg = registry();
        let decls: Vec<_> = method_declarations(&reg, "Child", "count")
            .into_iter()
            .map(|(cls, _)| cls)
            .collect();
        assert_eq!(decls, vec!["Child", "Countable"]);
    }

    #[test]
    fn test_declaring_class_for_constant_on_interface() {
        let reg = registry();
        assert_eq!(
            declaring_class(&reg, "Child", MemberKind::Constant, "LIMIT"),
            Some("HasLimits".to_string())
        );
        assert_eq!(
            declaring_class(&reg, "Child", MemberKind::Property, "secret"),
            Some("Base".to_string())
        );
    }
}
