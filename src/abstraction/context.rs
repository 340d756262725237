//! Traversal context for one top-level abstraction call

/// Identity of a container on the current path
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Identity {
    Object(usize),
    Array(usize),
}

/// Path of containers from the top-level value down to the one being
/// abstracted.
///
/// Each recursive step gets its own copy via [`descend`](Self::descend), so
/// siblings never see each other's entries: a value referenced twice from
/// different branches is abstracted twice, while a value that refers back
/// to one of its own ancestors becomes a recursion marker.
#[derive(Clone, Debug, Default)]
pub struct TraversalContext {
    history: Vec<Identity>,
    scope_class: Option<String>,
}

impl TraversalContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context judging visibility from inside `scope_class`
    pub fn in_scope(scope_class: impl Into<String>) -> Self {
        Self {
            history: Vec::new(),
            scope_class: Some(scope_class.into()),
        }
    }

    pub fn contains(&self, id: Identity) -> bool {
        self.history.contains(&id)
    }

    pub fn descend(&self, id: Identity) -> Self {
        let mut next = self.clone();
        next.history.push(id);
        next
    }

    /// Number of containers above the current value
    pub fn depth(&self) -> usize {
        self.history.len()
    }

    pub fn history(&self) -> &[Identity] {
        &self.history
    }

    pub fn scope_class(&self) -> Option<&str> {
        self.scope_class.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descend_does_not_leak_to_siblings() {
        let root = TraversalContext::new();
        let left = root.descend(Identity::Object(1));
        let right = root.descend(Identity::Object(2));
        assert!(left.contains(Identity::Object(1)));
        assert!(!right.contains(Identity::Object(1)));
        assert_eq!(root.depth(), 0);
        assert_eq!(left.descend(Identity::Array(9)).depth(), 2);
    }

    #[test]
    fn test_object_and_array_ids_are_distinct() {
        let ctx = TraversalContext::new().descend(Identity::Array(7));
        assert!(!ctx.contains(Identity::Object(7)));
    }

    #[test]
    fn test_scope_carries_through_descend() {
        let ctx = TraversalContext::in_scope("Controller").descend(Identity::Object(3));
        assert_eq!(ctx.scope_class(), Some("Controller"));
    }
}
