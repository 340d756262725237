//! Dotted/slashed path addressing over a JSON tree.

use serde_json::Value as JsonValue;

use crate::error::{DebugError, Result};

/// Split `a.b/c` into `["a", "b", "c"]`; empty segments are dropped
pub fn segments(path: &str) -> Vec<&str> {
    path.split(['.', '/']).filter(|s| !s.is_empty()).collect()
}

/// Follow `segments` below `root`; arrays are indexed by number
pub fn lookup<'a>(root: &'a JsonValue, segments: &[&str]) -> Option<&'a JsonValue> {
    segments.iter().try_fold(root, |node, seg| match node {
        JsonValue::Object(map) => map.get(*seg),
        JsonValue::Array(items) => seg.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Write `value` at `segments` below `root`, creating intermediate objects.
///
/// Fails when a segment runs into a scalar, or indexes past the end of an
/// array.
pub fn assign(root: &mut JsonValue, segments: &[&str], value: JsonValue, full_path: &str) -> Result<()> {
    let Some((last, parents)) = segments.split_last() else {
        *root = value;
        return Ok(());
    };
    let mut node = root;
    for seg in parents {
        node = child_mut(node, seg, full_path)?;
    }
    match node {
        JsonValue::Object(map) => {
            map.insert((*last).to_string(), value);
            Ok(())
        }
        JsonValue::Array(items) => {
            let index = parse_index(last, full_path)?;
            match index.cmp(&items.len()) {
                std::cmp::Ordering::Less => items[index] = value,
                std::cmp::Ordering::Equal => items.push(value),
                std::cmp::Ordering::Greater => {
                    return Err(DebugError::path(full_path, "index out of range"))
                }
            }
            Ok(())
        }
        JsonValue::Null => {
            let mut map = serde_json::Map::new();
            map.insert((*last).to_string(), value);
            *node = JsonValue::Object(map);
            Ok(())
        }
        _ => Err(DebugError::path(full_path, format!("'{}' is not a container", last))),
    }
}

fn child_mut<'a>(node: &'a mut JsonValue, seg: &str, full_path: &str) -> Result<&'a mut JsonValue> {
    if node.is_null() {
        *node = JsonValue::Object(serde_json::Map::new());
    }
    match node {
        JsonValue::Object(map) => Ok(map
            .entry(seg.to_string())
            .or_insert_with(|| JsonValue::Object(serde_json::Map::new()))),
        JsonValue::Array(items) => {
            let index = parse_index(seg, full_path)?;
            items
                .get_mut(index)
                .ok_or_else(|| DebugError::path(full_path, "index out of range"))
        }
        _ => Err(DebugError::path(full_path, format!("'{}' is not a container", seg))),
    }
}

fn parse_index(seg: &str, full_path: &str) -> Result<usize> {
    seg.parse::<usize>()
        .map_err(|_| DebugError::path(full_path, format!("'{}' is not an array index", seg)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_segments_accept_both_separators() {
        assert_eq!(segments("logSummary/5.0"), vec!["logSummary", "5", "0"]);
        assert!(segments("").is_empty());
    }

    #[test]
    fn test_lookup() {
        let tree = json!({"a": {"b": [10, 20]}});
        assert_eq!(lookup(&tree, &["a", "b", "1"]), Some(&json!(20)));
        assert_eq!(lookup(&tree, &["a", "x"]), None);
        assert_eq!(lookup(&tree, &["a", "b", "x"]), None);
    }

    #[test]
    fn test_assign_creates_intermediates() {
        let mut tree = json!({});
        assign(&mut tree, &["counts", "hits"], json!(3), "counts/hits").unwrap();
        assert_eq!(tree, json!({"counts": {"hits": 3}}));
    }

    #[test]
    fn test_assign_into_scalar_fails() {
        let mut tree = json!({"a": 1});
        let err = assign(&mut tree, &["a", "b"], json!(2), "a.b").unwrap_err();
        assert!(matches!(err, DebugError::Path { .. }));
    }

    #[test]
    fn test_assign_array_append_and_range() {
        let mut tree = json!({"list": [1]});
        assign(&mut tree, &["list", "1"], json!(2), "list.1").unwrap();
        assert_eq!(tree, json!({"list": [1, 2]}));
        assert!(assign(&mut tree, &["list", "5"], json!(9), "list.5").is_err());
    }
}
