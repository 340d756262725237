//! Log entries and their metadata keys.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::snapshot::Snapshot;

/// Open key/value metadata attached to an entry
pub type Meta = serde_json::Map<String, JsonValue>;

/// Explicit entry id; a later entry with the same id replaces it
pub const META_ID: &str = "id";
/// Id of an open or closed group to insert into
pub const META_APPEND_GROUP: &str = "appendGroup";
/// Drop the group if it is closed without content
pub const META_HIDE_IF_EMPTY: &str = "hideIfEmpty";
/// Set on group ends synthesized before output
pub const META_AUTO_CLOSED: &str = "autoClosed";
/// Severity of an alert
pub const META_LEVEL: &str = "level";

pub const METHOD_ALERT: &str = "alert";
pub const METHOD_GROUP: &str = "group";
pub const METHOD_GROUP_COLLAPSED: &str = "groupCollapsed";
pub const METHOD_GROUP_END: &str = "groupEnd";

/// Kind of entry, as destination bookkeeping sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntryType {
    Alert,
    GroupOpen,
    GroupEnd,
    Plain,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Alert => "alert",
            EntryType::GroupOpen => "groupOpen",
            EntryType::GroupEnd => "groupEnd",
            EntryType::Plain => "plain",
        }
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One logged call: operation name, abstracted arguments, metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub channel: String,
    pub method: String,
    pub args: Vec<Snapshot>,
    #[serde(default, skip_serializing_if = "Meta::is_empty")]
    pub meta: Meta,
}

impl LogEntry {
    pub fn new(channel: impl Into<String>, method: impl Into<String>, args: Vec<Snapshot>) -> Self {
        Self {
            channel: channel.into(),
            method: method.into(),
            args,
            meta: Meta::new(),
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn entry_type(&self) -> EntryType {
        match self.method.as_str() {
            METHOD_ALERT => EntryType::Alert,
            METHOD_GROUP | METHOD_GROUP_COLLAPSED => EntryType::GroupOpen,
            METHOD_GROUP_END => EntryType::GroupEnd,
            _ => EntryType::Plain,
        }
    }

    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.meta.get(key).and_then(JsonValue::as_str)
    }

    pub fn meta_flag(&self, key: &str) -> bool {
        self.meta.get(key).and_then(JsonValue::as_bool).unwrap_or(false)
    }

    pub fn id(&self) -> Option<&str> {
        self.meta_str(META_ID)
    }

    pub fn append_group(&self) -> Option<&str> {
        self.meta_str(META_APPEND_GROUP)
    }

    pub fn hide_if_empty(&self) -> bool {
        self.meta_flag(META_HIDE_IF_EMPTY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_type_from_method() {
        assert_eq!(LogEntry::new("general", "groupCollapsed", vec![]).entry_type(), EntryType::GroupOpen);
        assert_eq!(LogEntry::new("general", "groupEnd", vec![]).entry_type(), EntryType::GroupEnd);
        assert_eq!(LogEntry::new("general", "alert", vec![]).entry_type(), EntryType::Alert);
        assert_eq!(LogEntry::new("general", "log", vec![]).entry_type(), EntryType::Plain);
    }

    #[test]
    fn test_meta_accessors() {
        let entry = LogEntry::new("general", "group", vec![])
            .with_meta(META_ID, "g1")
            .with_meta(META_HIDE_IF_EMPTY, true);
        assert_eq!(entry.id(), Some("g1"));
        assert!(entry.hide_if_empty());
        assert_eq!(entry.append_group(), None);
    }

    #[test]
    fn test_empty_meta_not_serialized() {
        let json = serde_json::to_value(LogEntry::new("general", "log", vec![Snapshot::int(1)])).unwrap();
        assert!(json.get("meta").is_none());
    }
}
