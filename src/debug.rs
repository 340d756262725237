//! Logging facade.
//!
//! A [`Debug`] is one channel: a named view over a shared [`LogStore`] and
//! [`Abstracter`]. Every operation abstracts its arguments and appends a
//! single [`LogEntry`]. Child channels created with [`Debug::channel`] share
//! the store, the engine and the output hooks of their parent.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use serde_json::Value as JsonValue;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::abstraction::{Abstracter, Propagation};
use crate::config::Config;
use crate::error::Result;
use crate::reflection::Reflector;
use crate::store::{
    LogEntry, LogSnapshot, LogStore, Meta, META_APPEND_GROUP, META_HIDE_IF_EMPTY, META_ID,
    META_LEVEL, METHOD_ALERT, METHOD_GROUP, METHOD_GROUP_COLLAPSED, METHOD_GROUP_END,
};
use crate::value::Value;

const KEY_REQUEST_ID: &str = "requestId";
const KEY_COUNTS: &str = "counts";
const DEFAULT_COUNT_LABEL: &str = "count";

/// Receives the store snapshot on [`Debug::output`]
pub trait OutputHook {
    fn on_output(&self, snapshot: &LogSnapshot) -> Propagation;
}

pub struct Debug {
    channel: String,
    default_meta: Meta,
    abstracter: Rc<Abstracter>,
    store: Rc<RefCell<LogStore>>,
    output_hooks: Rc<RefCell<Vec<Rc<dyn OutputHook>>>>,
}

impl Debug {
    /// Root logger with the stock engine
    pub fn new(config: Config, reflector: Rc<dyn Reflector>) -> Self {
        Self::with_abstracter(Abstracter::new(config, reflector))
    }

    /// Root logger around a preconfigured engine (extra object hooks, ...)
    pub fn with_abstracter(abstracter: Abstracter) -> Self {
        let channel = abstracter.config().channel_name.clone();
        let mut store = LogStore::new();
        let request_id = Uuid::new_v4().to_string();
        store
            .data_mut()
            .insert(KEY_REQUEST_ID.to_string(), JsonValue::String(request_id.clone()));
        debug!(channel = %channel, request_id = %request_id, "debug console created");

        Self {
            channel,
            default_meta: Meta::new(),
            abstracter: Rc::new(abstracter),
            store: Rc::new(RefCell::new(store)),
            output_hooks: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Child channel sharing this logger's store
    pub fn channel(&self, name: &str) -> Debug {
        self.channel_with_meta(name, Meta::new())
    }

    /// Child channel whose entries carry `meta` unless overridden per call
    pub fn channel_with_meta(&self, name: &str, meta: Meta) -> Debug {
        let mut default_meta = self.default_meta.clone();
        default_meta.extend(meta);
        Debug {
            channel: format!("{}.{}", self.channel, name),
            default_meta,
            abstracter: Rc::clone(&self.abstracter),
            store: Rc::clone(&self.store),
            output_hooks: Rc::clone(&self.output_hooks),
        }
    }

    pub fn channel_name(&self) -> &str {
        &self.channel
    }

    pub fn abstracter(&self) -> &Abstracter {
        &self.abstracter
    }

    pub fn store(&self) -> Ref<'_, LogStore> {
        self.store.borrow()
    }

    pub fn request_id(&self) -> Option<String> {
        self.store
            .borrow()
            .get(KEY_REQUEST_ID)
            .and_then(|v| v.as_str().map(str::to_string))
    }

    // ========================================================================
    // Core append
    // ========================================================================

    /// Abstract `args` for `method` and append the resulting entry
    pub fn append_log(&self, method: &str, args: Vec<Value>, meta: Meta) {
        let args = args
            .iter()
            .map(|arg| self.abstracter.abstract_value(arg, method))
            .collect();
        let mut entry = LogEntry::new(self.channel.clone(), method, args);
        entry.meta = self.default_meta.clone();
        entry.meta.extend(meta);
        trace!(channel = %self.channel, method, "append log entry");
        self.store.borrow_mut().append(entry);
    }

    pub fn log(&self, args: Vec<Value>) {
        self.append_log("log", args, Meta::new());
    }

    pub fn info(&self, args: Vec<Value>) {
        self.append_log("info", args, Meta::new());
    }

    pub fn warn(&self, args: Vec<Value>) {
        self.append_log("warn", args, Meta::new());
    }

    pub fn error(&self, args: Vec<Value>) {
        self.append_log("error", args, Meta::new());
    }

    /// Prominent message rendered before everything else
    pub fn alert(&self, message: &str, level: &str) {
        let mut meta = Meta::new();
        meta.insert(META_LEVEL.to_string(), JsonValue::from(level));
        self.append_log(METHOD_ALERT, vec![Value::from(message)], meta);
    }

    /// Log `args` only when `condition` is false
    pub fn assert(&self, condition: bool, args: Vec<Value>) {
        if !condition {
            self.append_log("assert", args, Meta::new());
        }
    }

    /// Render `rows` as a table; traversable objects supply their items
    pub fn table(&self, rows: Value) {
        self.append_log("table", vec![rows], Meta::new());
    }

    // ========================================================================
    // Counters
    // ========================================================================

    /// Increment and log the counter for `label`; returns the new count
    pub fn count(&self, label: Option<&str>) -> i64 {
        let label = label.unwrap_or(DEFAULT_COUNT_LABEL);
        let count = self
            .update_count(label, |current| Some(current.unwrap_or(0) + 1))
            .unwrap_or(1);
        self.append_log("count", vec![Value::from(label), Value::Int(count)], Meta::new());
        count
    }

    pub fn count_reset(&self, label: Option<&str>) {
        let label = label.unwrap_or(DEFAULT_COUNT_LABEL);
        match self.update_count(label, |current| current.map(|_| 0)) {
            Some(_) => {
                self.append_log("countReset", vec![Value::from(label), Value::Int(0)], Meta::new());
            }
            None => {
                let mut meta = Meta::new();
                meta.insert(META_LEVEL.to_string(), JsonValue::from("warn"));
                self.append_log(
                    "countReset",
                    vec![Value::from(format!("Counter '{}' doesn't exist.", label))],
                    meta,
                );
            }
        }
    }

    /// Apply `f` to the stored count for `label`; `None` from `f` leaves the
    /// counter untouched
    fn update_count(&self, label: &str, f: impl FnOnce(Option<i64>) -> Option<i64>) -> Option<i64> {
        let mut store = self.store.borrow_mut();
        let data = store.data_mut();
        let mut counts = match data.remove(KEY_COUNTS) {
            Some(JsonValue::Object(map)) => map,
            _ => Meta::new(),
        };
        let next = f(counts.get(label).and_then(JsonValue::as_i64));
        if let Some(value) = next {
            counts.insert(label.to_string(), JsonValue::from(value));
        }
        data.insert(KEY_COUNTS.to_string(), JsonValue::Object(counts));
        next
    }

    // ========================================================================
    // Groups and summaries
    // ========================================================================

    /// Open an expanded group; returns its id for [`append_to_group`](Self::append_to_group)
    pub fn group(&self, args: Vec<Value>) -> String {
        self.open_group(METHOD_GROUP, args, Meta::new())
    }

    pub fn group_collapsed(&self, args: Vec<Value>) -> String {
        self.open_group(METHOD_GROUP_COLLAPSED, args, Meta::new())
    }

    /// Open a group that disappears if it is closed without content
    pub fn group_hide_if_empty(&self, collapsed: bool, args: Vec<Value>) -> String {
        let mut meta = Meta::new();
        meta.insert(META_HIDE_IF_EMPTY.to_string(), JsonValue::Bool(true));
        let method = if collapsed {
            METHOD_GROUP_COLLAPSED
        } else {
            METHOD_GROUP
        };
        self.open_group(method, args, meta)
    }

    fn open_group(&self, method: &str, args: Vec<Value>, mut meta: Meta) -> String {
        let id = match meta.get(META_ID).and_then(JsonValue::as_str) {
            Some(id) => id.to_string(),
            None => {
                let id = self.store.borrow_mut().next_group_id();
                meta.insert(META_ID.to_string(), JsonValue::String(id.clone()));
                id
            }
        };
        self.append_log(method, args, meta);
        id
    }

    pub fn group_end(&self) {
        self.append_log(METHOD_GROUP_END, Vec::new(), Meta::new());
    }

    /// Expand every group open in the current destination
    pub fn group_uncollapse(&self) {
        self.store.borrow_mut().group_uncollapse();
    }

    /// Add an entry to an earlier group, even one already closed
    pub fn append_to_group(&self, group_id: &str, method: &str, args: Vec<Value>) {
        let mut meta = Meta::new();
        meta.insert(META_APPEND_GROUP.to_string(), JsonValue::from(group_id));
        self.append_log(method, args, meta);
    }

    /// Route following entries to the summary bucket for `priority`
    pub fn summary_start(&self, priority: i32) {
        self.store.borrow_mut().summary_start(priority);
    }

    pub fn summary_end(&self) {
        self.store.borrow_mut().summary_end();
    }

    // ========================================================================
    // Data and output
    // ========================================================================

    pub fn get_data(&self, path: &str) -> Option<JsonValue> {
        self.store.borrow().get(path)
    }

    pub fn set_data(&self, path: &str, value: JsonValue) -> Result<()> {
        self.store.borrow_mut().set(path, value)
    }

    /// Register a renderer; hooks run in registration order
    pub fn add_output_hook(&self, hook: Rc<dyn OutputHook>) {
        self.output_hooks.borrow_mut().push(hook);
    }

    /// Close open groups, then hand the store snapshot to the output hooks
    pub fn output(&self) -> LogSnapshot {
        let snapshot = {
            let mut store = self.store.borrow_mut();
            store.close_open_groups();
            store.snapshot()
        };
        let hooks: Vec<Rc<dyn OutputHook>> = self.output_hooks.borrow().clone();
        for hook in hooks {
            if hook.on_output(&snapshot) == Propagation::Stop {
                trace!("output hook stopped propagation");
                break;
            }
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::ClassRegistry;
    use crate::store::Destination;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn debug() -> Debug {
        Debug::new(Config::default(), Rc::new(ClassRegistry::new()))
    }

    #[test]
    fn test_request_id_is_set() {
        let d = debug();
        let id = d.request_id().unwrap();
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_channels_share_store() {
        let root = debug();
        let child = root.channel("db");
        root.log(vec!["from root".into()]);
        child.log(vec!["from child".into()]);

        let store = root.store();
        let entries = store.sequence(Destination::Main);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].channel, "general.db");
    }

    #[test]
    fn test_channel_default_meta() {
        let root = debug();
        let mut meta = Meta::new();
        meta.insert("icon".into(), json!("fa-database"));
        let child = root.channel_with_meta("db", meta);
        child.info(vec!["query".into()]);
        let store = root.store();
        assert_eq!(store.sequence(Destination::Main)[0].meta["icon"], json!("fa-database"));
    }

    #[test]
    fn test_count_and_reset() {
        let d = debug();
        assert_eq!(d.count(Some("hits")), 1);
        assert_eq!(d.count(Some("hits")), 2);
        assert_eq!(d.count(None), 1);
        assert_eq!(d.get_data("counts/hits"), Some(json!(2)));
        d.count_reset(Some("hits"));
        assert_eq!(d.get_data("counts.hits"), Some(json!(0)));
        d.count_reset(Some("never"));
        assert_eq!(d.store().sequence(Destination::Main).len(), 5);
    }

    #[test]
    fn test_assert_logs_only_on_failure() {
        let d = debug();
        d.assert(true, vec!["fine".into()]);
        d.assert(false, vec!["broken".into()]);
        let store = d.store();
        let entries = store.sequence(Destination::Main);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].method, "assert");
    }

    #[test]
    fn test_output_closes_groups_and_stops_hooks() {
        struct Recorder(RefCell<Vec<usize>>, Propagation);
        impl OutputHook for Recorder {
            fn on_output(&self, snapshot: &LogSnapshot) -> Propagation {
                self.0.borrow_mut().push(snapshot.log.len());
                self.1
            }
        }

        let d = debug();
        let first = Rc::new(Recorder(RefCell::new(Vec::new()), Propagation::Stop));
        let second = Rc::new(Recorder(RefCell::new(Vec::new()), Propagation::Continue));
        d.add_output_hook(first.clone());
        d.add_output_hook(second.clone());

        d.group(vec!["open".into()]);
        d.log(vec!["inside".into()]);
        let snapshot = d.output();

        assert_eq!(snapshot.open_groups, 0);
        assert_eq!(snapshot.log.last().map(|e| e.method.as_str()), Some("groupEnd"));
        assert_eq!(*first.0.borrow(), vec![3]);
        assert!(second.0.borrow().is_empty());
    }

    #[test]
    fn test_set_data_rejects_partial_log_write() {
        let d = debug();
        assert!(d.set_data("log/0", json!({})).is_err());
        assert!(d.set_data("custom.key", json!(1)).is_ok());
        assert_eq!(d.get_data("custom"), Some(json!({"key": 1})));
    }
}
