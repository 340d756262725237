//! Hierarchical log data store.
//!
//! Entries land in exactly one destination at a time: `alerts`, the main
//! `log`, or the summary bucket of the innermost active summary priority.
//! Open groups are tracked per destination so `groupEnd` knows what it is
//! closing, and so unbalanced groups can be closed before output.
//!
//! Channels share one store through `Rc<RefCell<LogStore>>`.

mod entry;
mod path;

pub use entry::{
    EntryType, LogEntry, Meta, META_APPEND_GROUP, META_AUTO_CLOSED, META_HIDE_IF_EMPTY, META_ID,
    META_LEVEL, METHOD_ALERT, METHOD_GROUP, METHOD_GROUP_COLLAPSED, METHOD_GROUP_END,
};

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, trace};

use crate::error::{DebugError, Result};

const KEY_ALERTS: &str = "alerts";
const KEY_LOG: &str = "log";
const KEY_LOG_SUMMARY: &str = "logSummary";

/// Where an entry is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Destination {
    Alerts,
    Main,
    Summary(i32),
}

#[derive(Debug, Clone, Copy)]
struct OpenGroup {
    index: usize,
    hide_if_empty: bool,
}

#[derive(Debug, Default)]
pub struct LogStore {
    alerts: Vec<LogEntry>,
    log: Vec<LogEntry>,
    log_summary: BTreeMap<i32, Vec<LogEntry>>,
    /// Free-form request data (`requestId`, `counts`, ...)
    data: Meta,
    group_stacks: HashMap<Destination, Vec<OpenGroup>>,
    summary_priorities: Vec<i32>,
    group_seq: u64,
}

impl LogStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Appending
    // ========================================================================

    /// Append an entry, honoring `appendGroup`, `id`, and group bookkeeping
    pub fn append(&mut self, entry: LogEntry) -> Destination {
        let entry = match entry.append_group().map(str::to_string) {
            Some(target) => match self.insert_into_group(&target, entry) {
                Ok(dest) => return dest,
                Err(entry) => {
                    debug!(group = %target, "append target not found, appending at tail");
                    entry
                }
            },
            None => entry,
        };

        let dest = match entry.entry_type() {
            EntryType::Alert => Destination::Alerts,
            _ => self.active_destination(),
        };
        match entry.entry_type() {
            EntryType::GroupEnd => self.close_group(dest, entry),
            _ => self.push(dest, entry),
        }
        dest
    }

    /// Ids are matched only against entries of the same kind, so replacing
    /// in place never changes the group structure of the sequence.
    fn push(&mut self, dest: Destination, entry: LogEntry) {
        let kind = entry.entry_type();
        let opens_group = kind == EntryType::GroupOpen;
        let hide_if_empty = entry.hide_if_empty();

        let seq = self.sequence_mut(dest);
        let existing = entry.id().and_then(|id| {
            seq.iter()
                .position(|e| e.id() == Some(id) && e.entry_type() == kind)
        });
        if let Some(pos) = existing {
            trace!(id = ?seq[pos].id(), "replacing entry by id");
            seq[pos] = entry;
            if let Some(open) = self
                .group_stacks
                .get_mut(&dest)
                .and_then(|stack| stack.iter_mut().find(|g| g.index == pos))
            {
                open.hide_if_empty = hide_if_empty;
            }
            return;
        }
        seq.push(entry);
        let index = seq.len() - 1;

        if opens_group {
            self.group_stacks.entry(dest).or_default().push(OpenGroup {
                index,
                hide_if_empty,
            });
        }
    }

    fn close_group(&mut self, dest: Destination, entry: LogEntry) {
        let Some(open) = self.group_stacks.get_mut(&dest).and_then(Vec::pop) else {
            debug!(destination = ?dest, "groupEnd with no open group ignored");
            return;
        };
        let seq = self.sequence_mut(dest);
        if open.hide_if_empty && open.index + 1 == seq.len() {
            trace!(destination = ?dest, "removing empty hideIfEmpty group");
            seq.remove(open.index);
            return;
        }
        seq.push(entry);
    }

    /// Insert a plain entry just before the close of group `target`, or at
    /// the tail of its destination while the group is still open. Hands the
    /// entry back when there is no such group.
    fn insert_into_group(
        &mut self,
        target: &str,
        entry: LogEntry,
    ) -> std::result::Result<Destination, LogEntry> {
        if entry.entry_type() != EntryType::Plain {
            return Err(entry);
        }
        let Some((dest, start)) = self.find_group(target) else {
            return Err(entry);
        };

        let seq = self.sequence_mut(dest);
        let mut depth = 0usize;
        let mut insert_at = seq.len();
        for (i, e) in seq.iter().enumerate().skip(start) {
            match e.entry_type() {
                EntryType::GroupOpen => depth += 1,
                EntryType::GroupEnd => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        insert_at = i;
                        break;
                    }
                }
                _ => {}
            }
        }
        seq.insert(insert_at, entry);

        if let Some(stack) = self.group_stacks.get_mut(&dest) {
            for open in stack.iter_mut().filter(|g| g.index >= insert_at) {
                open.index += 1;
            }
        }
        trace!(group = target, index = insert_at, "entry inserted into group");
        Ok(dest)
    }

    fn find_group(&self, id: &str) -> Option<(Destination, usize)> {
        self.destinations().into_iter().find_map(|dest| {
            self.sequence(dest)
                .iter()
                .position(|e| e.entry_type() == EntryType::GroupOpen && e.id() == Some(id))
                .map(|pos| (dest, pos))
        })
    }

    /// Close every open group in every destination with a synthetic
    /// `groupEnd`. Returns how many were closed.
    pub fn close_open_groups(&mut self) -> usize {
        let mut dests: Vec<Destination> = self.group_stacks.keys().copied().collect();
        dests.sort();

        let mut closed = 0;
        for dest in dests {
            while let Some(open) = self.group_stacks.get_mut(&dest).and_then(Vec::pop) {
                let seq = self.sequence_mut(dest);
                if open.hide_if_empty && open.index + 1 == seq.len() {
                    seq.remove(open.index);
                    continue;
                }
                let channel = seq
                    .get(open.index)
                    .map(|e| e.channel.clone())
                    .unwrap_or_default();
                seq.push(
                    LogEntry::new(channel, METHOD_GROUP_END, Vec::new())
                        .with_meta(META_AUTO_CLOSED, true),
                );
                closed += 1;
            }
        }
        self.group_stacks.clear();
        if closed > 0 {
            debug!(closed, "auto-closed open groups");
        }
        closed
    }

    /// Expand every group currently open in the active destination
    pub fn group_uncollapse(&mut self) {
        let dest = self.active_destination();
        let indexes: Vec<usize> = self
            .group_stacks
            .get(&dest)
            .map(|stack| stack.iter().map(|g| g.index).collect())
            .unwrap_or_default();
        let seq = self.sequence_mut(dest);
        for index in indexes {
            if let Some(entry) = seq.get_mut(index) {
                if entry.method == METHOD_GROUP_COLLAPSED {
                    entry.method = METHOD_GROUP.to_string();
                }
            }
        }
    }

    /// Unique id for a group opened through the logging facade
    pub fn next_group_id(&mut self) -> String {
        self.group_seq += 1;
        format!("group{}", self.group_seq)
    }

    // ========================================================================
    // Destinations
    // ========================================================================

    pub fn summary_start(&mut self, priority: i32) {
        self.summary_priorities.push(priority);
        self.log_summary.entry(priority).or_default();
    }

    /// Leave the innermost summary; returns its priority
    pub fn summary_end(&mut self) -> Option<i32> {
        let popped = self.summary_priorities.pop();
        if popped.is_none() {
            debug!("summary end with no open summary ignored");
        }
        popped
    }

    pub fn active_destination(&self) -> Destination {
        match self.summary_priorities.last() {
            Some(priority) => Destination::Summary(*priority),
            None => Destination::Main,
        }
    }

    /// Number of groups open in `dest`
    pub fn open_groups(&self, dest: Destination) -> usize {
        self.group_stacks.get(&dest).map_or(0, Vec::len)
    }

    pub fn sequence(&self, dest: Destination) -> &[LogEntry] {
        match dest {
            Destination::Alerts => &self.alerts,
            Destination::Main => &self.log,
            Destination::Summary(priority) => self
                .log_summary
                .get(&priority)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
        }
    }

    fn sequence_mut(&mut self, dest: Destination) -> &mut Vec<LogEntry> {
        match dest {
            Destination::Alerts => &mut self.alerts,
            Destination::Main => &mut self.log,
            Destination::Summary(priority) => self.log_summary.entry(priority).or_default(),
        }
    }

    /// Destinations that can hold groups: main, then summaries by priority
    fn destinations(&self) -> Vec<Destination> {
        std::iter::once(Destination::Main)
            .chain(self.log_summary.keys().map(|p| Destination::Summary(*p)))
            .collect()
    }

    fn rebuild_group_stacks(&mut self) {
        let mut stacks = HashMap::new();
        for dest in self.destinations() {
            let mut stack: Vec<OpenGroup> = Vec::new();
            for (index, entry) in self.sequence(dest).iter().enumerate() {
                match entry.entry_type() {
                    EntryType::GroupOpen => stack.push(OpenGroup {
                        index,
                        hide_if_empty: entry.hide_if_empty(),
                    }),
                    EntryType::GroupEnd => {
                        stack.pop();
                    }
                    _ => {}
                }
            }
            if !stack.is_empty() {
                stacks.insert(dest, stack);
            }
        }
        self.group_stacks = stacks;
    }

    // ========================================================================
    // Path access
    // ========================================================================

    /// Read a copy of the value at `path` (`.` or `/` separated).
    ///
    /// An empty path returns the whole tree. Absent values are `None`.
    pub fn get(&self, path: &str) -> Option<JsonValue> {
        let segs = path::segments(path);
        let Some((first, rest)) = segs.split_first() else {
            return self.to_json().ok();
        };
        let root = match *first {
            KEY_ALERTS => serde_json::to_value(&self.alerts).ok()?,
            KEY_LOG => serde_json::to_value(&self.log).ok()?,
            KEY_LOG_SUMMARY => serde_json::to_value(&self.log_summary).ok()?,
            key => return path::lookup(self.data.get(key)?, rest).cloned(),
        };
        path::lookup(&root, rest).cloned()
    }

    /// Write `value` at `path`.
    ///
    /// Log sequences can only be replaced whole (`log`, `alerts`,
    /// `logSummary`, `logSummary.<priority>`); group bookkeeping is rebuilt
    /// afterwards. Any other root key addresses free-form data.
    pub fn set(&mut self, path: &str, value: JsonValue) -> Result<()> {
        let segs = path::segments(path);
        let Some((first, rest)) = segs.split_first() else {
            return Err(DebugError::invalid_argument("empty data path"));
        };
        match (*first, rest) {
            (KEY_ALERTS, []) => self.alerts = serde_json::from_value(value)?,
            (KEY_LOG, []) => self.log = serde_json::from_value(value)?,
            (KEY_LOG_SUMMARY, []) => self.log_summary = serde_json::from_value(value)?,
            (KEY_LOG_SUMMARY, [priority]) => {
                let priority: i32 = priority
                    .parse()
                    .map_err(|_| DebugError::path(path, "summary priority must be an integer"))?;
                self.log_summary
                    .insert(priority, serde_json::from_value(value)?);
            }
            (KEY_ALERTS | KEY_LOG | KEY_LOG_SUMMARY, _) => {
                return Err(DebugError::path(
                    path,
                    "log sequences can only be replaced whole",
                ));
            }
            (key, rest) => {
                let slot = self.data.entry(key.to_string()).or_insert(JsonValue::Null);
                return path::assign(slot, rest, value, path);
            }
        }
        self.rebuild_group_stacks();
        Ok(())
    }

    pub fn data(&self) -> &Meta {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Meta {
        &mut self.data
    }

    fn to_json(&self) -> Result<JsonValue> {
        let mut root = self.data.clone();
        root.insert(KEY_ALERTS.into(), serde_json::to_value(&self.alerts)?);
        root.insert(KEY_LOG.into(), serde_json::to_value(&self.log)?);
        root.insert(
            KEY_LOG_SUMMARY.into(),
            serde_json::to_value(&self.log_summary)?,
        );
        Ok(JsonValue::Object(root))
    }

    // ========================================================================
    // Output
    // ========================================================================

    /// Read-only copy for renderers
    pub fn snapshot(&self) -> LogSnapshot {
        LogSnapshot {
            alerts: self.alerts.clone(),
            log_summary: self
                .log_summary
                .iter()
                .rev()
                .map(|(priority, entries)| (*priority, entries.clone()))
                .collect(),
            log: self.log.clone(),
            data: self.data.clone(),
            open_groups: self.group_stacks.values().map(Vec::len).sum(),
            summary_depth: self.summary_priorities.len(),
        }
    }

    /// Drop all entries and bookkeeping; free-form data is kept
    pub fn clear(&mut self) {
        self.alerts.clear();
        self.log.clear();
        self.log_summary.clear();
        self.group_stacks.clear();
        self.summary_priorities.clear();
    }

    pub fn len(&self) -> usize {
        self.alerts.len() + self.log.len() + self.log_summary.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything a renderer needs, in render order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSnapshot {
    pub alerts: Vec<LogEntry>,
    /// Highest priority first
    pub log_summary: Vec<(i32, Vec<LogEntry>)>,
    pub log: Vec<LogEntry>,
    pub data: Meta,
    /// Groups still open when the snapshot was taken
    pub open_groups: usize,
    pub summary_depth: usize,
}

impl LogSnapshot {
    /// Alerts, then summaries by descending priority, then the main log
    pub fn render_order(&self) -> impl Iterator<Item = &LogEntry> {
        self.alerts
            .iter()
            .chain(self.log_summary.iter().flat_map(|(_, entries)| entries.iter()))
            .chain(self.log.iter())
    }
}
