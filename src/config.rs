//! Debug console configuration
//!
//! Loaded from YAML or JSON. Every key is optional; unknown or invalid
//! values fall back to the most conservative behavior instead of failing.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

/// Property/method ordering inside an object snapshot
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ObjectSort {
    /// Declaration order
    None,
    Name,
    /// Visibility rank, then name
    #[default]
    Visibility,
}

impl ObjectSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectSort::None => "none",
            ObjectSort::Name => "name",
            ObjectSort::Visibility => "visibility",
        }
    }

    /// Lenient parse; anything unrecognized means "don't sort"
    pub fn parse_lossy(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => ObjectSort::Name,
            "visibility" | "vis" => ObjectSort::Visibility,
            "none" | "" => ObjectSort::None,
            other => {
                warn!(value = other, "unsupported objectSort, not sorting");
                ObjectSort::None
            }
        }
    }
}

impl From<String> for ObjectSort {
    fn from(s: String) -> Self {
        ObjectSort::parse_lossy(&s)
    }
}

impl From<ObjectSort> for String {
    fn from(sort: ObjectSort) -> Self {
        sort.as_str().to_string()
    }
}

/// Configuration surface consumed by the abstraction engine and logger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub collect_constants: bool,
    pub collect_methods: bool,
    /// Reuse method metadata across instances of the same class
    pub cache_methods: bool,
    /// Consult an object's `__debugInfo` hook
    pub use_debug_info: bool,
    pub object_sort: ObjectSort,
    /// Classes (or ancestors/interfaces) never abstracted beyond a stub
    pub objects_exclude: Vec<String>,
    /// Object nesting limit; 0 = unlimited
    pub max_depth: usize,
    /// Name of the root channel
    pub channel_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            collect_constants: true,
            collect_methods: true,
            cache_methods: true,
            use_debug_info: true,
            object_sort: ObjectSort::default(),
            objects_exclude: Vec::new(),
            max_depth: 0,
            channel_name: "general".to_string(),
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_json_value(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Load from a file; `.json` is read as JSON, anything else as YAML
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };
        debug!(path = %path.display(), "loaded debug console config");
        Ok(config)
    }

    pub fn collect_methods(mut self, enabled: bool) -> Self {
        self.collect_methods = enabled;
        self
    }

    pub fn collect_constants(mut self, enabled: bool) -> Self {
        self.collect_constants = enabled;
        self
    }

    pub fn cache_methods(mut self, enabled: bool) -> Self {
        self.cache_methods = enabled;
        self
    }

    pub fn use_debug_info(mut self, enabled: bool) -> Self {
        self.use_debug_info = enabled;
        self
    }

    pub fn object_sort(mut self, sort: ObjectSort) -> Self {
        self.object_sort = sort;
        self
    }

    pub fn exclude(mut self, class: impl Into<String>) -> Self {
        self.objects_exclude.push(class.into());
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}
