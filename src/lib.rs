//! Debug Console - runtime introspection and hierarchical debug logging.
//!
//! Captures arbitrary runtime values, turns them into serializable snapshots
//! that hold no live references, and accumulates them into a structured log:
//! - `classify` - value categories and whether a value needs abstraction
//! - `doc` - documentation comment parser (`@param`, `@property`, `@method`, ...)
//! - `reflection` - per-class declarations behind the `Reflector` capability
//! - `abstraction` - the object/value abstraction engine with start/end hooks
//! - `store` - alerts, main log and prioritized summaries with group tracking
//! - `debug` - the logging facade and its channels
//!
//! # Architecture
//!
//! ```text
//! Debug::log(args)
//! ├── Abstracter::abstract_value(arg)   (per argument)
//! │   ├── classify
//! │   ├── Reflector + members  (constants, properties, methods)
//! │   ├── DocCache             (types, descriptions, magic members)
//! │   └── ObjectHook list      (on_start / on_end)
//! └── LogStore::append(entry)
//!     ├── alerts
//!     ├── logSummary { priority -> [entries] }
//!     └── log
//! ```
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use debug_console::{ClassDef, ClassRegistry, Config, Debug, Object, PropertyDef, Value, Visibility};
//!
//! let registry = ClassRegistry::new().with(
//!     ClassDef::new("User").property(PropertyDef::new("name", Visibility::Protected)),
//! );
//! let debug = Debug::new(Config::default(), Rc::new(registry));
//!
//! let user = Object::new("User").with_property("name", "ada").into_value();
//! debug.log(vec![Value::from("user"), user]);
//!
//! let output = debug.output();
//! let snapshot = output.log[0].args[1].as_object().unwrap();
//! assert_eq!(snapshot.property("name").unwrap().value.as_str(), Some("ada"));
//! ```

pub mod abstraction;
pub mod classify;
pub mod config;
pub mod debug;
pub mod doc;
mod error;
pub mod reflection;
pub mod snapshot;
pub mod store;
pub mod value;

// Re-exports
pub use abstraction::{
    Abstracter, BuiltinObjects, HookContext, ObjectDraft, ObjectHook, Propagation,
    TraversalContext,
};
pub use classify::{classify, Kind, TypeHint, TypeInfo};
pub use config::{Config, ObjectSort};
pub use debug::{Debug, OutputHook};
pub use doc::{parse_doc_block, DocBlock, DocCache, DocTag};
pub use error::{DebugError, Result};
pub use reflection::{
    ClassDef, ClassRegistry, ConstantDef, MemberKind, MethodDef, ParamDef, PropertyDef, Reflector,
};
pub use snapshot::{
    MethodRecord, ObjectSnapshot, ParamRecord, PropertyRecord, Snapshot, ValueSource, Visibility,
};
pub use store::{Destination, LogEntry, LogSnapshot, LogStore, Meta};
pub use value::{Array, ArrayKey, Instance, Object, ObjectRef, Resource, Value};
