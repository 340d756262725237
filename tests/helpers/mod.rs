//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::rc::Rc;
use std::sync::Once;

use debug_console::{
    Abstracter, ClassDef, ClassRegistry, Config, MethodDef, ObjectSnapshot, ParamDef, PropertyDef,
    Snapshot, Visibility,
};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Route library tracing to the test writer; honors `RUST_LOG`
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Small class hierarchy exercising inheritance, docs and magic members.
///
/// ```text
/// Model (implements Countable)
/// ├── User (implements JsonSerializable, __get/__call)
/// └── Account (__debugInfo)
/// ```
pub fn registry() -> ClassRegistry {
    ClassRegistry::new()
        .with(ClassDef::interface("Countable").method(
            MethodDef::public("count")
                .returns("int")
                .doc("/** Count elements of an object. */"),
        ))
        .with(ClassDef::interface("JsonSerializable").method(MethodDef::public("jsonSerialize")))
        .with(ClassDef::interface("Traversable"))
        .with(ClassDef::interface("IteratorAggregate").implements("Traversable"))
        .with(ClassDef::interface("DateTimeInterface"))
        .with(
            ClassDef::new("Model")
                .implements("Countable")
                .doc("/**\n * Base model.\n *\n * @property-read int $id Primary key\n */")
                .constant("TABLE", "models")
                .constant("VERSION", 1)
                .property(
                    PropertyDef::new("name", Visibility::Protected)
                        .doc("/** @var string Display name */"),
                )
                .property(PropertyDef::new("secret", Visibility::Private))
                .property(PropertyDef::new("instances", Visibility::Public).static_value(2))
                .method(MethodDef::public("__construct"))
                .method(
                    MethodDef::public("save")
                        .param(ParamDef::new("force").typed("bool").default_value(false))
                        .doc("/**\n * Persist the model.\n *\n * @param bool $force Skip dirty check\n * @return bool\n */"),
                )
                .method(MethodDef::public("count").doc("/** {@inheritDoc} */"))
                .method(MethodDef::new("audit", Visibility::Private)),
        )
        .with(
            ClassDef::new("User")
                .extends("Model")
                .implements("JsonSerializable")
                .doc("/**\n * Application user.\n *\n * @property string $email Login address\n * @method bool notify(string $message, int $level = 1) Send a notice\n */")
                .constant("VERSION", 2)
                .property(PropertyDef::new("name", Visibility::Public).typed("string"))
                .property(PropertyDef::new("role", Visibility::Protected))
                .method(MethodDef::public("__get").param(ParamDef::new("name")))
                .method(MethodDef::public("__call"))
                .method(MethodDef::public("jsonSerialize").returns("array"))
                .method(
                    MethodDef::public("legacy").doc("/**\n * Old API.\n *\n * @deprecated use save\n */"),
                )
                .method(
                    MethodDef::public("save")
                        .param(ParamDef::new("force").typed("bool").default_value(false)),
                ),
        )
        .with(
            ClassDef::new("Profile")
                .property(PropertyDef::new("visible", Visibility::Public))
                .property(PropertyDef::new("hidden", Visibility::Protected))
                .method(MethodDef::public("__debugInfo"))
                .method(MethodDef::public("__toString")),
        )
        .with(
            ClassDef::new("Account")
                .extends("Model")
                .method(MethodDef::public("__debugInfo")),
        )
        .with(ClassDef::new("Node").property(PropertyDef::new("next", Visibility::Public)))
        .with(ClassDef::new("Collection").implements("IteratorAggregate"))
        .with(ClassDef::new("Moment").implements("DateTimeInterface"))
        .with(ClassDef::new("Closure").method(MethodDef::public("__invoke")))
        .with(ClassDef::new("Secret").property(PropertyDef::new("token", Visibility::Private)))
}

pub fn abstracter(config: Config) -> Abstracter {
    init_tracing();
    Abstracter::new(config, Rc::new(registry()))
}

/// Unwrap an object snapshot or fail the test
pub fn object(snapshot: &Snapshot) -> &ObjectSnapshot {
    match snapshot.as_object() {
        Some(obj) => obj,
        None => panic!("expected object snapshot, got {:?}", snapshot),
    }
}

pub fn property_names(obj: &ObjectSnapshot) -> Vec<&str> {
    obj.properties.iter().map(|p| p.name.as_str()).collect()
}

pub fn method_names(obj: &ObjectSnapshot) -> Vec<&str> {
    obj.methods.iter().map(|m| m.name.as_str()).collect()
}
