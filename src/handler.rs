//! Handlers and adapter conversion
//!
//! A handler is a reference to callback code (an entrypoint in a bundled
//! artifact plus an exported client name) together with the properties bound
//! into its runtime environment. Handlers are target-agnostic; when a target
//! needs to feed one from a provider-native trigger, it wraps the original in
//! an adapter: a new handler whose entrypoint is the target-specific adapter
//! and whose bound properties embed the original under a reserved key. The
//! adapter normalizes the provider payload and invokes the original, so user
//! code never depends on any target's payload shape.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Reserved bound-property key the original handler is embedded under when
/// converting. A colliding key in the adapter's extra properties is
/// overwritten by the embedded original.
pub const CONVERTED_HANDLER_KEY: &str = "handler";

/// Code location of a handler: a bundle-relative source path and the exported
/// client name inside it. Bundling itself happens outside this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entrypoint {
    pub source: String,
    pub export: String,
}

impl Entrypoint {
    pub fn new(source: &str, export: &str) -> Self {
        Self {
            source: source.to_string(),
            export: export.to_string(),
        }
    }
}

/// A value bound into a handler's runtime environment.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum BoundValue {
    /// Plain data, serialized into the environment as-is.
    Json(Value),
    /// Another handler, kept by reference so callers can key on its identity.
    Handler(Rc<Handler>),
}

/// A target-agnostic callback definition. Immutable once constructed.
#[derive(Debug, Serialize)]
pub struct Handler {
    pub entrypoint: Entrypoint,
    pub bound: BTreeMap<String, BoundValue>,
}

impl Handler {
    pub fn new(entrypoint: Entrypoint, bound: BTreeMap<String, BoundValue>) -> Rc<Self> {
        Rc::new(Self { entrypoint, bound })
    }

    /// Handler with no bound properties.
    pub fn bare(source: &str, export: &str) -> Rc<Self> {
        Self::new(Entrypoint::new(source, export), BTreeMap::new())
    }

    /// Stable identity of a handler instance. Two handlers with equal
    /// contents but separate allocations have distinct identities; the same
    /// `Rc` cloned keeps one.
    pub fn identity(this: &Rc<Handler>) -> HandlerIdentity {
        HandlerIdentity(Rc::as_ptr(this) as usize)
    }
}

/// Identity token for a handler instance, used to memoize derived resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerIdentity(usize);

/// What a target supplies to convert a handler: the adapter's entrypoint,
/// its exported client name, and any extra properties the adapter itself
/// needs at runtime.
#[derive(Debug, Clone)]
pub struct AdapterSpec {
    pub source: String,
    pub client_name: String,
    pub extra_bound: BTreeMap<String, BoundValue>,
}

impl AdapterSpec {
    pub fn new(source: &str, client_name: &str) -> Self {
        Self {
            source: source.to_string(),
            client_name: client_name.to_string(),
            extra_bound: BTreeMap::new(),
        }
    }

    pub fn with_bound(mut self, key: &str, value: BoundValue) -> Self {
        self.extra_bound.insert(key.to_string(), value);
        self
    }
}

/// Wrap `original` in a target-specific adapter.
///
/// The result is a new logical handler: the adapter is the entrypoint, the
/// adapter's extra properties are bound, and the original handler is embedded
/// under [`CONVERTED_HANDLER_KEY`].
pub fn convert(original: Rc<Handler>, adapter: &AdapterSpec) -> Rc<Handler> {
    let mut bound = adapter.extra_bound.clone();
    bound.insert(
        CONVERTED_HANDLER_KEY.to_string(),
        BoundValue::Handler(original),
    );
    Handler::new(
        Entrypoint::new(&adapter.source, &adapter.client_name),
        bound,
    )
}
