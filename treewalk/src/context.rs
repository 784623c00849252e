//! Per-branch provider values.
//!
//! A [`ContextMap`] is immutable once built. Extending it for a provider's
//! subtree produces a new map and leaves the parent's map (and therefore every
//! sibling and ancestor) untouched.

use std::sync::Arc;

use elemtree::{Context, ProviderKey};
use indexmap::IndexMap;
use serde_json::Value;

/// Provider identity to the value most recently bound along one branch.
///
/// A provider without a value binds `None`, which reads the same as having
/// no provider at all.
#[derive(Debug, Clone, Default)]
pub struct ContextMap {
    entries: Arc<IndexMap<ProviderKey, Option<Value>>>,
}

impl ContextMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy of this map with `key` bound to `value`.
    pub fn extend(&self, key: ProviderKey, value: Option<Value>) -> Self {
        let mut entries = IndexMap::clone(&self.entries);
        entries.insert(key, value);
        Self {
            entries: Arc::new(entries),
        }
    }

    /// The value bound for `key`, if any.
    pub fn lookup(&self, key: ProviderKey) -> Option<&Value> {
        self.entries.get(&key).and_then(Option::as_ref)
    }

    /// Whether a provider for `key` encloses this branch.
    pub fn contains(&self, key: ProviderKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Provider keys in the order they were first bound.
    pub fn keys(&self) -> impl Iterator<Item = ProviderKey> + '_ {
        self.entries.keys().copied()
    }
}

/// Resolve the value a consumer of `context` reads on this branch.
///
/// A bound provider value wins; otherwise the context's current default.
pub fn resolve(map: &ContextMap, context: &Context) -> Value {
    map.lookup(context.provider_key())
        .cloned()
        .unwrap_or_else(|| context.default_value())
}
