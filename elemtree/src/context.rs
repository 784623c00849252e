//! Context definitions: a provider/consumer pair sharing one identity.
//!
//! A [`Context`] is created once and then used to build provider elements,
//! which bind a value for their subtree, and consumer elements, which read
//! the nearest bound value or fall back to the context's default.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

use crate::BoxError;
use crate::element::{Element, ElementType, Node};

static NEXT_CONTEXT: AtomicU64 = AtomicU64::new(0);

/// Identity under which provider values are stored.
///
/// Providers and consumers of the same [`Context`] share the key, so a
/// consumer can find the value bound by its provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProviderKey(u64);

impl ProviderKey {
    /// Get the raw key value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
struct ContextInner {
    key: ProviderKey,
    name: String,
    default: RwLock<Value>,
}

/// A context definition. Cheap to clone; clones share identity and default.
#[derive(Debug, Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    /// Create a context with the given default value.
    pub fn new(default: impl Into<Value>) -> Self {
        Self::named("Context", default)
    }

    /// Create a context with a display name.
    pub fn named(name: impl Into<String>, default: impl Into<Value>) -> Self {
        let key = ProviderKey(NEXT_CONTEXT.fetch_add(1, Ordering::Relaxed));
        Self {
            inner: Arc::new(ContextInner {
                key,
                name: name.into(),
                default: RwLock::new(default.into()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The identity used to correlate providers and consumers.
    pub fn provider_key(&self) -> ProviderKey {
        self.inner.key
    }

    /// The current default value, read by consumers without a provider.
    pub fn default_value(&self) -> Value {
        self.inner
            .default
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Change the default value seen by consumers without a provider.
    pub fn set_default(&self, value: impl Into<Value>) {
        let mut guard = self
            .inner
            .default
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = value.into();
        log::debug!("[context] default of {} changed", self.inner.name);
    }

    /// Build a provider element binding `value` for `children`.
    pub fn provider(&self, value: impl Into<Value>, children: impl Into<Node>) -> Node {
        Element::new(ElementType::Provider(self.clone()))
            .prop("value", value)
            .children(children)
            .into()
    }

    /// Build a provider element that carries no value.
    ///
    /// Consumers below it read the default value.
    pub fn provider_unset(&self, children: impl Into<Node>) -> Node {
        Element::new(ElementType::Provider(self.clone()))
            .children(children)
            .into()
    }

    /// Build a consumer element whose children are produced from the
    /// resolved context value.
    pub fn consumer<F>(&self, render: F) -> Node
    where
        F: Fn(&Value) -> Result<Node, BoxError> + Send + Sync + 'static,
    {
        Element::new(ElementType::Consumer(Consumer {
            context: self.clone(),
            render: Arc::new(render),
        }))
        .into()
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        self.inner.key == other.inner.key
    }
}

impl Eq for Context {}

type ConsumerFn = dyn Fn(&Value) -> Result<Node, BoxError> + Send + Sync;

/// The consumer side of a context: a children-as-function element type.
#[derive(Clone)]
pub struct Consumer {
    context: Context,
    render: Arc<ConsumerFn>,
}

impl std::fmt::Debug for Consumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Consumer({})", self.context.name())
    }
}

impl Consumer {
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Produce the consumer's children from a resolved value.
    pub fn render(&self, value: &Value) -> Result<Node, BoxError> {
        (self.render)(value)
    }
}
