//! Class component instances.
//!
//! An [`Instance`] lives for a single visit of a single class element. It
//! owns the merged props, the legacy context and the component state.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::props::{Props, assign};

/// Identity of one class component instance.
///
/// Two elements of the same class get different ids within a walk. Serializes
/// as the bare UUID string, so visitors can record ids in JSON.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(Uuid);

impl InstanceId {
    fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// Props, context and state of one class component instance.
///
/// `state` is `null` until something sets it. State updates are applied
/// immediately, so a value written during render is readable later in the
/// same render.
#[derive(Debug, Clone)]
pub struct Instance {
    id: InstanceId,
    props: Props,
    context: Value,
    state: Value,
}

impl Instance {
    /// Create an instance with `null` state.
    pub fn new(props: Props, context: Value) -> Self {
        Self {
            id: InstanceId::fresh(),
            props,
            context,
            state: Value::Null,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    /// Get a single prop.
    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    /// The legacy context passed down from ancestors.
    pub fn context(&self) -> &Value {
        &self.context
    }

    pub fn state(&self) -> &Value {
        &self.state
    }

    /// Merge `partial` into the state right away.
    ///
    /// Object keys of `partial` overwrite existing keys. A non-object
    /// payload contributes nothing.
    pub fn set_state(&mut self, partial: impl Into<Value>) {
        let partial = partial.into();
        if !partial.is_object() && !partial.is_null() {
            log::warn!("[instance {}] ignoring non-object state update: {partial}", self.id);
        }
        self.state = assign(&self.state, &partial);
    }

    /// Functional form of [`set_state`](Self::set_state): `f` receives the
    /// current state, props and context and returns the partial update.
    pub fn update_state<F>(&mut self, f: F)
    where
        F: FnOnce(&Value, &Props, &Value) -> Value,
    {
        let partial = f(&self.state, &self.props, &self.context);
        self.set_state(partial);
    }
}
