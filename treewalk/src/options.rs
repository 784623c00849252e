//! Traversal configuration.

use serde::{Deserialize, Serialize};

/// Options for a single traversal.
///
/// Deserializes from a camelCase object, so `{"componentWillUnmount": true}`
/// is a complete options value; missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WalkOptions {
    /// Fire `componentWillUnmount` instead of `componentWillMount` after a
    /// class instance's subtree settles, when the instance has that hook.
    pub component_will_unmount: bool,

    /// How sibling branches are joined when one of them fails.
    pub fan_out: FanOut,

    /// Convert panics in user code into [`WalkError::Panic`](crate::WalkError::Panic)
    /// instead of unwinding into the caller.
    pub catch_panics: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            component_will_unmount: false,
            fan_out: FanOut::default(),
            catch_panics: true,
        }
    }
}

impl WalkOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the unmount hook over the premount hook.
    pub fn component_will_unmount(mut self, enabled: bool) -> Self {
        self.component_will_unmount = enabled;
        self
    }

    /// Set the sibling join policy.
    pub fn fan_out(mut self, fan_out: FanOut) -> Self {
        self.fan_out = fan_out;
        self
    }

    /// Enable or disable panic capture.
    pub fn catch_panics(mut self, enabled: bool) -> Self {
        self.catch_panics = enabled;
        self
    }
}

/// Join policy for concurrently walked siblings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FanOut {
    /// Keep driving every sibling to completion and report the first error
    /// that occurred. Visitor side effects of healthy siblings still happen.
    #[default]
    Drain,
    /// Drop in-flight siblings as soon as one branch fails.
    FailFast,
}
