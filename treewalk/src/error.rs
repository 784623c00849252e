//! Traversal error types.

use std::any::Any;

use elemtree::BoxError;
use thiserror::Error;

/// The single failure outcome of a traversal.
///
/// The first error raised anywhere in the tree ends the walk. User errors
/// are kept intact as the [`source`](std::error::Error::source).
#[derive(Debug, Error)]
pub enum WalkError {
    /// The visitor returned an error.
    #[error("visitor failed on {node}: {source}")]
    Visitor {
        /// Label of the node being visited.
        node: String,
        source: BoxError,
    },

    /// A component failed to produce its children.
    #[error("component '{component}' failed to render: {source}")]
    Render {
        /// Name of the component.
        component: String,
        source: BoxError,
    },

    /// A lifecycle hook returned an error.
    #[error("lifecycle hook '{hook}' of '{component}' failed: {source}")]
    Lifecycle {
        /// Name of the component.
        component: String,
        /// Name of the hook (e.g., "componentWillMount").
        hook: &'static str,
        source: BoxError,
    },

    /// User code panicked during the traversal.
    #[error("traversal panicked: {message}")]
    Panic {
        /// Panic message extracted from the panic payload.
        message: String,
    },
}

impl WalkError {
    /// The error raised by user code, if the failure came from one.
    pub fn user_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Visitor { source, .. }
            | Self::Render { source, .. }
            | Self::Lifecycle { source, .. } => Some(source.as_ref()),
            Self::Panic { .. } => None,
        }
    }

    /// Wrap a caught panic payload. `panic!` payloads are either a `&str` or
    /// a formatted `String`.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = match payload.downcast::<String>() {
            Ok(message) => *message,
            Err(payload) => match payload.downcast_ref::<&str>() {
                Some(message) => (*message).to_string(),
                None => "panic payload is not a string".to_string(),
            },
        };
        Self::Panic { message }
    }
}
