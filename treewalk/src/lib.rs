//! Asynchronous depth-first traversal of an element tree.
//!
//! [`walk`] visits every reachable node of an [`elemtree`] tree, rendering
//! components along the way, so that side effects such as data fetching can
//! be collected before the tree is emitted. Sibling branches are walked
//! concurrently; the first error anywhere ends the traversal.
//!
//! ```
//! use elemtree::{nodes, Element, Node};
//! use treewalk::{visit_fn, walk, WalkOptions};
//!
//! # futures::executor::block_on(async {
//! let tree: Node = Element::host("ul").children(nodes!["a", 1]).into();
//! let visitor = visit_fn(|visit| {
//!     println!("{}", visit.node.label());
//!     Ok(())
//! });
//! walk(&tree, &visitor, serde_json::Value::Null, WalkOptions::default())
//!     .await
//!     .unwrap();
//! # });
//! ```

pub mod classify;
pub mod context;
mod error;
mod instantiate;
mod options;
mod visitor;
mod walker;

use std::panic::AssertUnwindSafe;

use elemtree::Node;
use futures::FutureExt;
use serde_json::Value;

pub use classify::{Classified, ComponentKind, NodeKind, classify};
pub use context::{ContextMap, resolve};
pub use error::WalkError;
pub use options::{FanOut, WalkOptions};
pub use visitor::{FnVisitor, Outcome, Visit, Visitor, visit_fn};

use walker::{Scope, Walker};

/// Reusable walker holding traversal options.
#[derive(Debug, Clone, Default)]
pub struct TreeWalker {
    options: WalkOptions,
}

impl TreeWalker {
    pub fn new(options: WalkOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &WalkOptions {
        &self.options
    }

    /// Walk `tree`, calling `visitor` on every visited node.
    ///
    /// Resolves once every reachable node has been visited, or with the first
    /// error raised by the visitor, a component or a lifecycle hook.
    pub async fn walk<V>(&self, tree: &Node, visitor: &V, context: Value) -> Result<(), WalkError>
    where
        V: Visitor + ?Sized,
    {
        log::debug!("[walk] start at {}", tree.label());

        let walker = Walker::new(visitor, &self.options);
        let traversal = walker.run(tree, Scope::root(context));

        let result = if self.options.catch_panics {
            AssertUnwindSafe(traversal)
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(WalkError::from_panic(panic)))
        } else {
            traversal.await
        };

        match &result {
            Ok(()) => log::debug!("[walk] completed"),
            Err(error) => log::warn!("[walk] failed: {error}"),
        }
        result
    }
}

/// Walk `tree` with `visitor`, an initial legacy `context` and `options`.
pub async fn walk<V>(
    tree: &Node,
    visitor: &V,
    context: impl Into<Value>,
    options: WalkOptions,
) -> Result<(), WalkError>
where
    V: Visitor + ?Sized,
{
    TreeWalker::new(options)
        .walk(tree, visitor, context.into())
        .await
}

/// Walk `tree` with a `null` context and default options.
pub async fn walk_default<V>(tree: &Node, visitor: &V) -> Result<(), WalkError>
where
    V: Visitor + ?Sized,
{
    TreeWalker::default().walk(tree, visitor, Value::Null).await
}
