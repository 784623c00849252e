//! The visitor invoked on every visited node.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use elemtree::{BoxError, Component, Element, Instance, InstanceId, Node};
use serde_json::Value;

/// What the walker should do after visiting a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Outcome {
    /// Descend into the node's children.
    #[default]
    Continue,
    /// Skip the node's children. Siblings are unaffected.
    Stop,
}

impl From<bool> for Outcome {
    fn from(descend: bool) -> Self {
        if descend { Self::Continue } else { Self::Stop }
    }
}

impl From<()> for Outcome {
    fn from(_: ()) -> Self {
        Self::Continue
    }
}

/// Arguments of one visit.
#[derive(Clone, Copy)]
pub struct Visit<'a> {
    /// The node being visited: a primitive or an element.
    pub node: &'a Node,
    /// The class instance, for class component elements.
    pub instance: Option<&'a Instance>,
    /// The live class component, for class component elements.
    pub component: Option<&'a (dyn Component + 'static)>,
    /// The ambient legacy context.
    pub context: &'a Value,
    /// The context handed to this element's children. Absent for primitives.
    pub child_context: Option<&'a Value>,
}

impl<'a> Visit<'a> {
    /// The visited element, if the node is one.
    pub fn element(&self) -> Option<&'a Element> {
        self.node.as_element()
    }

    /// Identity of the class instance, for keying per-instance data.
    pub fn instance_id(&self) -> Option<InstanceId> {
        self.instance.map(Instance::id)
    }

    /// Downcast the live class component.
    pub fn component_as<T: Component>(&self) -> Option<&'a T> {
        self.component?.downcast_ref()
    }
}

impl std::fmt::Debug for Visit<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Visit")
            .field("node", &self.node.label())
            .field("instance", &self.instance_id())
            .field("context", self.context)
            .field("child_context", &self.child_context)
            .finish()
    }
}

/// Callback run on every visited node.
///
/// Returning [`Outcome::Stop`] prunes the node's children. Returning an error
/// ends the whole traversal with that error.
#[async_trait]
pub trait Visitor: Send + Sync {
    async fn visit(&self, visit: Visit<'_>) -> Result<Outcome, BoxError>;
}

#[async_trait]
impl<'v, V: Visitor + ?Sized> Visitor for &'v V {
    async fn visit(&self, visit: Visit<'_>) -> Result<Outcome, BoxError> {
        (**self).visit(visit).await
    }
}

#[async_trait]
impl<V: Visitor + ?Sized> Visitor for Arc<V> {
    async fn visit(&self, visit: Visit<'_>) -> Result<Outcome, BoxError> {
        (**self).visit(visit).await
    }
}

#[async_trait]
impl<V: Visitor + ?Sized> Visitor for Box<V> {
    async fn visit(&self, visit: Visit<'_>) -> Result<Outcome, BoxError> {
        (**self).visit(visit).await
    }
}

/// Visitor backed by a synchronous closure. See [`visit_fn`].
pub struct FnVisitor<F, O> {
    f: F,
    _outcome: PhantomData<fn() -> O>,
}

/// Wrap a synchronous closure as a [`Visitor`].
///
/// The closure may return anything convertible into an [`Outcome`]: `()`,
/// a `bool` (where `false` stops descent) or an `Outcome`.
pub fn visit_fn<F, O>(f: F) -> FnVisitor<F, O>
where
    F: Fn(&Visit<'_>) -> Result<O, BoxError> + Send + Sync,
    O: Into<Outcome>,
{
    FnVisitor {
        f,
        _outcome: PhantomData,
    }
}

#[async_trait]
impl<F, O> Visitor for FnVisitor<F, O>
where
    F: Fn(&Visit<'_>) -> Result<O, BoxError> + Send + Sync,
    O: Into<Outcome>,
{
    async fn visit(&self, visit: Visit<'_>) -> Result<Outcome, BoxError> {
        (self.f)(&visit).map(Into::into)
    }
}
