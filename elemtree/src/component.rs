//! Component definitions: function, class and forward-ref components.
//!
//! All three carry a display name and a default-props mapping. Element props
//! are merged over the defaults before the component runs.

use std::any::Any;
use std::sync::Arc;

use serde_json::Value;

use crate::BoxError;
use crate::element::{Element, Node};
use crate::instance::Instance;
use crate::props::{Props, props_from};

type FunctionRender = dyn Fn(&Props, &Value) -> Result<Node, BoxError> + Send + Sync;
type ForwardRender = dyn Fn(&Props) -> Result<Node, BoxError> + Send + Sync;
type Constructor = dyn Fn(&mut Instance) -> Result<Box<dyn Component>, BoxError> + Send + Sync;
type DeriveState = dyn Fn(&Props, &Value) -> Option<Value> + Send + Sync;

/// A component that is a plain function of props and context.
#[derive(Clone)]
pub struct FunctionComponent {
    name: Arc<str>,
    default_props: Arc<Props>,
    render: Arc<FunctionRender>,
}

impl FunctionComponent {
    pub fn new<F>(name: &str, render: F) -> Self
    where
        F: Fn(&Props, &Value) -> Result<Node, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            default_props: Arc::new(Props::new()),
            render: Arc::new(render),
        }
    }

    /// Set the default props from a JSON object.
    pub fn default_props(mut self, defaults: Value) -> Self {
        self.default_props = Arc::new(props_from(defaults));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn defaults(&self) -> &Props {
        &self.default_props
    }

    /// Run the component.
    pub fn call(&self, props: &Props, context: &Value) -> Result<Node, BoxError> {
        (self.render)(props, context)
    }

    /// Create an element of this component type.
    pub fn element(&self) -> Element {
        Element::new(self.clone())
    }
}

/// A wrapper whose inner render function is bound at definition time.
#[derive(Clone)]
pub struct ForwardRef {
    name: Arc<str>,
    default_props: Arc<Props>,
    render: Arc<ForwardRender>,
}

impl ForwardRef {
    pub fn new<F>(name: &str, render: F) -> Self
    where
        F: Fn(&Props) -> Result<Node, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            default_props: Arc::new(Props::new()),
            render: Arc::new(render),
        }
    }

    pub fn default_props(mut self, defaults: Value) -> Self {
        self.default_props = Arc::new(props_from(defaults));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn defaults(&self) -> &Props {
        &self.default_props
    }

    pub fn call(&self, props: &Props) -> Result<Node, BoxError> {
        (self.render)(props)
    }

    pub fn element(&self) -> Element {
        Element::new(self.clone())
    }
}

/// Behavior of a class component instance.
///
/// Only `render` is required. The optional capabilities return `None` when
/// the component does not provide them.
pub trait Component: Any + Send + Sync {
    /// Produce this component's children. State updates made through
    /// `this` are visible immediately.
    fn render(&mut self, this: &mut Instance) -> Result<Node, BoxError>;

    /// Legacy child context, merged over the ambient context for the
    /// subtree. Returns `None` if the component provides no child context.
    fn child_context(&self, _this: &Instance) -> Option<Value> {
        None
    }

    /// Premount hook. Returns `None` if the component has no such hook.
    fn component_will_mount(&mut self, _this: &mut Instance) -> Option<Result<(), BoxError>> {
        None
    }

    /// Unmount hook. Returns `None` if the component has no such hook.
    fn component_will_unmount(&mut self, _this: &mut Instance) -> Option<Result<(), BoxError>> {
        None
    }
}

impl dyn Component {
    /// Downcast to the concrete component type.
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref()
    }
}

/// A component backed by a stateful instance.
#[derive(Clone)]
pub struct ClassComponent {
    name: Arc<str>,
    default_props: Arc<Props>,
    construct: Arc<Constructor>,
    derive_state: Option<Arc<DeriveState>>,
    pure: bool,
}

impl ClassComponent {
    /// Define a class component from an infallible constructor.
    ///
    /// The constructor receives the instance with props and context already
    /// set and `null` state; it may set the initial state.
    pub fn new<C, F>(name: &str, construct: F) -> Self
    where
        C: Component,
        F: Fn(&mut Instance) -> C + Send + Sync + 'static,
    {
        Self::try_new(name, move |this| Ok(construct(this)))
    }

    /// Define a class component whose constructor can fail.
    pub fn try_new<C, F>(name: &str, construct: F) -> Self
    where
        C: Component,
        F: Fn(&mut Instance) -> Result<C, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            default_props: Arc::new(Props::new()),
            construct: Arc::new(move |this: &mut Instance| {
                construct(this).map(|component| Box::new(component) as Box<dyn Component>)
            }),
            derive_state: None,
            pure: false,
        }
    }

    pub fn default_props(mut self, defaults: Value) -> Self {
        self.default_props = Arc::new(props_from(defaults));
        self
    }

    /// Static hook deriving state from props before each render.
    ///
    /// A `None` or `null` result leaves the state untouched.
    pub fn derive_state_from_props<F>(mut self, derive: F) -> Self
    where
        F: Fn(&Props, &Value) -> Option<Value> + Send + Sync + 'static,
    {
        self.derive_state = Some(Arc::new(derive));
        self
    }

    /// Mark the component as pure. Pure components are traversed like any
    /// other class component.
    pub fn pure(mut self) -> Self {
        self.pure = true;
        self
    }

    pub fn is_pure(&self) -> bool {
        self.pure
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn defaults(&self) -> &Props {
        &self.default_props
    }

    pub fn has_derived_state(&self) -> bool {
        self.derive_state.is_some()
    }

    /// Construct a component for `this`.
    pub fn construct(&self, this: &mut Instance) -> Result<Box<dyn Component>, BoxError> {
        (self.construct)(this)
    }

    /// Run the derive-state hook, if any.
    pub fn derive_state(&self, props: &Props, state: &Value) -> Option<Value> {
        self.derive_state
            .as_ref()
            .and_then(|derive| derive(props, state))
            .filter(|value| !value.is_null())
    }

    pub fn element(&self) -> Element {
        Element::new(self.clone())
    }
}
