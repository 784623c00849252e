//! Component instantiation.
//!
//! [`Mount::prepare`] turns an element into something that can produce its
//! children. Host and provider elements hand back their own children;
//! components run user code. Class components additionally get an
//! [`Instance`] that lives until [`Mount::finish`] fires its lifecycle hook.

use std::borrow::Cow;
use std::sync::Arc;

use elemtree::{
    BoxError, ClassComponent, Component, Element, ElementType, ForwardRef, FunctionComponent,
    Instance, Node, Props, assign, merge_props,
};
use serde_json::Value;

use crate::error::WalkError;
use crate::options::WalkOptions;

/// An element ready to produce its children.
pub(crate) enum Mount<'a> {
    /// Host and provider elements: children come from the element itself.
    Host { children: &'a Node },
    Function {
        component: &'a FunctionComponent,
        props: Props,
    },
    ForwardRef {
        component: &'a ForwardRef,
        props: Props,
    },
    Class {
        class: &'a ClassComponent,
        instance: Instance,
        component: Box<dyn Component>,
    },
}

impl<'a> Mount<'a> {
    /// Prepare `element` under the ambient `context`.
    ///
    /// Returns the mount and the context for the element's children. For
    /// class components this constructs the instance, derives state and
    /// merges the child context; render is deferred until
    /// [`produce_children`](Self::produce_children).
    pub(crate) fn prepare(
        element: &'a Element,
        context: &Arc<Value>,
    ) -> Result<(Self, Arc<Value>), WalkError> {
        let mount = match &element.ty {
            ElementType::Host(_) | ElementType::Provider(_) => Self::Host {
                children: &element.children,
            },
            ElementType::Function(component) => Self::Function {
                component,
                props: merge_props(component.defaults(), &element.props),
            },
            ElementType::ForwardRef(component) => Self::ForwardRef {
                component,
                props: merge_props(component.defaults(), &element.props),
            },
            ElementType::Class(class) => return Self::prepare_class(class, element, context),
            ElementType::Consumer(consumer) => {
                // Consumers are resolved by the walker before reaching here.
                return Err(WalkError::Render {
                    component: element.name(),
                    source: format!("{consumer:?} cannot be mounted").into(),
                });
            }
        };
        Ok((mount, Arc::clone(context)))
    }

    fn prepare_class(
        class: &'a ClassComponent,
        element: &Element,
        context: &Arc<Value>,
    ) -> Result<(Self, Arc<Value>), WalkError> {
        let render_error = |source: BoxError| WalkError::Render {
            component: class.name().to_string(),
            source,
        };

        let props = merge_props(class.defaults(), &element.props);
        let mut instance = Instance::new(props, Value::clone(context));
        let component = class.construct(&mut instance).map_err(render_error)?;

        if let Some(derived) = class.derive_state(instance.props(), instance.state()) {
            instance.set_state(derived);
        }

        let child_context = match component.child_context(&instance) {
            Some(extra) => Arc::new(assign(context, &extra)),
            None => Arc::clone(context),
        };

        log::trace!("[mount] {} instance {}", class.name(), instance.id());

        let mount = Self::Class {
            class,
            instance,
            component,
        };
        Ok((mount, child_context))
    }

    pub(crate) fn instance(&self) -> Option<&Instance> {
        match self {
            Self::Class { instance, .. } => Some(instance),
            _ => None,
        }
    }

    pub(crate) fn component(&self) -> Option<&(dyn Component + 'static)> {
        match self {
            Self::Class { component, .. } => Some(component.as_ref()),
            _ => None,
        }
    }

    /// Produce the children to descend into.
    pub(crate) fn produce_children(&mut self, context: &Value) -> Result<Cow<'a, Node>, WalkError> {
        match self {
            Self::Host { children } => Ok(Cow::Borrowed(*children)),
            Self::Function { component, props } => component
                .call(props, context)
                .map(Cow::Owned)
                .map_err(|source| WalkError::Render {
                    component: component.name().to_string(),
                    source,
                }),
            Self::ForwardRef { component, props } => component
                .call(props)
                .map(Cow::Owned)
                .map_err(|source| WalkError::Render {
                    component: component.name().to_string(),
                    source,
                }),
            Self::Class {
                class,
                instance,
                component,
            } => component
                .render(instance)
                .map(Cow::Owned)
                .map_err(|source| WalkError::Render {
                    component: class.name().to_string(),
                    source,
                }),
        }
    }

    /// Fire at most one lifecycle hook once the subtree has settled.
    ///
    /// With `component_will_unmount` set, the unmount hook runs if the
    /// component has one. Otherwise the premount hook runs if present.
    pub(crate) fn finish(self, options: &WalkOptions) -> Result<(), WalkError> {
        let Self::Class {
            class,
            mut instance,
            mut component,
        } = self
        else {
            return Ok(());
        };

        let mut fired = None;
        if options.component_will_unmount {
            fired = component
                .component_will_unmount(&mut instance)
                .map(|result| ("componentWillUnmount", result));
        }
        if fired.is_none() {
            fired = component
                .component_will_mount(&mut instance)
                .map(|result| ("componentWillMount", result));
        }

        match fired {
            Some((hook, result)) => {
                log::debug!("[mount] {} instance {} ran {hook}", class.name(), instance.id());
                result.map_err(|source| WalkError::Lifecycle {
                    component: class.name().to_string(),
                    hook,
                    source,
                })
            }
            None => Ok(()),
        }
    }
}

/// Render wrapper values until a plain node remains.
pub(crate) fn unwrap_renderable(node: Cow<'_, Node>) -> Result<Cow<'_, Node>, WalkError> {
    let mut node = node;
    while let Node::Renderable(render) = node.as_ref() {
        let next = render.render().map_err(|source| WalkError::Render {
            component: "renderable".to_string(),
            source,
        })?;
        node = Cow::Owned(next);
    }
    Ok(node)
}
