use serde_json::Value;

use super::Node;
use crate::component::{ClassComponent, ForwardRef, FunctionComponent};
use crate::context::{Consumer, Context};
use crate::props::{Props, props_from};

/// The type of an element: a host tag, a component, or one side of a
/// context.
#[derive(Clone)]
pub enum ElementType {
    /// Plain markup tag such as `div`.
    Host(String),
    Function(FunctionComponent),
    Class(ClassComponent),
    ForwardRef(ForwardRef),
    Provider(Context),
    Consumer(Consumer),
}

impl std::fmt::Debug for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Host(tag) => write!(f, "Host({tag})"),
            Self::Function(c) => write!(f, "Function({})", c.name()),
            Self::Class(c) => write!(f, "Class({})", c.name()),
            Self::ForwardRef(c) => write!(f, "ForwardRef({})", c.name()),
            Self::Provider(cx) => write!(f, "Provider({})", cx.name()),
            Self::Consumer(consumer) => write!(f, "Consumer({})", consumer.context().name()),
        }
    }
}

impl From<&str> for ElementType {
    fn from(tag: &str) -> Self {
        Self::Host(tag.to_string())
    }
}

impl From<FunctionComponent> for ElementType {
    fn from(component: FunctionComponent) -> Self {
        Self::Function(component)
    }
}

impl From<ClassComponent> for ElementType {
    fn from(component: ClassComponent) -> Self {
        Self::Class(component)
    }
}

impl From<ForwardRef> for ElementType {
    fn from(component: ForwardRef) -> Self {
        Self::ForwardRef(component)
    }
}

#[derive(Debug, Clone)]
pub struct Element {
    pub ty: ElementType,
    pub props: Props,
    /// Children passed to the element. Host elements descend into these,
    /// components receive them through their own render output.
    pub children: Node,
}

impl Element {
    pub fn new(ty: impl Into<ElementType>) -> Self {
        Self {
            ty: ty.into(),
            props: Props::new(),
            children: Node::Empty,
        }
    }

    /// Create a plain markup element.
    pub fn host(tag: impl Into<String>) -> Self {
        Self::new(ElementType::Host(tag.into()))
    }

    /// Display name: the tag for host elements, the component name otherwise.
    pub fn name(&self) -> String {
        match &self.ty {
            ElementType::Host(tag) => tag.clone(),
            ElementType::Function(c) => c.name().to_string(),
            ElementType::Class(c) => c.name().to_string(),
            ElementType::ForwardRef(c) => c.name().to_string(),
            ElementType::Provider(cx) => format!("{}.Provider", cx.name()),
            ElementType::Consumer(consumer) => format!("{}.Consumer", consumer.context().name()),
        }
    }

    /// Set a single prop.
    pub fn prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    /// Replace all props with the keys of a JSON object.
    pub fn with_props(mut self, props: Value) -> Self {
        self.props = props_from(props);
        self
    }

    /// Append a child, turning the children into a list if needed.
    pub fn child(mut self, child: impl Into<Node>) -> Self {
        let child = child.into();
        self.children = match std::mem::take(&mut self.children) {
            Node::Empty => Node::List(vec![child]),
            Node::List(mut items) => {
                items.push(child);
                Node::List(items)
            }
            single => Node::List(vec![single, child]),
        };
        self
    }

    /// Replace the children.
    pub fn children(mut self, children: impl Into<Node>) -> Self {
        self.children = children.into();
        self
    }

    pub fn is_host(&self) -> bool {
        matches!(self.ty, ElementType::Host(_))
    }
}
