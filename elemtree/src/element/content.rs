use std::sync::Arc;

use super::Element;
use crate::BoxError;

/// One position in an element tree.
#[derive(Clone, Default)]
pub enum Node {
    /// Nothing to visit.
    #[default]
    Empty,
    Text(String),
    Number(f64),
    /// Sibling nodes.
    List(Vec<Node>),
    Element(Box<Element>),
    Portal(Box<Portal>),
    /// A value exposing its own render capability without being an element.
    /// It is rendered until a plain node remains.
    Renderable(Arc<dyn Render>),
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Empty"),
            Self::Text(s) => write!(f, "Text({s:?})"),
            Self::Number(n) => write!(f, "Number({n})"),
            Self::List(items) => f.debug_list().entries(items).finish(),
            Self::Element(element) => std::fmt::Debug::fmt(element, f),
            Self::Portal(portal) => std::fmt::Debug::fmt(portal, f),
            Self::Renderable(_) => write!(f, "Renderable(...)"),
        }
    }
}

impl Node {
    /// Create a renderable wrapper node.
    pub fn renderable(render: impl Render + 'static) -> Self {
        Self::Renderable(Arc::new(render))
    }

    /// Create a portal into `container`.
    pub fn portal(container: impl Into<String>, children: impl Into<Node>) -> Self {
        Self::Portal(Box::new(Portal {
            container: container.into(),
            children: children.into(),
        }))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// True for text and number leaves.
    pub fn is_primitive(&self) -> bool {
        matches!(self, Self::Text(_) | Self::Number(_))
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element.as_ref()),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Short human-readable label, used in logs and error messages.
    pub fn label(&self) -> String {
        match self {
            Self::Empty => "null".to_string(),
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::List(items) => format!("[{} items]", items.len()),
            Self::Element(element) => format!("<{}>", element.name()),
            Self::Portal(portal) => format!("portal({})", portal.container),
            Self::Renderable(_) => "renderable".to_string(),
        }
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<f64> for Node {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Node {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<u32> for Node {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(Box::new(element))
    }
}

impl From<Portal> for Node {
    fn from(portal: Portal) -> Self {
        Self::Portal(Box::new(portal))
    }
}

impl From<Vec<Node>> for Node {
    fn from(items: Vec<Node>) -> Self {
        Self::List(items)
    }
}

impl<T: Into<Node>> From<Option<T>> for Node {
    fn from(node: Option<T>) -> Self {
        node.map_or(Self::Empty, Into::into)
    }
}

impl<T: Into<Node>> FromIterator<T> for Node {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::List(iter.into_iter().map(Into::into).collect())
    }
}

/// A portal: children mounted into a container outside the parent hierarchy.
#[derive(Debug, Clone)]
pub struct Portal {
    /// Identifier of the target container.
    pub container: String,
    pub children: Node,
}

impl Portal {
    /// The innermost children of the portal, when they form a list.
    ///
    /// A portal only has a traversable shape when its children are an
    /// element whose own children are a list.
    pub fn innermost_children(&self) -> Option<&[Node]> {
        match &self.children {
            Node::Element(element) => match &element.children {
                Node::List(items) => Some(items),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Render capability of a value that is not a standard element.
pub trait Render: Send + Sync {
    fn render(&self) -> Result<Node, BoxError>;
}

impl<F> Render for F
where
    F: Fn() -> Result<Node, BoxError> + Send + Sync,
{
    fn render(&self) -> Result<Node, BoxError> {
        self()
    }
}
