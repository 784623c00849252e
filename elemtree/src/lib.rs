//! Element tree model for declarative component hierarchies.
//!
//! A tree is built from [`Node`] values. Leaves are text and numbers, lists
//! hold siblings, and [`Element`]s carry a type, props and children. Element
//! types cover plain host tags, function components, class components,
//! forward-ref wrappers and the provider/consumer pair of a [`Context`].

pub mod component;
pub mod context;
pub mod element;
pub mod instance;
pub mod props;

pub use component::{ClassComponent, Component, ForwardRef, FunctionComponent};
pub use context::{Consumer, Context, ProviderKey};
pub use element::{Element, ElementType, Node, Portal, Render};
pub use instance::{Instance, InstanceId};
pub use props::{Props, assign, merge_props, props_from};

/// Error type raised by user code: render functions, visitors and hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Build a [`Node::List`] from heterogeneous values.
///
/// ```
/// use elemtree::{nodes, Element, Node};
///
/// let list = nodes!["a", 1, Element::host("span")];
/// assert!(matches!(list, Node::List(ref items) if items.len() == 3));
/// ```
#[macro_export]
macro_rules! nodes {
    ($($child:expr),* $(,)?) => {
        $crate::Node::List(vec![$($crate::Node::from($child)),*])
    };
}
