//! Node classification.
//!
//! Every node is classified exactly once, by the first matching rule of
//! [`RULES`]. The order is significant and must not change.

use elemtree::{Consumer, Context, Element, ElementType, Node};

/// Variant tag of a classified node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Collection,
    Empty,
    Primitive,
    Provider,
    Consumer,
    Component(ComponentKind),
    Host,
    Portal,
}

/// The three ways a component element produces its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Function,
    Class,
    ForwardRef,
}

/// A node together with the data needed to walk it.
#[derive(Debug, Clone, Copy)]
pub enum Classified<'a> {
    Collection(&'a [Node]),
    Empty,
    Primitive(&'a Node),
    Provider(&'a Element, &'a Context),
    Consumer(&'a Element, &'a Consumer),
    Component(&'a Element, ComponentKind),
    Host(&'a Element),
    /// The innermost children of a portal.
    Portal(&'a [Node]),
}

impl Classified<'_> {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Collection(_) => NodeKind::Collection,
            Self::Empty => NodeKind::Empty,
            Self::Primitive(_) => NodeKind::Primitive,
            Self::Provider(..) => NodeKind::Provider,
            Self::Consumer(..) => NodeKind::Consumer,
            Self::Component(_, kind) => NodeKind::Component(*kind),
            Self::Host(_) => NodeKind::Host,
            Self::Portal(_) => NodeKind::Portal,
        }
    }
}

type Rule = for<'a> fn(&'a Node) -> Option<Classified<'a>>;

/// Classification rules in priority order.
pub const RULES: &[(&str, Rule)] = &[
    ("collection", collection),
    ("empty", empty),
    ("primitive", primitive),
    ("provider", provider),
    ("consumer", consumer),
    ("element", element),
    ("portal", portal),
];

/// Classify a node. Nodes matching no rule are [`Classified::Empty`].
pub fn classify(node: &Node) -> Classified<'_> {
    RULES
        .iter()
        .find_map(|(_, rule)| rule(node))
        .unwrap_or(Classified::Empty)
}

fn collection(node: &Node) -> Option<Classified<'_>> {
    match node {
        Node::List(items) => Some(Classified::Collection(items)),
        _ => None,
    }
}

fn empty(node: &Node) -> Option<Classified<'_>> {
    node.is_empty().then_some(Classified::Empty)
}

fn primitive(node: &Node) -> Option<Classified<'_>> {
    node.is_primitive().then_some(Classified::Primitive(node))
}

fn provider(node: &Node) -> Option<Classified<'_>> {
    let element = node.as_element()?;
    match &element.ty {
        ElementType::Provider(context) => Some(Classified::Provider(element, context)),
        _ => None,
    }
}

fn consumer(node: &Node) -> Option<Classified<'_>> {
    let element = node.as_element()?;
    match &element.ty {
        ElementType::Consumer(consumer) => Some(Classified::Consumer(element, consumer)),
        _ => None,
    }
}

fn element(node: &Node) -> Option<Classified<'_>> {
    let element = node.as_element()?;
    let kind = match &element.ty {
        ElementType::Host(_) => return Some(Classified::Host(element)),
        ElementType::Function(_) => ComponentKind::Function,
        ElementType::Class(_) => ComponentKind::Class,
        ElementType::ForwardRef(_) => ComponentKind::ForwardRef,
        ElementType::Provider(_) | ElementType::Consumer(_) => return None,
    };
    Some(Classified::Component(element, kind))
}

fn portal(node: &Node) -> Option<Classified<'_>> {
    match node {
        Node::Portal(portal) => portal.innermost_children().map(Classified::Portal),
        _ => None,
    }
}
