mod content;
mod node;

pub use content::{Node, Portal, Render};
pub use node::{Element, ElementType};
