//! UI snapshot model: bounds, selectors and the parsed hierarchy tree

mod bounds;
mod selector;
mod snapshot;

pub use bounds::Bounds;
pub use selector::{Selector, SelectorAttr};
pub use snapshot::{UiNode, UiSnapshot};
