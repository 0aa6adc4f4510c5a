pub mod forest;
pub mod plan;
pub mod rule;
pub mod select;

pub use forest::{Forest, ForestError, NodeRef};
pub use select::{Selection, select};
