pub mod config;
pub mod item;
pub mod label;
pub mod policy;
pub mod project;
pub mod section;
pub mod snapshot;
pub mod task;

pub use config::*;
pub use item::*;
pub use label::*;
pub use policy::*;
pub use project::*;
pub use section::*;
pub use snapshot::*;
pub use task::*;
