pub mod actor;
pub mod config;
pub mod reference;
pub mod task;

pub use actor::*;
pub use config::*;
pub use reference::*;
pub use task::*;
