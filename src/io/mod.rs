pub mod auth;
pub mod backend;
pub mod config_io;
pub mod feed;
pub mod lock;
pub mod logging;
#[cfg(test)]
pub mod memory;
pub mod state;
pub mod store;
