//! Command-line and web front end of the transaction explorer.

pub mod config;
pub mod render;
pub mod server;

pub use config::{parse_block, ExplorerArgs};
pub use server::{create_app, serve, AppState};
