//! HTTP API module.
//!
//! Upload endpoints, response bodies and the log stream shared with the
//! pipeline.

pub mod logs;
pub mod server;
pub mod types;

pub use logs::*;
pub use server::{router, start_server, AppState};
pub use types::*;
