//! HTTP API surface.

pub mod cors;
pub mod error;
pub mod extract;
pub mod routes;
pub mod tasks;
pub mod types;

pub use routes::{build_router, serve, AppState};
