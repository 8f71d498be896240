//! Read-only HTTP API serving the precomputed analysis artifacts.

pub mod routes;
pub mod state;

pub use routes::{router, serve, ApiServerConfig};
pub use state::{ApiState, AppData, DataPaths};
