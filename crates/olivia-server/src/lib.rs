//! OLIVIA Server
//!
//! HTTP surface for situation analysis, multi-source legal research and
//! judicial locations lookup.

pub mod config;
pub mod routes;
pub mod state;

pub use config::{AppConfig, LogFormat, Overrides, ServerConfig};
pub use routes::{create_router, AppError};
pub use state::AppState;
