//! xhedge-api: HTTP API layer for the XHedge dashboard
//!
//! Exposes network selection, wallet session, vault metrics and history, and
//! the deposit/withdraw pipeline to the dashboard front-end.

pub mod dto;
pub mod preferences;
pub mod routes;
pub mod server;
pub mod state;

pub use server::*;
pub use state::{AppState, PipelineGuard, StateError};
