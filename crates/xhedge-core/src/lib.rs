//! xhedge-core: Shared types, errors, and configuration
//!
//! This crate provides the foundational types used across the XHedge workspace.

pub mod config;
pub mod errors;
pub mod types;
pub mod wallet;

pub use config::*;
pub use errors::*;
pub use types::*;
pub use wallet::*;
