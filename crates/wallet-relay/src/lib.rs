//! Local wallet relay for the Freighter browser extension
//!
//! Serves pages that talk to the extension and collects their results over
//! HTTP callbacks, so the backend can request access and signatures without
//! ever holding a key.

pub mod freighter_page;
pub mod handlers;
pub mod server;
pub mod signer;
pub mod types;

pub use server::{router, ServerState, WalletRelay};
pub use signer::RelaySigner;
pub use types::*;
