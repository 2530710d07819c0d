//! Egress relay
//!
//! - Rewrite: client-side helpers that route media URLs through the relay
//! - Server: the axum service that performs the outbound fetches

pub mod rewrite;
pub mod server;

pub use rewrite::{is_absolute_http, PageFetcher, RelayRoute};
pub use server::{RelayServer, RelaySettings};
