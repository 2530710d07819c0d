//! streamgate - resilient streaming-source resolution and playback failover
//!
//! Extracts playable media URLs from upstream embed pages, routes every media
//! byte through a single egress relay, and drives an ordered multi-source
//! failover state machine around an external adaptive-streaming engine.
//!
//! # Modules
//!
//! - `models` - Shared data structures (sources, sessions, history records)
//! - `resolve` - Media URL extraction and source catalog construction
//! - `playback` - Engine boundary and the session failover controller
//! - `relay` - Egress relay client glue and the axum relay server
//! - `history` - Viewing-history log and dashboard aggregation
//! - `config` - TOML configuration
//! - `cli` - Command-line surface

pub mod cli;
pub mod commands;
pub mod config;
pub mod history;
pub mod models;
pub mod playback;
pub mod relay;
pub mod resolve;

// Re-export commonly used types
pub use models::{
    CandidateSource, PlaybackMode, PlaybackSession, ResolvedMedia, SourceStrategy,
    TerminalReason, WatchedItem, WatchedKind,
};

pub use playback::{EngineEvent, EngineFault, SessionController, SessionOptions, StreamEngine};
pub use relay::{RelayRoute, RelayServer, RelaySettings};
pub use resolve::{build_catalog, MediaExtractor, SourceSlots};
