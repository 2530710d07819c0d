//! Adaptive-streaming engine boundary
//!
//! The engine (an hls.js analogue) is a consumed capability, not something
//! this crate implements: it takes a manifest URL and a rendering surface,
//! and reports lifecycle events back. The session controller only needs the
//! narrow contract below: load, two in-place recovery calls, and a full
//! release.

use std::fmt;

/// Classified fatal fault reported by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineFault {
    /// Transient transport failure; recoverable by restarting the load
    Network,
    /// Decode/buffer failure; recoverable by the engine's media recovery
    Media,
    /// Anything else: manifest parse failure, unsupported format, render error
    Other(String),
}

impl fmt::Display for EngineFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineFault::Network => write!(f, "network"),
            EngineFault::Media => write!(f, "media"),
            EngineFault::Other(detail) => write!(f, "other: {}", detail),
        }
    }
}

/// Lifecycle events emitted by an attached engine
///
/// Hosts deliver these to [`SessionController::on_engine_event`] from
/// whatever event channel their engine integration uses. Handlers registered
/// with an engine must be dropped when the engine is shut down so a stale
/// instance can never mutate a newer session.
///
/// [`SessionController::on_engine_event`]: crate::playback::SessionController::on_engine_event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Manifest parsed, playback can start
    Ready,
    /// Playback cannot continue without intervention
    Fatal(EngineFault),
}

/// Minimal contract the session controller drives
pub trait StreamEngine: Send {
    /// Attach to the rendering surface and start loading a manifest
    fn load(&mut self, manifest_url: &str);

    /// Restart loading in place after a network fault
    fn recover_network(&mut self);

    /// Attempt internal media-error recovery in place
    fn recover_media(&mut self);

    /// Release all resources; the instance is dead afterwards
    fn shutdown(&mut self);
}

/// Produces a fresh engine instance per playback attempt
pub type EngineFactory = Box<dyn Fn() -> Box<dyn StreamEngine> + Send + Sync>;
