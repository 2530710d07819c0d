//! Data structures and types for streamgate
//!
//! Contains all shared models used across the application organized by domain:
//! - **Sources**: candidate upstream sources and their resolution strategy
//! - **Playback**: session state for the failover engine
//! - **Extraction**: resolved media URLs pulled out of embed pages
//! - **History**: watched-item records consumed by the stats engine

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// Source Models
// =============================================================================

/// How the controller treats a candidate source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStrategy {
    /// Fetch the locator URL, extract a playable media URL, drive playback
    Resolved,
    /// Render the locator URL as an opaque embedded frame, no extraction
    Frame,
}

impl fmt::Display for SourceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceStrategy::Resolved => write!(f, "resolved"),
            SourceStrategy::Frame => write!(f, "frame"),
        }
    }
}

/// One upstream option for playing a title, ranked by priority
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSource {
    /// Display label
    pub name: String,
    /// Upstream embed/stream URL
    pub locator_url: String,
    pub strategy: SourceStrategy,
    /// Lower is preferred; catalog order is ascending priority
    pub priority: u8,
}

impl fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.priority, self.name, self.strategy)
    }
}

// =============================================================================
// Extraction Models
// =============================================================================

/// A playable media URL extracted from an embed page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "url", rename_all = "kebab-case")]
pub enum ResolvedMedia {
    /// Adaptive-bitrate manifest (HLS playlist)
    Manifest(String),
    /// Direct progressive video file
    Progressive(String),
}

impl ResolvedMedia {
    pub fn url(&self) -> &str {
        match self {
            ResolvedMedia::Manifest(url) | ResolvedMedia::Progressive(url) => url,
        }
    }
}

impl fmt::Display for ResolvedMedia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedMedia::Manifest(url) => write!(f, "manifest: {}", url),
            ResolvedMedia::Progressive(url) => write!(f, "progressive: {}", url),
        }
    }
}

// =============================================================================
// Playback Models
// =============================================================================

/// Current mode of a playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlaybackMode {
    /// Fetching/extracting the active source
    Loading,
    /// Adaptive-bitrate engine is driving playback
    AdaptiveStream,
    /// Direct progressive file playback
    ProgressiveFile,
    /// Opaque embedded frame, no programmatic control
    OpaqueFrame,
    /// Terminal failure, no further automatic action
    Error,
}

impl PlaybackMode {
    /// Check if the session is in a playing (non-loading, non-error) mode
    pub fn is_playing(&self) -> bool {
        matches!(
            self,
            PlaybackMode::AdaptiveStream
                | PlaybackMode::ProgressiveFile
                | PlaybackMode::OpaqueFrame
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PlaybackMode::Error)
    }
}

impl fmt::Display for PlaybackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackMode::Loading => write!(f, "Loading..."),
            PlaybackMode::AdaptiveStream => write!(f, "Adaptive stream"),
            PlaybackMode::ProgressiveFile => write!(f, "Progressive file"),
            PlaybackMode::OpaqueFrame => write!(f, "Embedded frame"),
            PlaybackMode::Error => write!(f, "Error"),
        }
    }
}

/// Why a session ended in the terminal error mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminalReason {
    /// Catalog was empty, nothing to try
    NoSources,
    /// Every catalog entry failed
    SourcesExhausted,
}

impl fmt::Display for TerminalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalReason::NoSources => write!(f, "Content not available"),
            TerminalReason::SourcesExhausted => write!(f, "All sources failed"),
        }
    }
}

/// State of one playback attempt over a source catalog
///
/// The catalog is immutable for the session lifetime; only the cursor,
/// mode and extraction result mutate as sources are attempted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackSession {
    pub id: Uuid,
    pub catalog: Vec<CandidateSource>,
    /// Cursor into `catalog`; meaningful only while the catalog is non-empty
    pub active_index: usize,
    /// Automatic/manual switches since session start; manual select resets it
    pub switch_count: u32,
    pub mode: PlaybackMode,
    /// Relay-routed media URL for the active source, if extraction succeeded
    pub extracted_url: Option<String>,
    pub terminal: Option<TerminalReason>,
}

impl PlaybackSession {
    /// Create a new session positioned at the highest-priority source
    pub fn new(catalog: Vec<CandidateSource>) -> Self {
        Self {
            id: Uuid::new_v4(),
            catalog,
            active_index: 0,
            switch_count: 0,
            mode: PlaybackMode::Loading,
            extracted_url: None,
            terminal: None,
        }
    }

    /// The currently selected catalog entry
    pub fn active(&self) -> Option<&CandidateSource> {
        self.catalog.get(self.active_index)
    }

    /// Check if the cursor sits on the last catalog entry
    pub fn on_last_source(&self) -> bool {
        !self.catalog.is_empty() && self.active_index == self.catalog.len() - 1
    }
}

impl fmt::Display for PlaybackSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.active().map(|s| s.name.as_str()).unwrap_or("-");
        write!(
            f,
            "{} on {} ({}/{}, {} switches)",
            self.mode,
            name,
            self.active_index + 1,
            self.catalog.len(),
            self.switch_count
        )
    }
}

// =============================================================================
// History Models
// =============================================================================

/// Media type discriminator for watched items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchedKind {
    Movie,
    Show,
}

impl fmt::Display for WatchedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchedKind::Movie => write!(f, "Movie"),
            WatchedKind::Show => write!(f, "Show"),
        }
    }
}

/// One record in the viewing-history log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchedItem {
    pub id: String,
    pub kind: WatchedKind,
    pub title: String,
    /// Runtime (movies) or episode-length basis (shows), in minutes
    pub runtime_minutes: u32,
    /// How far playback got, 0.0 - 100.0
    pub progress_pct: f32,
    pub completed: bool,
    pub rating: Option<f32>,
    pub genres: Vec<String>,
    pub release_year: Option<u16>,
    /// Unix timestamp (seconds)
    pub watched_at: u64,
}

impl WatchedItem {
    /// Minutes actually watched, derived from progress
    pub fn watched_minutes(&self) -> f64 {
        f64::from(self.runtime_minutes) * f64::from(self.progress_pct.clamp(0.0, 100.0)) / 100.0
    }
}

impl fmt::Display for WatchedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let year = self
            .release_year
            .map(|y| format!(" ({})", y))
            .unwrap_or_default();
        write!(
            f,
            "{}{} [{}] {:.0}%",
            self.title, year, self.kind, self.progress_pct
        )
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn source(name: &str, strategy: SourceStrategy, priority: u8) -> CandidateSource {
        CandidateSource {
            name: name.to_string(),
            locator_url: format!("https://upstream.test/{}", name),
            strategy,
            priority,
        }
    }

    // -------------------------------------------------------------------------
    // Strategy / Mode Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_strategy_serde() {
        let json = serde_json::to_string(&SourceStrategy::Resolved).unwrap();
        assert_eq!(json, "\"resolved\"");

        let parsed: SourceStrategy = serde_json::from_str("\"frame\"").unwrap();
        assert_eq!(parsed, SourceStrategy::Frame);
    }

    #[test]
    fn test_mode_is_playing() {
        assert!(PlaybackMode::AdaptiveStream.is_playing());
        assert!(PlaybackMode::ProgressiveFile.is_playing());
        assert!(PlaybackMode::OpaqueFrame.is_playing());
        assert!(!PlaybackMode::Loading.is_playing());
        assert!(!PlaybackMode::Error.is_playing());
    }

    #[test]
    fn test_mode_is_terminal() {
        assert!(PlaybackMode::Error.is_terminal());
        assert!(!PlaybackMode::Loading.is_terminal());
    }

    #[test]
    fn test_mode_serde_kebab_case() {
        let json = serde_json::to_string(&PlaybackMode::AdaptiveStream).unwrap();
        assert_eq!(json, "\"adaptive-stream\"");
        let json = serde_json::to_string(&PlaybackMode::OpaqueFrame).unwrap();
        assert_eq!(json, "\"opaque-frame\"");
    }

    // -------------------------------------------------------------------------
    // ResolvedMedia Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_resolved_media_url() {
        let manifest = ResolvedMedia::Manifest("https://cdn.test/a.m3u8".to_string());
        assert_eq!(manifest.url(), "https://cdn.test/a.m3u8");

        let file = ResolvedMedia::Progressive("https://cdn.test/a.mp4".to_string());
        assert_eq!(file.url(), "https://cdn.test/a.mp4");
    }

    #[test]
    fn test_resolved_media_display() {
        let manifest = ResolvedMedia::Manifest("https://cdn.test/a.m3u8".to_string());
        assert_eq!(manifest.to_string(), "manifest: https://cdn.test/a.m3u8");
    }

    // -------------------------------------------------------------------------
    // PlaybackSession Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_session_new() {
        let session = PlaybackSession::new(vec![
            source("primary", SourceStrategy::Resolved, 0),
            source("mirror", SourceStrategy::Frame, 1),
        ]);
        assert_eq!(session.active_index, 0);
        assert_eq!(session.switch_count, 0);
        assert_eq!(session.mode, PlaybackMode::Loading);
        assert!(session.extracted_url.is_none());
        assert!(session.terminal.is_none());
        assert_eq!(session.active().unwrap().name, "primary");
    }

    #[test]
    fn test_session_on_last_source() {
        let mut session = PlaybackSession::new(vec![
            source("primary", SourceStrategy::Resolved, 0),
            source("mirror", SourceStrategy::Frame, 1),
        ]);
        assert!(!session.on_last_source());
        session.active_index = 1;
        assert!(session.on_last_source());

        let empty = PlaybackSession::new(vec![]);
        assert!(!empty.on_last_source());
    }

    #[test]
    fn test_session_active_empty_catalog() {
        let session = PlaybackSession::new(vec![]);
        assert!(session.active().is_none());
    }

    // -------------------------------------------------------------------------
    // WatchedItem Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_watched_minutes() {
        let item = WatchedItem {
            id: "m1".to_string(),
            kind: WatchedKind::Movie,
            title: "Test".to_string(),
            runtime_minutes: 120,
            progress_pct: 50.0,
            completed: false,
            rating: None,
            genres: vec![],
            release_year: Some(2022),
            watched_at: 1_700_000_000,
        };
        assert!((item.watched_minutes() - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_watched_minutes_clamps_progress() {
        let item = WatchedItem {
            id: "m2".to_string(),
            kind: WatchedKind::Show,
            title: "Over".to_string(),
            runtime_minutes: 40,
            progress_pct: 150.0,
            completed: true,
            rating: Some(8.0),
            genres: vec!["Drama".to_string()],
            release_year: None,
            watched_at: 1_700_000_000,
        };
        assert!((item.watched_minutes() - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_watched_item_display() {
        let item = WatchedItem {
            id: "m3".to_string(),
            kind: WatchedKind::Movie,
            title: "The Batman".to_string(),
            runtime_minutes: 176,
            progress_pct: 100.0,
            completed: true,
            rating: Some(7.8),
            genres: vec!["Action".to_string()],
            release_year: Some(2022),
            watched_at: 1_700_000_000,
        };
        assert_eq!(item.to_string(), "The Batman (2022) [Movie] 100%");
    }
}
