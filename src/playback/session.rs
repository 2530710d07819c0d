//! Playback session controller
//!
//! The failover state machine. For the active catalog entry it drives
//! extraction, picks the playback mode, owns the single live engine
//! instance and reacts to fatal faults by advancing the catalog cursor.
//!
//! State machine: `Loading -> {AdaptiveStream | ProgressiveFile |
//! OpaqueFrame} -> Error`, with `Error -> Loading` on auto-advance and any
//! state `-> Loading` on manual select.
//!
//! All methods take `&mut self`, so one logical thread owns the session and
//! at most one attempt is in flight per cursor position. The embed fetch and
//! the switch debounce are the only awaits; both are cancel-safe, and an
//! attempt epoch guards the fetch so a stale completion can never overwrite
//! a newer attempt.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{PlaybackMode, PlaybackSession, ResolvedMedia, SourceStrategy, TerminalReason};
use crate::playback::engine::{EngineEvent, EngineFactory, EngineFault, StreamEngine};
use crate::relay::{PageFetcher, RelayRoute};
use crate::resolve::{MediaExtractor, ResolveError};

/// Delay before an automatic source switch; debounces rapid successive
/// failures and lets transient network blips pass before the UI flips
pub const SWITCH_DEBOUNCE: Duration = Duration::from_secs(2);

/// In-place recoveries allowed per attempt before a forced advance
pub const DEFAULT_RECOVERY_LIMIT: u8 = 3;

/// Session controller errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("source index {0} out of range")]
    IndexOutOfRange(usize),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Controller tuning knobs
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub switch_debounce: Duration,
    pub recovery_limit: u8,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            switch_debounce: SWITCH_DEBOUNCE,
            recovery_limit: DEFAULT_RECOVERY_LIMIT,
        }
    }
}

/// Drives a playback session over a source catalog
pub struct SessionController {
    session: PlaybackSession,
    extractor: MediaExtractor,
    relay: RelayRoute,
    fetcher: PageFetcher,
    engine_factory: EngineFactory,
    engine: Option<Box<dyn StreamEngine>>,
    options: SessionOptions,
    /// In-place recoveries consumed by the current attempt
    recoveries: u8,
    /// Bumped on every new attempt; stale async completions are dropped
    epoch: u64,
}

impl SessionController {
    /// Create a controller for a catalog with default options
    pub fn new(
        session: PlaybackSession,
        relay: RelayRoute,
        engine_factory: EngineFactory,
    ) -> Result<Self, SessionError> {
        Self::with_options(session, relay, engine_factory, SessionOptions::default())
    }

    /// Create a controller with custom debounce/recovery settings
    pub fn with_options(
        session: PlaybackSession,
        relay: RelayRoute,
        engine_factory: EngineFactory,
        options: SessionOptions,
    ) -> Result<Self, SessionError> {
        Ok(Self {
            session,
            extractor: MediaExtractor::new()?,
            relay,
            fetcher: PageFetcher::new(),
            engine_factory,
            engine: None,
            options,
            recoveries: 0,
            epoch: 0,
        })
    }

    /// Begin playback at the highest-priority source
    ///
    /// An empty catalog is terminal immediately: no fetch is attempted.
    pub async fn start(&mut self) {
        if self.session.catalog.is_empty() {
            warn!(session = %self.session.id, "no candidate sources");
            self.session.mode = PlaybackMode::Error;
            self.session.terminal = Some(TerminalReason::NoSources);
            return;
        }
        self.session.active_index = 0;
        self.process_active_entry().await;
    }

    /// Run one resolution/playback attempt for the active catalog entry
    ///
    /// Always releases the previous engine instance first and resets the
    /// in-place recovery budget.
    pub async fn process_active_entry(&mut self) {
        self.teardown();
        self.recoveries = 0;
        self.epoch += 1;
        self.session.terminal = None;

        let Some(entry) = self.session.active().cloned() else {
            self.session.mode = PlaybackMode::Error;
            self.session.terminal = Some(TerminalReason::NoSources);
            return;
        };

        match entry.strategy {
            SourceStrategy::Frame => {
                info!(source = %entry.name, "rendering embedded frame");
                self.session.extracted_url = None;
                self.session.mode = PlaybackMode::OpaqueFrame;
            }
            SourceStrategy::Resolved => {
                self.session.mode = PlaybackMode::Loading;
                self.session.extracted_url = None;

                let epoch = self.epoch;
                let routed = self.relay.route(&entry.locator_url);
                let body = self.fetcher.fetch_text(&routed).await;
                if self.epoch != epoch {
                    // A select/advance superseded this attempt mid-fetch
                    debug!(source = %entry.name, "dropping stale fetch result");
                    return;
                }

                // Fetch failures map to "nothing extracted", not to an error
                let media = body.ok().and_then(|text| self.extractor.extract(&text));

                match media {
                    Some(ResolvedMedia::Manifest(url)) => {
                        let routed = self.relay.route(&url);
                        info!(source = %entry.name, manifest = %url, "starting adaptive stream");
                        self.session.extracted_url = Some(routed.clone());
                        self.session.mode = PlaybackMode::AdaptiveStream;
                        let mut engine = (self.engine_factory)();
                        engine.load(&routed);
                        self.engine = Some(engine);
                    }
                    Some(ResolvedMedia::Progressive(url)) => {
                        info!(source = %entry.name, file = %url, "starting progressive playback");
                        self.session.extracted_url = Some(self.relay.route(&url));
                        self.session.mode = PlaybackMode::ProgressiveFile;
                    }
                    None => {
                        // Degrade in place: frame on the original locator URL
                        info!(source = %entry.name, "nothing extracted, falling back to frame");
                        self.session.extracted_url = None;
                        self.session.mode = PlaybackMode::OpaqueFrame;
                    }
                }
            }
        }
    }

    /// Feed an engine lifecycle event into the state machine
    pub async fn on_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Ready => {
                debug!(session = %self.session.id, "engine ready");
            }
            EngineEvent::Fatal(fault) => self.on_fatal_error(fault).await,
        }
    }

    /// React to a fatal engine fault
    ///
    /// Network and media faults recover in place while the per-attempt
    /// budget lasts; everything else (and an exhausted budget) advances the
    /// catalog.
    pub async fn on_fatal_error(&mut self, fault: EngineFault) {
        match fault {
            EngineFault::Network => {
                if self.recoveries < self.options.recovery_limit {
                    if let Some(engine) = self.engine.as_mut() {
                        self.recoveries += 1;
                        debug!(attempt = self.recoveries, "in-place network recovery");
                        engine.recover_network();
                        return;
                    }
                }
                self.advance().await;
            }
            EngineFault::Media => {
                if self.recoveries < self.options.recovery_limit {
                    if let Some(engine) = self.engine.as_mut() {
                        self.recoveries += 1;
                        debug!(attempt = self.recoveries, "in-place media recovery");
                        engine.recover_media();
                        return;
                    }
                }
                self.advance().await;
            }
            EngineFault::Other(detail) => {
                warn!(%detail, "unrecoverable engine fault");
                self.advance().await;
            }
        }
    }

    /// Move to the next catalog entry after the switch debounce
    ///
    /// On the last entry this is terminal: the mode flips to `Error`, the
    /// cursor stays put and nothing further happens automatically.
    pub async fn advance(&mut self) {
        if self.session.catalog.is_empty() {
            self.session.mode = PlaybackMode::Error;
            self.session.terminal = Some(TerminalReason::NoSources);
            return;
        }

        if self.session.on_last_source() {
            warn!(session = %self.session.id, "all sources exhausted");
            self.teardown();
            self.session.mode = PlaybackMode::Error;
            self.session.terminal = Some(TerminalReason::SourcesExhausted);
            return;
        }

        tokio::time::sleep(self.options.switch_debounce).await;

        self.session.active_index = (self.session.active_index + 1) % self.session.catalog.len();
        self.session.switch_count += 1;
        info!(
            index = self.session.active_index,
            switches = self.session.switch_count,
            "advancing to next source"
        );
        self.process_active_entry().await;
    }

    /// Manual source selection; bypasses the debounce and resets the
    /// switch counter
    pub async fn select_source(&mut self, index: usize) -> Result<(), SessionError> {
        if index >= self.session.catalog.len() {
            return Err(SessionError::IndexOutOfRange(index));
        }
        info!(index, "manual source selection");
        self.session.active_index = index;
        self.session.switch_count = 0;
        self.process_active_entry().await;
        Ok(())
    }

    /// Release the live engine instance, if any; safe to call repeatedly
    pub fn teardown(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            debug!(session = %self.session.id, "releasing engine");
            engine.shutdown();
        }
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn mode(&self) -> PlaybackMode {
        self.session.mode
    }

    /// Check whether an engine instance is currently alive
    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CandidateSource;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct NullEngine;

    impl StreamEngine for NullEngine {
        fn load(&mut self, _manifest_url: &str) {}
        fn recover_network(&mut self) {}
        fn recover_media(&mut self) {}
        fn shutdown(&mut self) {}
    }

    fn null_factory() -> EngineFactory {
        Box::new(|| Box::new(NullEngine))
    }

    fn frame_entry(name: &str, priority: u8) -> CandidateSource {
        CandidateSource {
            name: name.to_string(),
            locator_url: format!("https://upstream.test/{}", name),
            strategy: SourceStrategy::Frame,
            priority,
        }
    }

    fn controller(catalog: Vec<CandidateSource>) -> SessionController {
        SessionController::new(
            PlaybackSession::new(catalog),
            RelayRoute::new("http://127.0.0.1:1"),
            null_factory(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_empty_catalog_is_terminal_without_fetch() {
        let mut ctrl = controller(vec![]);
        ctrl.start().await;

        assert_eq!(ctrl.mode(), PlaybackMode::Error);
        assert_eq!(ctrl.session().terminal, Some(TerminalReason::NoSources));
        assert!(!ctrl.has_engine());
    }

    #[tokio::test]
    async fn test_frame_entry_needs_no_network() {
        // Relay base is unroutable; a frame entry must still succeed
        let mut ctrl = controller(vec![frame_entry("embed", 0)]);
        ctrl.start().await;

        assert_eq!(ctrl.mode(), PlaybackMode::OpaqueFrame);
        assert!(ctrl.session().extracted_url.is_none());
        assert!(!ctrl.has_engine());
    }

    #[tokio::test]
    async fn test_teardown_is_idempotent() {
        let counter = Arc::new(AtomicUsize::new(0));
        let shutdowns = counter.clone();

        struct CountingEngine(Arc<AtomicUsize>);
        impl StreamEngine for CountingEngine {
            fn load(&mut self, _: &str) {}
            fn recover_network(&mut self) {}
            fn recover_media(&mut self) {}
            fn shutdown(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let factory: EngineFactory = Box::new(move || Box::new(CountingEngine(shutdowns.clone())));
        let mut ctrl = SessionController::new(
            PlaybackSession::new(vec![frame_entry("embed", 0)]),
            RelayRoute::new("http://127.0.0.1:1"),
            factory,
        )
        .unwrap();

        ctrl.teardown();
        ctrl.teardown();
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(!ctrl.has_engine());
    }

    #[tokio::test]
    async fn test_select_source_out_of_range() {
        let mut ctrl = controller(vec![frame_entry("embed", 0)]);
        let err = ctrl.select_source(5).await.unwrap_err();
        assert!(matches!(err, SessionError::IndexOutOfRange(5)));
    }

    #[test]
    fn test_default_options() {
        let options = SessionOptions::default();
        assert_eq!(options.switch_debounce, Duration::from_secs(2));
        assert_eq!(options.recovery_limit, 3);
    }
}
