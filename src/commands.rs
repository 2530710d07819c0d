//! CLI Command Handlers
//!
//! Implements all CLI commands by calling the appropriate backend services.
//! Each handler takes CLI args, loaded config and Output, returns ExitCode.

use serde::Serialize;

use crate::cli::{CatalogCmd, ExitCode, Output, ProbeCmd, ResolveCmd, ServeCmd, StatsCmd};
use crate::config::Config;
use crate::history::{aggregate, HistoryStore};
use crate::models::{CandidateSource, ResolvedMedia, SourceStrategy};
use crate::relay::{is_absolute_http, PageFetcher, RelayRoute, RelayServer};
use crate::resolve::{build_catalog, MediaExtractor, SourceSlots};

// =============================================================================
// Serve Command
// =============================================================================

pub async fn serve_cmd(cmd: ServeCmd, config: &Config, output: &Output) -> ExitCode {
    let addr = match cmd.bind {
        Some(raw) => match raw.parse() {
            Ok(addr) => addr,
            Err(e) => {
                return output.error(
                    format!("Invalid bind address {}: {}", raw, e),
                    ExitCode::InvalidArgs,
                )
            }
        },
        None => match config.listen_addr() {
            Ok(addr) => addr,
            Err(e) => return output.error(e.to_string(), ExitCode::InvalidArgs),
        },
    };

    output.info(format!("Starting relay on {}", addr));

    let server = RelayServer::new(config.relay_settings());
    match server.serve(addr).await {
        Ok(()) => ExitCode::Success,
        Err(e) => output.error(format!("Relay failed: {}", e), ExitCode::Error),
    }
}

// =============================================================================
// Resolve Command
// =============================================================================

/// Resolution result for one embed page
#[derive(Debug, Serialize)]
pub struct ResolveReport {
    #[serde(flatten)]
    pub media: ResolvedMedia,
    /// The same URL routed through the relay
    pub relay_url: String,
}

pub async fn resolve_cmd(cmd: ResolveCmd, config: &Config, output: &Output) -> ExitCode {
    if !is_absolute_http(&cmd.url) {
        return output.error(
            "Embed URL must be absolute http(s)",
            ExitCode::InvalidArgs,
        );
    }

    let extractor = match MediaExtractor::new() {
        Ok(extractor) => extractor,
        Err(e) => return output.error(e.to_string(), ExitCode::Error),
    };

    // Fetch through the given relay, or a throwaway in-process one
    let (relay, _guard) = match relay_route(cmd.relay, config).await {
        Ok(pair) => pair,
        Err(e) => return output.error(e.to_string(), ExitCode::Error),
    };

    output.info(format!("Resolving {}", cmd.url));

    let fetcher = PageFetcher::new();
    let body = match fetcher.fetch_text(&relay.route(&cmd.url)).await {
        Ok(body) => body,
        Err(e) => return output.error(format!("Fetch failed: {}", e), ExitCode::NetworkError),
    };

    match extractor.extract(&body) {
        Some(media) => {
            let relay_url = relay.route(media.url());
            let report = ResolveReport { media, relay_url };
            if let Err(e) = output.print(&report) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
            ExitCode::Success
        }
        None => output.error("No playable media found", ExitCode::NoSources),
    }
}

// =============================================================================
// Catalog Command
// =============================================================================

pub async fn catalog_cmd(cmd: CatalogCmd, config: &Config, output: &Output) -> ExitCode {
    let catalog = match title_catalog(&cmd.title_id, config) {
        Ok(catalog) => catalog,
        Err(code) => return output.error("Content not available", code),
    };

    if let Err(e) = output.print(&catalog) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

// =============================================================================
// Probe Command
// =============================================================================

/// Outcome of probing one catalog entry
#[derive(Debug, Serialize)]
pub struct ProbeReport {
    pub name: String,
    pub strategy: SourceStrategy,
    pub locator_url: String,
    /// "manifest", "progressive", "frame" or "frame-fallback"
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
}

pub async fn probe_cmd(cmd: ProbeCmd, config: &Config, output: &Output) -> ExitCode {
    let catalog = match title_catalog(&cmd.title_id, config) {
        Ok(catalog) => catalog,
        Err(code) => return output.error("Content not available", code),
    };

    let extractor = match MediaExtractor::new() {
        Ok(extractor) => extractor,
        Err(e) => return output.error(e.to_string(), ExitCode::Error),
    };

    let (relay, guard) = match relay_route(None, config).await {
        Ok(pair) => pair,
        Err(e) => return output.error(e.to_string(), ExitCode::Error),
    };

    let fetcher = PageFetcher::new();
    let mut reports = Vec::with_capacity(catalog.len());

    for entry in &catalog {
        output.info(format!("Probing {} ({})", entry.name, entry.strategy));
        reports.push(probe_entry(entry, &extractor, &relay, &fetcher).await);
    }

    if let Some(handle) = guard {
        handle.abort();
    }

    if let Err(e) = output.print(&reports) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

async fn probe_entry(
    entry: &CandidateSource,
    extractor: &MediaExtractor,
    relay: &RelayRoute,
    fetcher: &PageFetcher,
) -> ProbeReport {
    let (outcome, media_url) = match entry.strategy {
        SourceStrategy::Frame => ("frame".to_string(), None),
        SourceStrategy::Resolved => {
            let body = fetcher.fetch_text(&relay.route(&entry.locator_url)).await;
            match body.ok().and_then(|text| extractor.extract(&text)) {
                Some(ResolvedMedia::Manifest(url)) => ("manifest".to_string(), Some(url)),
                Some(ResolvedMedia::Progressive(url)) => ("progressive".to_string(), Some(url)),
                None => ("frame-fallback".to_string(), None),
            }
        }
    };

    ProbeReport {
        name: entry.name.clone(),
        strategy: entry.strategy,
        locator_url: entry.locator_url.clone(),
        outcome,
        media_url,
    }
}

// =============================================================================
// Stats Command
// =============================================================================

pub async fn stats_cmd(cmd: StatsCmd, config: &Config, output: &Output) -> ExitCode {
    let store = match cmd.history.or_else(|| config.history_path.clone()) {
        Some(path) => HistoryStore::new(path),
        None => match HistoryStore::open_default() {
            Ok(store) => store,
            Err(e) => return output.error(e.to_string(), ExitCode::Error),
        },
    };

    output.info(format!("Reading history from {}", store.path().display()));

    let items = match store.load() {
        Ok(items) => items,
        Err(e) => return output.error(format!("Failed to load history: {}", e), ExitCode::Error),
    };

    let stats = aggregate(&items);
    if let Err(e) = output.print(&stats) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

// =============================================================================
// Shared Helpers
// =============================================================================

/// Render the configured slot templates into a catalog for a title
fn title_catalog(title_id: &str, config: &Config) -> Result<Vec<CandidateSource>, ExitCode> {
    let slots = SourceSlots::from_templates(title_id, &config.slots);
    if slots.is_empty() {
        return Err(ExitCode::Unavailable);
    }
    let catalog = build_catalog(&slots);
    if catalog.is_empty() {
        return Err(ExitCode::Unavailable);
    }
    Ok(catalog)
}

/// Use the given relay base, or spawn an in-process relay on an ephemeral port
async fn relay_route(
    base: Option<String>,
    config: &Config,
) -> anyhow::Result<(RelayRoute, Option<tokio::task::JoinHandle<()>>)> {
    match base.or_else(|| config.relay_base.clone()) {
        Some(base) => Ok((RelayRoute::new(base), None)),
        None => {
            let server = RelayServer::new(config.relay_settings());
            let (addr, handle) = server.spawn("127.0.0.1:0".parse()?).await?;
            Ok((RelayRoute::new(format!("http://{}", addr)), Some(handle)))
        }
    }
}
