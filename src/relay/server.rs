//! Egress relay HTTP service
//!
//! Performs outbound fetches on behalf of the player so the browser never
//! talks to upstream origins directly. The relay presents a browser identity
//! (User-Agent plus a referer matching the upstream family), forwards Range
//! requests verbatim and streams the upstream body back byte-exact.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, warn};

use super::rewrite::is_absolute_http;

/// Default browser identity presented to upstreams
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Referer override for a known upstream family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefererRule {
    /// Substring matched against the target host/URL
    pub host_contains: String,
    /// Referer to present when the rule matches
    pub referer: String,
}

/// Relay behavior knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaySettings {
    pub user_agent: String,
    /// First matching rule wins; otherwise the target's own origin is used
    pub referer_rules: Vec<RefererRule>,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            user_agent: BROWSER_USER_AGENT.to_string(),
            referer_rules: Vec::new(),
        }
    }
}

impl RelaySettings {
    /// Pick the referer to present for a target URL
    pub fn referer_for(&self, target: &str) -> String {
        for rule in &self.referer_rules {
            if target.contains(&rule.host_contains) {
                return rule.referer.clone();
            }
        }
        origin_of(target)
    }
}

/// `scheme://host/` portion of an absolute URL
fn origin_of(url: &str) -> String {
    let after_scheme = url.find("://").map(|i| i + 3).unwrap_or(0);
    match url[after_scheme..].find('/') {
        Some(i) => format!("{}/", &url[..after_scheme + i]),
        None => format!("{}/", url),
    }
}

/// Relay request errors, rendered as JSON payloads
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("missing url parameter")]
    MissingUrl,

    #[error("url must be an absolute http(s) URL")]
    InvalidUrl,

    #[error("upstream fetch failed: {0}")]
    Upstream(#[source] reqwest::Error),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = match self {
            RelayError::MissingUrl | RelayError::InvalidUrl => StatusCode::BAD_REQUEST,
            RelayError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct RelayQuery {
    url: Option<String>,
}

struct RelayState {
    client: reqwest::Client,
    settings: RelaySettings,
}

/// The egress relay service
pub struct RelayServer {
    settings: RelaySettings,
}

impl RelayServer {
    pub fn new(settings: RelaySettings) -> Self {
        Self { settings }
    }

    /// Build the axum router with CORS for browser callers
    pub fn router(self) -> Router {
        let state = Arc::new(RelayState {
            client: reqwest::Client::new(),
            settings: self.settings,
        });

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers([
                header::CONTENT_TYPE,
                header::RANGE,
                header::USER_AGENT,
                header::REFERER,
            ]);

        Router::new()
            .route("/relay", get(relay))
            .layer(cors)
            .with_state(state)
    }

    /// Bind and serve until shutdown
    pub async fn serve(self, addr: SocketAddr) -> anyhow::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("relay listening on {}", listener.local_addr()?);
        axum::serve(listener, self.router()).await?;
        Ok(())
    }

    /// Bind (possibly to an ephemeral port) and serve in a background task
    pub async fn spawn(self, addr: SocketAddr) -> anyhow::Result<(SocketAddr, JoinHandle<()>)> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let router = self.router();
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                warn!("relay stopped: {}", e);
            }
        });
        Ok((local_addr, handle))
    }
}

impl Default for RelayServer {
    fn default() -> Self {
        Self::new(RelaySettings::default())
    }
}

/// GET /relay?url=<percent-encoded absolute URL>
async fn relay(
    State(state): State<Arc<RelayState>>,
    Query(params): Query<RelayQuery>,
    headers: HeaderMap,
) -> Result<Response, RelayError> {
    let target = params.url.ok_or(RelayError::MissingUrl)?;
    if !is_absolute_http(&target) {
        return Err(RelayError::InvalidUrl);
    }

    debug!(%target, "relaying");

    let mut request = state
        .client
        .get(&target)
        .header("User-Agent", &state.settings.user_agent)
        .header("Accept", "*/*")
        .header("Accept-Language", "en-US,en;q=0.9")
        .header("Referer", state.settings.referer_for(&target));

    // Forward Range verbatim so seeking works through the relay
    if let Some(range) = headers.get(header::RANGE).and_then(|v| v.to_str().ok()) {
        request = request.header("Range", range);
    }

    let upstream = request.send().await.map_err(RelayError::Upstream)?;

    let status =
        StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    if !status.is_success() {
        debug!(%target, %status, "upstream responded non-2xx");
    }

    let mut response_headers = HeaderMap::new();
    for name in [
        header::CONTENT_TYPE,
        header::CONTENT_LENGTH,
        header::ACCEPT_RANGES,
        header::CONTENT_RANGE,
    ] {
        if let Some(value) = upstream.headers().get(name.as_str()) {
            if let Ok(value) = HeaderValue::from_bytes(value.as_bytes()) {
                response_headers.insert(name, value);
            }
        }
    }

    let body = Body::from_stream(upstream.bytes_stream());
    Ok((status, response_headers, body).into_response())
}
