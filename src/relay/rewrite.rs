//! Client-side relay routing
//!
//! Upstream origins reject direct requests (CORS/referer checks), so every
//! media byte (embed page, manifest, segment, progressive file) is rewritten
//! to pass through the relay using a single query-parameter convention.

use std::time::Duration;

use thiserror::Error;

/// Relay fetch errors
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("relay returned HTTP {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Check that a URL is absolute http(s)
pub fn is_absolute_http(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Builds relay-routed URLs for a fixed relay base
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayRoute {
    base: String,
}

impl RelayRoute {
    /// Create a route builder; trailing slashes on the base are ignored
    pub fn new(base: impl Into<String>) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self { base }
    }

    /// Rewrite a target URL to pass through the relay
    pub fn route(&self, target: &str) -> String {
        format!("{}/relay?url={}", self.base, urlencoding::encode(target))
    }

    pub fn base(&self) -> &str {
        &self.base
    }
}

/// Fetches embed-page text through the relay
pub struct PageFetcher {
    client: reqwest::Client,
}

impl PageFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }

    /// GET a relay-routed URL and return the body text
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

impl Default for PageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_percent_encodes_target() {
        let route = RelayRoute::new("http://127.0.0.1:3030");
        assert_eq!(
            route.route("https://cdn.test/a.m3u8?q=1"),
            "http://127.0.0.1:3030/relay?url=https%3A%2F%2Fcdn.test%2Fa.m3u8%3Fq%3D1"
        );
    }

    #[test]
    fn test_route_strips_trailing_slash() {
        let route = RelayRoute::new("http://127.0.0.1:3030/");
        assert_eq!(route.base(), "http://127.0.0.1:3030");
        assert!(route.route("https://x.test/").starts_with("http://127.0.0.1:3030/relay?url="));
    }

    #[test]
    fn test_is_absolute_http() {
        assert!(is_absolute_http("http://a.test/x"));
        assert!(is_absolute_http("https://a.test/x"));
        assert!(!is_absolute_http("ftp://a.test/x"));
        assert!(!is_absolute_http("/relative/path"));
        assert!(!is_absolute_http("cdn.test/a.m3u8"));
    }
}
