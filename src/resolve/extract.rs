//! Media URL extraction from embed pages
//!
//! Upstream embed pages bury the real stream URL inside inline scripts,
//! player config objects or plain markup. Extraction runs an ordered set of
//! regex matchers over the raw page text and returns the first hit.
//!
//! ## Patterns (priority order, first match wins)
//!
//! 1. Bare absolute URL containing `.m3u8` in path/query
//! 2. Absolute URL whose path ends in `playlist.m3u8`
//! 3. Absolute URL whose path ends in `index.m3u8`
//! 4. `.m3u8` URL as a `src:`/`src=` value
//! 5. `.m3u8` URL as a `file:`/`file=` value
//! 6. Bare absolute URL ending in `.mp4`
//! 7. `.mp4` URL as a `src` value
//! 8. `.mp4` URL as a `file` value
//!
//! The ordering is deliberate: a manifest anywhere in the page always beats a
//! progressive file, and bare URLs beat keyed ones when both would match.

use regex::Regex;

use super::ResolveError;
use crate::models::ResolvedMedia;

/// Media class a pattern resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MediaClass {
    Manifest,
    Progressive,
}

struct UrlPattern {
    name: &'static str,
    regex: Regex,
    class: MediaClass,
    /// Value captured from a key/quote context; needs the clean-up pass
    keyed: bool,
}

/// Ordered-pattern extractor for playable media URLs
pub struct MediaExtractor {
    patterns: Vec<UrlPattern>,
    /// Secondary matcher that pulls the clean absolute URL out of keyed captures
    cleanup: Regex,
}

impl MediaExtractor {
    /// Create an extractor with the built-in pattern table
    pub fn new() -> Result<Self, ResolveError> {
        let patterns = vec![
            UrlPattern {
                name: "manifest_bare",
                regex: Regex::new(r#"(?i)https?://[^\s"'<>]+\.m3u8[^\s"'<>]*"#)?,
                class: MediaClass::Manifest,
                keyed: false,
            },
            UrlPattern {
                name: "manifest_playlist",
                regex: Regex::new(r#"(?i)https?://[^\s"'<>]+/playlist\.m3u8[^\s"'<>]*"#)?,
                class: MediaClass::Manifest,
                keyed: false,
            },
            UrlPattern {
                name: "manifest_index",
                regex: Regex::new(r#"(?i)https?://[^\s"'<>]+/index\.m3u8[^\s"'<>]*"#)?,
                class: MediaClass::Manifest,
                keyed: false,
            },
            UrlPattern {
                name: "manifest_src_key",
                regex: Regex::new(r#"(?i)src\s*[:=]\s*["']([^"']+\.m3u8[^"']*)["']"#)?,
                class: MediaClass::Manifest,
                keyed: true,
            },
            UrlPattern {
                name: "manifest_file_key",
                regex: Regex::new(r#"(?i)file\s*[:=]\s*["']([^"']+\.m3u8[^"']*)["']"#)?,
                class: MediaClass::Manifest,
                keyed: true,
            },
            UrlPattern {
                name: "file_bare",
                regex: Regex::new(r#"(?i)https?://[^\s"'<>]+\.mp4(?:\?[^\s"'<>]*)?"#)?,
                class: MediaClass::Progressive,
                keyed: false,
            },
            UrlPattern {
                name: "file_src_key",
                regex: Regex::new(r#"(?i)src\s*[:=]\s*["']([^"']+\.mp4(?:\?[^"']*)?)["']"#)?,
                class: MediaClass::Progressive,
                keyed: true,
            },
            UrlPattern {
                name: "file_file_key",
                regex: Regex::new(r#"(?i)file\s*[:=]\s*["']([^"']+\.mp4(?:\?[^"']*)?)["']"#)?,
                class: MediaClass::Progressive,
                keyed: true,
            },
        ];

        Ok(Self {
            patterns,
            cleanup: Regex::new(r#"(?i)https?://[^\s"'<>]+\.(?:m3u8|mp4)[^\s"'<>]*"#)?,
        })
    }

    /// Scan page text for a playable media URL
    ///
    /// Returns `None` when no pattern matches anywhere in the input. Never
    /// panics on malformed markup; a keyed capture that turns out not to
    /// contain an absolute URL is skipped and scanning moves to the next
    /// pattern.
    pub fn extract(&self, body: &str) -> Option<ResolvedMedia> {
        for pattern in &self.patterns {
            let Some(caps) = pattern.regex.captures(body) else {
                continue;
            };

            let raw = if pattern.keyed {
                caps.get(1)
            } else {
                caps.get(0)
            };
            let Some(raw) = raw else {
                continue;
            };

            let url = if pattern.keyed {
                // Relative or mangled values fail here and the pattern yields nothing
                match self.cleanup.find(raw.as_str()) {
                    Some(clean) => clean.as_str().to_string(),
                    None => continue,
                }
            } else {
                raw.as_str().to_string()
            };

            tracing::debug!(pattern = pattern.name, %url, "extracted media url");

            return Some(match pattern.class {
                MediaClass::Manifest => ResolvedMedia::Manifest(url),
                MediaClass::Progressive => ResolvedMedia::Progressive(url),
            });
        }

        None
    }
}
