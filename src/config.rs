//! Configuration management for streamgate
//!
//! Handles config file loading/saving. Config is stored at
//! ~/.config/streamgate/config.toml and everything in it is optional;
//! sensible defaults apply when the file is absent.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::relay::server::{RefererRule, RelaySettings};
use crate::resolve::SlotTemplates;

/// Fallback bind address for the relay server
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3030";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Relay server bind address (host:port)
    pub listen_addr: Option<String>,
    /// Public base URL media requests are rewritten against
    pub relay_base: Option<String>,
    /// Browser identity presented to upstreams
    pub user_agent: Option<String>,
    /// Upstream slot URL templates with an `{id}` placeholder
    #[serde(default)]
    pub slots: SlotTemplates,
    /// Referer overrides for known upstream families
    #[serde(default)]
    pub referer_rules: Vec<RefererRule>,
    /// Viewing-history log location override
    pub history_path: Option<PathBuf>,
}

impl Config {
    /// Get config file path (~/.config/streamgate/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("streamgate").join("config.toml"))
    }

    /// Load config from file, or return default if not found
    pub fn load() -> Self {
        Self::path()
            .and_then(|p| std::fs::read_to_string(p).ok())
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Load from an explicit path; missing/invalid files fall back to default
    pub fn load_from(path: &PathBuf) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::path().ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Resolve the relay bind address
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let raw = self.listen_addr.as_deref().unwrap_or(DEFAULT_LISTEN_ADDR);
        raw.parse()
            .map_err(|e| anyhow::anyhow!("invalid listen address {}: {}", raw, e))
    }

    /// Build relay settings from the configured identity and referer rules
    pub fn relay_settings(&self) -> RelaySettings {
        let mut settings = RelaySettings {
            referer_rules: self.referer_rules.clone(),
            ..RelaySettings::default()
        };
        if let Some(ua) = &self.user_agent {
            settings.user_agent = ua.clone();
        }
        settings
    }
}
