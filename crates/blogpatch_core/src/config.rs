//! Sync configuration.
//!
//! [`SyncConfig`] holds where the document API and the operation WebSocket
//! live, the session token, and which blog to edit. It is persisted as TOML,
//! by default at `~/.config/blogpatch/config.toml` on Unix systems.
//!
//! ```ignore
//! use blogpatch_core::config::SyncConfig;
//!
//! let mut config = SyncConfig::load()?;
//! config.server_url = Some("https://blog.example.com".into());
//! config.save()?;
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PatchError, Result};

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn is_default_timeout(ms: &u64) -> bool {
    *ms == DEFAULT_TIMEOUT_MS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Base URL of the document API, e.g. `https://blog.example.com`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,

    /// Base URL of the operation WebSocket. Derived from `server_url` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ws_url: Option<String>,

    /// Sent as the `Authorization` header and the `token` query parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,

    /// Blog to edit. The server picks the caller's draft when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blog_id: Option<i64>,

    #[serde(
        default = "default_timeout_ms",
        skip_serializing_if = "is_default_timeout"
    )]
    pub timeout_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            ws_url: None,
            session_token: None,
            blog_id: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl SyncConfig {
    /// API base without a trailing slash.
    pub fn api_base(&self) -> Result<&str> {
        self.server_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .filter(|url| !url.is_empty())
            .ok_or(PatchError::ServerNotConfigured)
    }

    /// WebSocket base without a trailing slash: `ws_url` if set, otherwise
    /// `server_url` with its scheme switched to `ws`/`wss`.
    pub fn ws_base(&self) -> Result<String> {
        if let Some(ws) = self.ws_url.as_deref().filter(|url| !url.is_empty()) {
            return Ok(ws.trim_end_matches('/').to_string());
        }
        Ok(self
            .api_base()?
            .replacen("https://", "wss://", 1)
            .replacen("http://", "ws://", 1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load from `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| PatchError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Load from `path`, or the default config if the file does not exist.
    pub fn load_from_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(|source| PatchError::FileWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl SyncConfig {
    /// Default config file path (`~/.config/blogpatch/config.toml`).
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("blogpatch").join("config.toml"))
    }

    /// Load from the default location, or the default config if there is none.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from_or_default(&path),
            None => Ok(Self::default()),
        }
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or(PatchError::NoConfigDir)?;
        self.save_to(&path)
    }
}
