//! Persistent settings, stored as JSON in the user config directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use mailsweep_client::ClientConfig;
use mailsweep_core::{AnalysisMode, SessionConfig};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root URL of the triage service.
    pub server_url: String,
    /// Per-request timeout in seconds. `None` uses the transport default.
    pub request_timeout_secs: Option<u64>,
    /// Fetch size when `--count` is not given.
    pub default_count: u32,
    /// How fetched batches are submitted for classification.
    pub analysis_mode: AnalysisMode,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8000".into(),
            request_timeout_secs: Some(120),
            default_count: 10,
            analysis_mode: AnalysisMode::default(),
            log_filter: None,
        }
    }
}

impl Settings {
    /// `<config dir>/mailsweep/settings.json`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mailsweep")
            .join("settings.json")
    }

    /// Loads settings from `path`, falling back to defaults if it does not exist.
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Writes settings to `path`, creating parent directories.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, contents)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Client configuration for these settings.
    pub fn client_config(&self, session_cookie: Option<String>) -> Result<ClientConfig> {
        let mut config = ClientConfig::new(&self.server_url)
            .with_context(|| format!("Invalid server_url '{}'", self.server_url))?;
        if let Some(secs) = self.request_timeout_secs.filter(|secs| *secs > 0) {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(cookie) = session_cookie {
            config = config.with_session_cookie(cookie);
        }
        Ok(config)
    }

    /// Session configuration for these settings.
    pub const fn session_config(&self) -> SessionConfig {
        SessionConfig {
            analysis_mode: self.analysis_mode,
        }
    }
}
