//! # Client Configuration
//!
//! Layered configuration for the ideation client:
//!
//! ```text
//! defaults → .ideation/config.json → environment → CLI flags
//! ```
//!
//! Each layer is a [`PersistedConfig`] overlay; only the fields it sets
//! replace the ones below it.

use crate::connection::ReconnectPolicy;
use crate::error::IdeationError;
use crate::state::io;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const DEFAULT_WS_URL: &str = "ws://localhost:8000/ws/ideate";
pub const CONFIG_FILE: &str = "config.json";

/// Effective client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// WebSocket endpoint of the ideation backend
    pub ws_url: String,
    /// How long to wait for the socket to open before giving up
    pub connect_timeout_secs: u64,
    /// Inactivity limit for a running request (0 = wait forever)
    pub run_timeout_secs: u64,
    /// Tag outbound requests with a `request_id` and drop mismatched frames
    pub correlate_requests: bool,
    pub reconnect: ReconnectPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ws_url: DEFAULT_WS_URL.to_string(),
            connect_timeout_secs: 10,
            run_timeout_secs: 60,
            correlate_requests: false,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Load from the default runtime directory and process environment
    pub async fn load() -> Result<Self> {
        Self::load_from(&io::get_runtime_path(), |key| std::env::var(key).ok()).await
    }

    /// Load from `root` and an environment lookup
    pub async fn load_from(root: &Path, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(file) = PersistedConfig::load(root).await? {
            config.apply(file);
        }
        config.apply(PersistedConfig::from_env_with(env));
        Ok(config)
    }

    /// Apply an overlay
    pub fn apply(&mut self, overlay: PersistedConfig) {
        if let Some(ws_url) = overlay.ws_url {
            self.ws_url = ws_url;
        }
        if let Some(secs) = overlay.connect_timeout_secs {
            self.connect_timeout_secs = secs;
        }
        if let Some(secs) = overlay.run_timeout_secs {
            self.run_timeout_secs = secs;
        }
        if let Some(correlate) = overlay.correlate_requests {
            self.correlate_requests = correlate;
        }
        if let Some(reconnect) = overlay.reconnect {
            self.reconnect = reconnect;
        }
        if let Some(attempts) = overlay.reconnect_attempts {
            self.reconnect.max_attempts = attempts;
        }
    }

    /// Parsed and validated endpoint
    pub fn endpoint(&self) -> crate::Result<Url> {
        let url = Url::parse(&self.ws_url).map_err(|e| IdeationError::InvalidUrl {
            url: self.ws_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(IdeationError::InvalidUrl {
                url: self.ws_url.clone(),
                reason: "scheme must be ws or wss".to_string(),
            });
        }
        Ok(url)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn run_timeout(&self) -> Option<Duration> {
        (self.run_timeout_secs > 0).then(|| Duration::from_secs(self.run_timeout_secs))
    }
}

/// Partial configuration (file, environment or CLI layer)
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PersistedConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ws_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlate_requests: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconnect: Option<ReconnectPolicy>,
    /// Shorthand for `reconnect.max_attempts`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconnect_attempts: Option<u32>,
}

impl PersistedConfig {
    /// Read `config.json` under `root`, if present
    pub async fn load(root: &Path) -> Result<Option<Self>> {
        if !io::file_exists(root, CONFIG_FILE).await {
            return Ok(None);
        }
        let content = io::read_file(root, CONFIG_FILE).await?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file: {:?}", root.join(CONFIG_FILE)))?;
        Ok(Some(config))
    }

    /// Write `config.json` under `root`
    pub async fn save(&self, root: &Path) -> Result<PathBuf> {
        let content = serde_json::to_string_pretty(self)?;
        io::write_runtime_file(root, CONFIG_FILE, &content).await
    }

    /// Overlay from environment variables
    pub fn from_env_with(env: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            ws_url: env("IDEATION_WS_URL").or_else(|| env("WEBSOCKET_URL")),
            connect_timeout_secs: parse_var(&env, "IDEATION_CONNECT_TIMEOUT_SECS"),
            run_timeout_secs: parse_var(&env, "IDEATION_RUN_TIMEOUT_SECS"),
            correlate_requests: parse_var(&env, "IDEATION_CORRELATE_REQUESTS"),
            reconnect: None,
            reconnect_attempts: parse_var(&env, "IDEATION_RECONNECT_ATTEMPTS"),
        }
    }
}

fn parse_var<T: std::str::FromStr>(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = env(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable environment variable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[tokio::test]
    async fn test_defaults_without_file_or_env() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::load_from(dir.path(), env_of(&[])).await.unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.endpoint().unwrap().as_str(), DEFAULT_WS_URL);
        assert_eq!(config.run_timeout(), Some(Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn test_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        PersistedConfig {
            ws_url: Some("ws://file-host:9000/ws/ideate".to_string()),
            run_timeout_secs: Some(0),
            ..PersistedConfig::default()
        }
        .save(dir.path())
        .await
        .unwrap();

        let config = ClientConfig::load_from(
            dir.path(),
            env_of(&[
                ("WEBSOCKET_URL", "ws://env-host:8000/ws/ideate"),
                ("IDEATION_CORRELATE_REQUESTS", "true"),
                ("IDEATION_RECONNECT_ATTEMPTS", "not-a-number"),
            ]),
        )
        .await
        .unwrap();

        assert_eq!(config.ws_url, "ws://env-host:8000/ws/ideate");
        assert_eq!(config.run_timeout(), None);
        assert!(config.correlate_requests);
        assert_eq!(config.reconnect, ReconnectPolicy::default());
    }

    #[test]
    fn test_primary_env_var_wins() {
        let overlay = PersistedConfig::from_env_with(env_of(&[
            ("IDEATION_WS_URL", "ws://a/ws"),
            ("WEBSOCKET_URL", "ws://b/ws"),
        ]));
        assert_eq!(overlay.ws_url.as_deref(), Some("ws://a/ws"));
    }

    #[tokio::test]
    async fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        io::write_runtime_file(dir.path(), CONFIG_FILE, "{ nope")
            .await
            .unwrap();
        let err = ClientConfig::load_from(dir.path(), env_of(&[]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid config file"));
    }


    #[test]
    fn test_endpoint_rejects_http() {
        let config = ClientConfig {
            ws_url: "http://localhost:8000/ws/ideate".to_string(),
            ..ClientConfig::default()
        };
        assert!(matches!(
            config.endpoint(),
            Err(IdeationError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_reconnect_attempts_shorthand() {
        let mut config = ClientConfig::default();
        config.apply(PersistedConfig {
            reconnect_attempts: Some(0),
            ..PersistedConfig::default()
        });
        assert_eq!(config.reconnect.max_attempts, 0);
        assert_eq!(config.reconnect.initial_delay_ms, 500);
    }
}
