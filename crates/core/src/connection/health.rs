//! Backend health probe (`GET /api/health` next to the WebSocket endpoint).

use crate::error::{IdeationError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// HTTP health URL for the host behind a WebSocket endpoint
pub fn health_url(ws_url: &Url) -> Result<Url> {
    let scheme = match ws_url.scheme() {
        "ws" | "http" => "http",
        "wss" | "https" => "https",
        other => {
            return Err(IdeationError::InvalidUrl {
                url: ws_url.to_string(),
                reason: format!("unsupported scheme '{}'", other),
            })
        }
    };

    let mut url = ws_url.clone();
    url.set_scheme(scheme).map_err(|_| IdeationError::InvalidUrl {
        url: ws_url.to_string(),
        reason: "cannot derive http url".to_string(),
    })?;
    url.set_path("/api/health");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Probe the backend
pub async fn check_health(ws_url: &Url, timeout: Duration) -> Result<HealthStatus> {
    let url = health_url(ws_url)?;
    tracing::debug!(url = %url, "Probing backend health");

    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let status = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json::<HealthStatus>()
        .await?;
    Ok(status)
}
