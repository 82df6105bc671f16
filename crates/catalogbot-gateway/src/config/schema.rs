use serde::Deserialize;
use catalogbot_core::error::{CatalogBotError, Result};

use crate::obs::DEFAULT_RECENT_LOGS_CAPACITY;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub metrics: MetricsSection,

    #[serde(default)]
    pub auth: AuthSection,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(CatalogBotError::UnsupportedVersion);
        }

        self.gateway.validate()?;
        self.metrics.validate()?;
        self.auth.validate()?;

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self { listen: default_listen() }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if self.listen.parse::<std::net::SocketAddr>().is_err() {
            return Err(CatalogBotError::BadRequest(format!(
                "gateway.listen must be a valid socket address, got {:?}",
                self.listen
            )));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Entries kept in the recent-logs ring.
    #[serde(default = "default_recent_logs_capacity")]
    pub recent_logs_capacity: usize,

    /// Snapshot poller period.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            recent_logs_capacity: default_recent_logs_capacity(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl MetricsSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=10_000).contains(&self.recent_logs_capacity) {
            return Err(CatalogBotError::BadRequest(
                "metrics.recent_logs_capacity must be between 1 and 10000".into(),
            ));
        }
        if !(1_000..=3_600_000).contains(&self.poll_interval_ms) {
            return Err(CatalogBotError::BadRequest(
                "metrics.poll_interval_ms must be between 1000 and 3600000".into(),
            ));
        }
        Ok(())
    }
}

fn default_recent_logs_capacity() -> usize {
    DEFAULT_RECENT_LOGS_CAPACITY
}
fn default_poll_interval_ms() -> u64 {
    30_000
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthSection {
    /// Accepted `X-API-KEY` values. Empty disables the check.
    #[serde(default)]
    pub api_keys: Vec<String>,

    /// Referer substrings that mark a request as coming from the portal UI.
    #[serde(default = "default_ui_origins")]
    pub ui_origins: Vec<String>,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            ui_origins: default_ui_origins(),
        }
    }
}

impl AuthSection {
    pub fn validate(&self) -> Result<()> {
        if self.api_keys.iter().any(|k| k.trim().is_empty()) {
            return Err(CatalogBotError::BadRequest(
                "auth.api_keys must not contain empty keys".into(),
            ));
        }
        if self.ui_origins.iter().any(|o| o.is_empty()) {
            // an empty origin would match every referer
            return Err(CatalogBotError::BadRequest(
                "auth.ui_origins must not contain empty entries".into(),
            ));
        }
        Ok(())
    }
}

fn default_ui_origins() -> Vec<String> {
    vec!["vercel.app".into(), "localhost".into()]
}
