use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server origin without a trailing slash.
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Reads `RESUME_API_URL` and `RESUME_API_TIMEOUT_SECS`, loading `.env` first.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::new(
            std::env::var("RESUME_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        );
        if let Ok(raw) = std::env::var("RESUME_API_TIMEOUT_SECS") {
            let secs: u64 = raw
                .parse()
                .with_context(|| format!("RESUME_API_TIMEOUT_SECS has an invalid value '{raw}'"))?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
