//! Gateway configuration
//!
//! Values come from the CLI, with `GOOGLE_API_KEY` / `PROXY_URL` env fallback
//! (see `main.rs`). The API key is treated as an opaque secret: it is only
//! ever placed in the request URL and never formatted by `Debug`.

use std::time::Duration;

use crate::error::ConfigError;
use crate::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TEMPERATURE, REQUEST_TIMEOUT_SECS};

/// Everything the model gateway needs to reach the remote endpoint
#[derive(Clone)]
pub struct GatewayConfig {
    api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
    /// Optional outbound forward proxy
    pub proxy_url: Option<String>,
    /// Ask the model to append a `[[SCORE: x]]` tag
    pub scoring: bool,
}

impl GatewayConfig {
    /// Create config with defaults; a missing or blank key is fatal
    pub fn new(api_key: Option<String>) -> Result<Self, ConfigError> {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            proxy_url: None,
            scoring: true,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Blank values count as no proxy
    pub fn with_proxy(mut self, proxy_url: Option<String>) -> Self {
        self.proxy_url = proxy_url
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        self
    }

    pub fn with_scoring(mut self, scoring: bool) -> Self {
        self.scoring = scoring;
        self
    }

    /// `{base}/models/{model}:generateContent?key={apiKey}`
    pub fn endpoint_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }

    /// Endpoint without the key, for logs
    pub fn redacted_endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .field("proxy_url", &self.proxy_url)
            .field("scoring", &self.scoring)
            .finish()
    }
}
