//! Gemini backend over the `generateContent` REST API.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::backend::LlmBackend;
use crate::error::{LlmError, Result};
use crate::types::{GenerateRequest, GenerateResponse};

/// Default API base URL.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Default model.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Configuration for the Gemini backend.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key.
    pub api_key: String,
    /// Base URL of the API.
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Create a config with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Create a config from the `GEMINI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| LlmError::config("GEMINI_API_KEY environment variable not set"))?;
        Ok(Self::new(api_key))
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Gemini `generateContent` backend.
#[derive(Debug)]
pub struct GeminiBackend {
    config: GeminiConfig,
    http: reqwest::Client,
}

impl GeminiBackend {
    /// Create a backend from its config.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::config("API key is empty"));
        }
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;
        Ok(Self { config, http })
    }

    /// Create a backend from the environment.
    pub fn from_env() -> Result<Self> {
        Self::new(GeminiConfig::from_env()?)
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        debug!(
            model = %self.config.model,
            turns = request.contents.len(),
            tools = request.tools.first().map(|t| t.function_declarations.len()).unwrap_or(0),
            "calling generateContent"
        );

        // The key travels in a header so it never appears in URLs or logs.
        let response = self
            .http
            .post(self.generate_url())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| status.to_string());
            error!(status = status.as_u16(), "generateContent failed");
            return Err(LlmError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<GenerateResponse>().await?)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
