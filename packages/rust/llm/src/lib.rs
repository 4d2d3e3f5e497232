//! Text-generation client for Docflow.
//!
//! One uniform `prompt in, text out` call over three HTTP backends:
//! DeepSeek and OpenAI (chat-completions shape) and Gemini
//! (`generateContent`). Credentials resolve from an explicit parameter or
//! the provider's environment variable; `test_mode` bypasses the network
//! entirely and removes the credential requirement.

use std::time::Duration;

use serde_json::json;
use tracing::{debug, warn};

use docflow_shared::{DocflowError, Result};

/// Fixed response returned by [`LlmClient::generate`] in test mode.
pub const TEST_MODE_RESPONSE: &str = "This is a placeholder response generated in test mode.";

/// Per-request timeout for backend calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Supported text-generation backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    DeepSeek,
    OpenAi,
    Gemini,
}

impl Provider {
    /// Parse a provider name as it appears in config or CLI flags.
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "deepseek" => Ok(Self::DeepSeek),
            "openai" => Ok(Self::OpenAi),
            "gemini" => Ok(Self::Gemini),
            other => Err(DocflowError::config(format!(
                "unknown provider '{other}': expected 'deepseek', 'openai', or 'gemini'"
            ))),
        }
    }

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeepSeek => "deepseek",
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
        }
    }

    /// Model used when the caller does not specify one.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::DeepSeek => "deepseek-reasoner",
            Self::OpenAi => "gpt-4o-mini",
            Self::Gemini => "gemini-1.5-flash",
        }
    }

    /// Default API base URL.
    fn default_base_url(&self) -> &'static str {
        match self {
            Self::DeepSeek => "https://api.deepseek.com/v1",
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Gemini => "https://generativelanguage.googleapis.com",
        }
    }

    /// Resolve the API key from the provider's environment variable(s).
    fn key_from_env(&self) -> Option<String> {
        let lookup = |var: &str| std::env::var(var).ok().filter(|v| !v.is_empty());
        match self {
            Self::DeepSeek => lookup("DEEPSEEK_API_KEY"),
            Self::OpenAi => lookup("OPENAI_API_KEY"),
            Self::Gemini => lookup("GEMINI_API_KEY").or_else(|| lookup("GOOGLE_API_KEY")),
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for one configured backend provider.
#[derive(Debug, Clone)]
pub struct LlmClient {
    provider: Provider,
    api_key: Option<String>,
    test_mode: bool,
    base_url: String,
    http: reqwest::Client,
}

impl LlmClient {
    /// Build a client. The API key falls back to the provider's environment
    /// variable; a missing key is a construction-time error.
    pub fn new(provider: Provider, api_key: Option<String>) -> Result<Self> {
        Self::with_options(provider, api_key, false)
    }

    /// Build a client with an explicit test-mode flag. In test mode no
    /// credential is required and no network I/O is ever performed.
    pub fn with_options(provider: Provider, api_key: Option<String>, test_mode: bool) -> Result<Self> {
        let api_key = api_key
            .filter(|k| !k.is_empty())
            .or_else(|| provider.key_from_env());

        if api_key.is_none() && !test_mode {
            return Err(DocflowError::config(format!(
                "API key for {provider} is required. \
                 Pass --api-key or set the provider's environment variable."
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DocflowError::Generation(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            provider,
            api_key,
            test_mode,
            base_url: provider.default_base_url().to_string(),
            http,
        })
    }

    /// Override the API base URL (used by tests against a mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// The configured provider.
    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Whether this client is in test mode.
    pub fn is_test_mode(&self) -> bool {
        self.test_mode
    }

    /// Generate text from a prompt. `model_id` falls back to the provider
    /// default. All failures normalize to [`DocflowError::Generation`].
    pub async fn generate(
        &self,
        prompt: &str,
        model_id: Option<&str>,
        temperature: f32,
    ) -> Result<String> {
        if self.test_mode {
            debug!(provider = %self.provider, "test mode, returning placeholder");
            return Ok(TEST_MODE_RESPONSE.to_string());
        }

        let model = model_id.unwrap_or_else(|| self.provider.default_model());
        debug!(provider = %self.provider, model, prompt_len = prompt.len(), "generating text");

        match self.provider {
            Provider::DeepSeek | Provider::OpenAi => {
                self.generate_chat_completions(prompt, model, temperature).await
            }
            Provider::Gemini => self.generate_gemini(prompt, model, temperature).await,
        }
    }

    /// DeepSeek and OpenAI share the chat-completions wire format.
    async fn generate_chat_completions(
        &self,
        prompt: &str,
        model: &str,
        temperature: f32,
    ) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let payload = json!({
            "model": model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": temperature,
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.as_deref().unwrap_or_default())
            .json(&payload)
            .send()
            .await
            .map_err(|e| DocflowError::Generation(format!("{} request failed: {e}", self.provider)))?;

        let status = response.status();
        if !status.is_success() {
            warn!(provider = %self.provider, %status, "backend returned error status");
            return Err(DocflowError::Generation(format!(
                "{} API returned HTTP {status}",
                self.provider
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| DocflowError::Generation(format!("invalid {} response: {e}", self.provider)))?;

        body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                DocflowError::Generation(format!(
                    "unexpected {} response shape: missing choices[0].message.content",
                    self.provider
                ))
            })
    }

    async fn generate_gemini(&self, prompt: &str, model: &str, temperature: f32) -> Result<String> {
        let url = format!("{}/v1/models/{model}:generateContent", self.base_url);
        let payload = json!({
            "contents": [{"parts": [{"text": prompt}]}],
            "generationConfig": {"temperature": temperature},
        });

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", self.api_key.as_deref().unwrap_or_default())
            .json(&payload)
            .send()
            .await
            .map_err(|e| DocflowError::Generation(format!("gemini request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "gemini returned error status");
            return Err(DocflowError::Generation(format!(
                "gemini API returned HTTP {status}"
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| DocflowError::Generation(format!("invalid gemini response: {e}")))?;

        body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                DocflowError::Generation(
                    "unexpected gemini response shape: missing candidates[0].content.parts[0].text"
                        .into(),
                )
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
