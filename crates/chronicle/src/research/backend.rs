//! External reasoning backend
//!
//! One narrow text-generation call. Every error is transient from the panel's point of view:
//! analyzers turn it into a failed result and the orchestrator falls back when nothing succeeds.

use async_trait::async_trait;
use reqwest::{
  header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
  Client, StatusCode,
};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

use crate::config::BackendConfig;

/// Role instruction plus the user-facing prompt
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
  pub instruction: String,
  pub prompt: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
  pub text: String,
  /// Backend-reported confidence, when the backend has one
  pub confidence: Option<f64>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
  #[error("Reasoning backend unavailable: {message}")]
  Unavailable { message: String },

  #[error("Reasoning backend timed out after {after_ms}ms")]
  Timeout { after_ms: u64 },

  #[error("Reasoning backend rate limited: {message}")]
  RateLimited { message: String },
}

impl BackendError {
  pub fn unavailable(message: impl Into<String>) -> Self {
    Self::Unavailable { message: message.into() }
  }

  pub fn timeout(after: Duration) -> Self {
    Self::Timeout { after_ms: after.as_millis() as u64 }
  }

  pub fn rate_limited(message: impl Into<String>) -> Self {
    Self::RateLimited { message: message.into() }
  }
}

/// Text-generation abstraction; fakes implement this in tests
#[async_trait]
pub trait ReasoningBackend: Send + Sync {
  async fn generate(&self, request: &GenerationRequest) -> Result<Generation, BackendError>;
}

/// Client for an OpenAI-compatible chat-completions endpoint
pub struct OpenAiBackend {
  client: Client,
  config: BackendConfig,
  api_key: Option<String>,
  timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
  choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
  message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
  #[serde(default)]
  content: Option<String>,
}

impl OpenAiBackend {
  /// Build a backend reading the API key from the configured environment variable
  pub fn from_env(config: &BackendConfig, timeout: Duration) -> Result<Self, BackendError> {
    let api_key = std::env::var(&config.api_key_env).ok().filter(|key| !key.trim().is_empty());
    Self::new(config.clone(), api_key, timeout)
  }

  pub fn new(
    config: BackendConfig,
    api_key: Option<String>,
    timeout: Duration,
  ) -> Result<Self, BackendError> {
    let client = Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| BackendError::unavailable(format!("cannot build HTTP client: {e}")))?;

    if api_key.is_none() {
      tracing::debug!(env = %config.api_key_env, "no API key configured, backend disabled");
    }

    Ok(Self { client, config, api_key, timeout })
  }

  pub fn is_configured(&self) -> bool {
    self.api_key.is_some()
  }

  fn headers(&self, api_key: &str) -> Result<HeaderMap, BackendError> {
    let mut headers = HeaderMap::new();
    let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
      .map_err(|_| BackendError::unavailable("API key is not a valid header value"))?;
    headers.insert(AUTHORIZATION, bearer);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
  }

  fn classify(&self, error: reqwest::Error) -> BackendError {
    if error.is_timeout() {
      BackendError::timeout(self.timeout)
    } else {
      BackendError::unavailable(format!("request failed: {error}"))
    }
  }
}

#[async_trait]
impl ReasoningBackend for OpenAiBackend {
  async fn generate(&self, request: &GenerationRequest) -> Result<Generation, BackendError> {
    let api_key = self.api_key.as_deref().ok_or_else(|| {
      BackendError::unavailable(format!("{} is not set", self.config.api_key_env))
    })?;

    let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
    let payload = json!({
      "model": self.config.model,
      "max_tokens": self.config.max_tokens,
      "temperature": self.config.temperature,
      "messages": [
        { "role": "system", "content": request.instruction },
        { "role": "user", "content": request.prompt }
      ]
    });

    let response = self
      .client
      .post(&url)
      .headers(self.headers(api_key)?)
      .json(&payload)
      .send()
      .await
      .map_err(|e| self.classify(e))?;

    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
      return Err(BackendError::rate_limited(format!("{url} returned {status}")));
    }
    if !status.is_success() {
      return Err(BackendError::unavailable(format!("{url} returned {status}")));
    }

    let completion: ChatCompletion = response.json().await.map_err(|e| self.classify(e))?;
    let text = completion
      .choices
      .into_iter()
      .find_map(|choice| choice.message.content)
      .map(|text| text.trim().to_string())
      .filter(|text| !text.is_empty())
      .ok_or_else(|| BackendError::unavailable("response contained no completion text"))?;

    Ok(Generation { text, confidence: None })
  }
}
