use thiserror::Error;

/// Failures surfaced to callers of `search()` and `research()`.
///
/// Reasoning-backend failures are not here: they are absorbed inside the research panel and
/// only ever show up as failed analyzer results or a fallback response.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChronicleError {
  #[error("Invalid query: {message}")]
  InvalidQuery { message: String },

  #[error("Record store unavailable: {message}")]
  StoreUnavailable { message: String },

  #[error("Invalid configuration: {message}")]
  Config { message: String },

  #[error("Request cancelled")]
  Cancelled,
}

impl ChronicleError {
  pub fn invalid_query(message: impl Into<String>) -> Self {
    Self::InvalidQuery { message: message.into() }
  }

  pub fn store_unavailable(message: impl Into<String>) -> Self {
    Self::StoreUnavailable { message: message.into() }
  }

  pub fn config(message: impl Into<String>) -> Self {
    Self::Config { message: message.into() }
  }

  /// Stable key used in API error payloads
  pub fn key(&self) -> &'static str {
    match self {
      Self::InvalidQuery { .. } => "invalid_query",
      Self::StoreUnavailable { .. } => "store_unavailable",
      Self::Config { .. } => "invalid_config",
      Self::Cancelled => "cancelled",
    }
  }
}

pub type Result<T> = std::result::Result<T, ChronicleError>;
