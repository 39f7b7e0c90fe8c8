//! REST API request and response types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ChronicleError;
use crate::records::Category;
use crate::research::roles::{Role, RoleConfig};

// Base Response Structure
// ======================

/// Envelope shared by every endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct BaseResponse<T> {
  /// API versioning information
  pub versioning: VersionInfo,

  /// Transaction ID for logging correlation
  pub transaction_id: Uuid,

  #[serde(skip_serializing_if = "Vec::is_empty", default)]
  pub errors: Vec<ApiError>,

  /// Endpoint payload, flattened into the envelope
  #[serde(flatten)]
  pub data: T,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VersionInfo {
  pub latest: String,
  pub requested: String,
  pub resolved: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
  /// Stable error key, e.g. `invalid_query`
  pub key: String,

  /// Human readable error message
  pub message: String,

  /// Additional error context
  #[serde(default)]
  pub context: serde_json::Value,
}

// Status
// ======

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
  pub status: String,
  pub version: String,
  /// Records in the loaded snapshot
  pub records: usize,
  /// Whether an API key for the reasoning backend was found
  pub backend_configured: bool,
}

// Research
// ========

/// Request for POST /research
#[derive(Debug, Serialize, Deserialize)]
pub struct ResearchRequest {
  pub query: String,
  pub category: Category,
}

// Filter options
// ==============

/// Query string for GET /filters/options
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FilterOptionsParams {
  /// Defaults to personnel
  #[serde(default)]
  pub category: Option<Category>,
}

// Roles
// =====

#[derive(Debug, Serialize, Deserialize)]
pub struct RolesResponse {
  pub roles: Vec<RoleSummary>,
  /// Roles consulted when none match a query
  pub default_roles: Vec<Role>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoleSummary {
  pub role: Role,
  pub label: String,
  pub expertise: String,
  pub categories: Vec<Category>,
  pub keywords: Vec<String>,
}

impl From<&RoleConfig> for RoleSummary {
  fn from(config: &RoleConfig) -> Self {
    Self {
      role: config.role,
      label: config.label.clone(),
      expertise: config.expertise.clone(),
      categories: config.categories.clone(),
      keywords: config.keywords.clone(),
    }
  }
}

// Helper Functions
// ================

fn version_info() -> VersionInfo {
  let version = env!("CARGO_PKG_VERSION");
  VersionInfo {
    latest: version.to_string(),
    requested: version.to_string(),
    resolved: version.to_string(),
  }
}

impl<T> BaseResponse<T> {
  /// Create a successful response
  pub fn success(data: T, transaction_id: Uuid) -> Self {
    Self { versioning: version_info(), transaction_id, errors: Vec::new(), data }
  }
}

impl BaseResponse<()> {
  /// Create an error response
  pub fn error(errors: Vec<ApiError>, transaction_id: Uuid) -> Self {
    Self { versioning: version_info(), transaction_id, errors, data: () }
  }
}

impl ApiError {
  pub fn new(key: &str, message: &str) -> Self {
    Self { key: key.to_string(), message: message.to_string(), context: serde_json::Value::Null }
  }
}

impl From<&ChronicleError> for ApiError {
  fn from(error: &ChronicleError) -> Self {
    ApiError::new(error.key(), &error.to_string())
  }
}
