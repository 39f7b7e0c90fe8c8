//! Generic specialist analyzer
//!
//! Every role runs through [`analyze`]; only the [`RoleConfig`] differs. Backend failures and
//! timeouts are captured in the returned [`AnalyzerResult`] and never propagate.

use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::time::Duration;

use crate::records::Category;
use crate::research::backend::{BackendError, GenerationRequest, ReasoningBackend};
use crate::research::roles::{Role, RoleConfig};

/// Heuristic confidence with no record context
const BASE_CONFIDENCE: f64 = 0.4;
/// Heuristic confidence added per context record
const CONTEXT_CONFIDENCE_STEP: f64 = 0.1;
/// Heuristic confidence ceiling; only a backend may report more
const MAX_HEURISTIC_CONFIDENCE: f64 = 0.9;

/// Input shared by every analyzer of one research call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerRequest {
  pub query: String,
  pub category: Category,
  /// One-line summaries of the most relevant records
  pub records: Vec<String>,
}

/// Outcome of a single analyzer invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerResult {
  pub role: Role,
  pub label: String,
  pub narrative: String,
  pub confidence: f64,
  pub succeeded: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub failure_reason: Option<String>,
}

impl AnalyzerResult {
  fn failed(config: &RoleConfig, error: &BackendError) -> Self {
    Self {
      role: config.role,
      label: config.label.clone(),
      narrative: String::new(),
      confidence: 0.0,
      succeeded: false,
      failure_reason: Some(error.to_string()),
    }
  }
}

/// User prompt for one role: the query, the record context, and the role's focus
pub fn build_prompt(config: &RoleConfig, request: &AnalyzerRequest) -> String {
  let mut prompt = format!("Research Query: {}\nCategory: {}\n\n", request.query, request.category);

  if request.records.is_empty() {
    prompt.push_str("No matching records were found in the memorial database.\n\n");
  } else {
    prompt.push_str("Relevant records:\n");
    for summary in &request.records {
      let _ = writeln!(prompt, "- {summary}");
    }
    prompt.push('\n');
  }

  let _ = write!(
    prompt,
    "Please provide your analysis as the {}, focusing on {}.",
    config.label, config.expertise
  );
  prompt
}

/// Confidence used when the backend does not report one
pub fn heuristic_confidence(context_records: usize) -> f64 {
  (BASE_CONFIDENCE + CONTEXT_CONFIDENCE_STEP * context_records as f64)
    .min(MAX_HEURISTIC_CONFIDENCE)
}

/// Run one role against the backend, bounded by `timeout`
pub async fn analyze(
  config: &RoleConfig,
  backend: &dyn ReasoningBackend,
  request: &AnalyzerRequest,
  timeout: Duration,
) -> AnalyzerResult {
  let generation_request = GenerationRequest {
    instruction: config.render_instruction(),
    prompt: build_prompt(config, request),
  };

  let outcome = match tokio::time::timeout(timeout, backend.generate(&generation_request)).await {
    Ok(outcome) => outcome,
    Err(_) => Err(BackendError::timeout(timeout)),
  };

  match outcome {
    Ok(generation) if !generation.text.trim().is_empty() => {
      let confidence = generation
        .confidence
        .filter(|c| c.is_finite())
        .unwrap_or_else(|| heuristic_confidence(request.records.len()))
        .clamp(0.0, 1.0);

      tracing::debug!(role = %config.role, confidence, "analyzer succeeded");
      AnalyzerResult {
        role: config.role,
        label: config.label.clone(),
        narrative: generation.text.trim().to_string(),
        confidence,
        succeeded: true,
        failure_reason: None,
      }
    }
    Ok(_) => {
      let error = BackendError::unavailable("backend returned an empty narrative");
      tracing::warn!(role = %config.role, error = %error, "analyzer failed");
      AnalyzerResult::failed(config, &error)
    }
    Err(error) => {
      tracing::warn!(role = %config.role, error = %error, "analyzer failed");
      AnalyzerResult::failed(config, &error)
    }
  }
}
