//! Research orchestrator
//!
//! Picks the applicable specialist roles, fans the query out to all of them concurrently, waits
//! for every one to finish or fail, and merges the successes in role priority order. When no
//! analyzer succeeds the deterministic fallback narrative is returned instead.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{ChronicleError, Result};
use crate::records::Category;
use crate::research::analyzer::{self, AnalyzerRequest, AnalyzerResult};
use crate::research::backend::ReasoningBackend;
use crate::research::fallback;
use crate::research::roles::RoleConfig;
use crate::search::tokenizer;
use crate::search::{SearchQuery, SearchService};

/// Aggregated answer to one research query.
///
/// With `used_fallback` set, `results` is empty and `confidence` is the configured fallback
/// constant; otherwise `confidence` is the mean over successful analyzers only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchResponse {
  pub query: String,
  pub category: Category,
  pub narrative: String,
  pub confidence: f64,
  /// Per-role outcomes in role priority order, failures included
  pub results: Vec<AnalyzerResult>,
  pub used_fallback: bool,
  pub memorial_context: String,
  pub elapsed_ms: u64,
}

pub struct Orchestrator {
  config: Arc<Config>,
  search: Arc<SearchService>,
  backend: Arc<dyn ReasoningBackend>,
}

impl Orchestrator {
  pub fn new(
    config: Arc<Config>,
    search: Arc<SearchService>,
    backend: Arc<dyn ReasoningBackend>,
  ) -> Self {
    Self { config, search, backend }
  }

  /// Roles whose applicability predicate matches, or the configured defaults when none do.
  /// Always returned in role priority order.
  pub fn applicable_roles(&self, category: Category, query_tokens: &[String]) -> Vec<&RoleConfig> {
    let mut roles: Vec<&RoleConfig> =
      self.config.roles.iter().filter(|role| role.applies_to(category, query_tokens)).collect();

    if roles.is_empty() {
      roles = self.config.default_roles.iter().filter_map(|role| self.config.role(*role)).collect();
    }

    roles.sort_by_key(|role| role.role);
    roles
  }

  pub async fn research(&self, query: &str, category: Category) -> Result<ResearchResponse> {
    self.research_until(query, category, CancellationToken::new()).await
  }

  /// Like [`Orchestrator::research`], but gives up with [`ChronicleError::Cancelled`] as soon as
  /// `cancel` fires. In-flight analyzer calls are dropped.
  pub async fn research_until(
    &self,
    query: &str,
    category: Category,
    cancel: CancellationToken,
  ) -> Result<ResearchResponse> {
    let started = Instant::now();

    let tokens = tokenizer::normalize(query);
    if tokens.is_empty() {
      return Err(ChronicleError::invalid_query("research query must contain search terms"));
    }

    let context = self.record_context(query, category)?;
    let roles = self.applicable_roles(category, &tokens);
    tracing::debug!(
      %category,
      roles = ?roles.iter().map(|role| role.role.as_str()).collect::<Vec<_>>(),
      context = context.len(),
      "dispatching research"
    );

    let request = AnalyzerRequest { query: query.trim().to_string(), category, records: context };
    let timeout = self.config.analyzer_timeout();
    let analyses = join_all(
      roles.iter().map(|role| analyzer::analyze(role, self.backend.as_ref(), &request, timeout)),
    );

    let mut results = tokio::select! {
      biased;
      _ = cancel.cancelled() => {
        tracing::debug!(%category, "research cancelled");
        return Err(ChronicleError::Cancelled);
      }
      results = analyses => results,
    };
    results.sort_by_key(|result| result.role);

    let response = match merge(&results) {
      Some((narrative, confidence)) => ResearchResponse {
        query: request.query,
        category,
        narrative,
        confidence,
        results,
        used_fallback: false,
        memorial_context: self.config.fallback.memorial_context.clone(),
        elapsed_ms: elapsed_ms(started),
      },
      None => {
        tracing::warn!(
          %category,
          analyzers = results.len(),
          "no analyzer succeeded, using fallback"
        );
        ResearchResponse {
          narrative: fallback::narrative(
            &self.config.fallback,
            &request.query,
            category,
            &request.records,
          ),
          query: request.query,
          category,
          confidence: self.config.fallback.confidence,
          results: Vec::new(),
          used_fallback: true,
          memorial_context: self.config.fallback.memorial_context.clone(),
          elapsed_ms: elapsed_ms(started),
        }
      }
    };

    Ok(response)
  }

  fn record_context(&self, query: &str, category: Category) -> Result<Vec<String>> {
    let search = SearchQuery::new(category, query).paginate(0, self.config.research.context_limit);
    let results = self.search.search(&search)?;
    Ok(results.results.iter().map(|scored| scored.record.summary()).collect())
  }
}

/// Merged narrative and mean confidence over successful results, or `None` if none succeeded.
///
/// `results` must already be in role priority order.
pub fn merge(results: &[AnalyzerResult]) -> Option<(String, f64)> {
  let successes: Vec<&AnalyzerResult> = results.iter().filter(|result| result.succeeded).collect();
  if successes.is_empty() {
    return None;
  }

  let confidence =
    successes.iter().map(|result| result.confidence).sum::<f64>() / successes.len() as f64;
  let narrative = successes
    .iter()
    .map(|result| format!("## {}\n{}", result.label, result.narrative))
    .collect::<Vec<_>>()
    .join("\n\n");

  Some((narrative, confidence))
}

fn elapsed_ms(started: Instant) -> u64 {
  started.elapsed().as_millis() as u64
}
