//! Search service: validation, candidate fetch, ranking and pagination

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::Config;
use crate::error::{ChronicleError, Result};
use crate::filters::{Constraint, Filters};
use crate::records::Category;
use crate::search::ranker::{self, ScoredResult};
use crate::search::tokenizer;
use crate::store::RecordStore;

fn default_limit() -> usize {
  20
}

/// A single search request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
  #[serde(default)]
  pub text: String,
  pub category: Category,
  #[serde(default)]
  pub filters: Filters,
  #[serde(default)]
  pub offset: usize,
  #[serde(default = "default_limit")]
  pub limit: usize,
}

impl SearchQuery {
  pub fn new(category: Category, text: impl Into<String>) -> Self {
    Self { text: text.into(), category, filters: Filters::new(), offset: 0, limit: default_limit() }
  }

  pub fn with_filter(mut self, field: &str, constraint: Constraint) -> Self {
    self.filters.insert(field.to_string(), constraint);
    self
  }

  pub fn paginate(mut self, offset: usize, limit: usize) -> Self {
    self.offset = offset;
    self.limit = limit;
    self
  }
}

/// One page of ranked results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
  pub results: Vec<ScoredResult>,
  /// Matches before pagination
  pub total_count: usize,
}

/// Stateless over an immutable store snapshot; safe to share between callers
pub struct SearchService {
  config: Arc<Config>,
  store: Arc<dyn RecordStore>,
}

impl SearchService {
  pub fn new(config: Arc<Config>, store: Arc<dyn RecordStore>) -> Self {
    Self { config, store }
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn store(&self) -> &dyn RecordStore {
    self.store.as_ref()
  }

  pub fn search(&self, query: &SearchQuery) -> Result<SearchResults> {
    if query.limit == 0 {
      return Err(ChronicleError::invalid_query("limit must be greater than zero"));
    }

    let ranked = self.rank_all(query)?;
    let total_count = ranked.len();
    let results: Vec<ScoredResult> =
      ranked.into_iter().skip(query.offset).take(query.limit).collect();

    tracing::debug!(
      category = %query.category,
      total_count,
      returned = results.len(),
      offset = query.offset,
      "search completed"
    );

    Ok(SearchResults { results, total_count })
  }

  /// Every match for `query` in rank order, ignoring pagination
  pub fn rank_all(&self, query: &SearchQuery) -> Result<Vec<ScoredResult>> {
    let table = self.config.category(query.category)?;

    for (field, constraint) in &query.filters {
      let spec = table.fields.get(field).ok_or_else(|| {
        ChronicleError::invalid_query(format!(
          "unknown field '{field}' for category {}",
          query.category
        ))
      })?;
      constraint.validate(field, spec.kind)?;
    }

    let tokens = tokenizer::normalize(&query.text);
    if tokens.is_empty() && query.filters.is_empty() {
      return Ok(Vec::new());
    }

    let candidates = self.store.fetch(query.category, &query.filters)?;
    tracing::debug!(
      category = %query.category,
      candidates = candidates.len(),
      "fetched candidates"
    );

    Ok(ranker::rank(&tokens, &query.filters, candidates, table))
  }
}
