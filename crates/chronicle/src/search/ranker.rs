//! Weighted multi-field relevance ranking
//!
//! score(record) = Σ weight[field] × field_match(query, record[field])
//!
//! Filters are applied first as a hard predicate, zero scores are dropped, and ties are broken
//! by primary key so identical inputs always produce identical orderings.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::config::CategoryConfig;
use crate::filters::{record_passes, Filters};
use crate::records::Record;
use crate::search::tokenizer::field_match;

/// A record with its relevance score and the fields that contributed to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
  pub record: Record,
  pub score: f64,
  pub matched_fields: BTreeSet<String>,
}

/// Score and order `candidates`, highest score first.
///
/// With no query tokens, records that pass a non-empty filter set are scored by the summed
/// weights of the filtered fields (structured filters count as binary matches). With neither
/// tokens nor filters nothing matches.
pub fn rank(
  query_tokens: &[String],
  filters: &Filters,
  candidates: Vec<Record>,
  table: &CategoryConfig,
) -> Vec<ScoredResult> {
  if query_tokens.is_empty() && filters.is_empty() {
    return Vec::new();
  }

  let mut results: Vec<ScoredResult> = candidates
    .into_iter()
    .filter(|record| record_passes(record, filters))
    .filter_map(|record| {
      let (score, matched_fields) = if query_tokens.is_empty() {
        score_by_filters(filters, table)
      } else {
        score_by_text(query_tokens, &record, table)
      };

      (score > 0.0).then_some(ScoredResult { record, score, matched_fields })
    })
    .collect();

  results.sort_by(compare);
  results
}

/// Descending score, then ascending primary key
pub fn compare(a: &ScoredResult, b: &ScoredResult) -> Ordering {
  b.score.total_cmp(&a.score).then_with(|| compare_keys(&a.record.key, &b.record.key))
}

/// Natural key order: numeric keys by value and before any other key, the rest as strings
pub fn compare_keys(a: &str, b: &str) -> Ordering {
  let numeric = |key: &str| {
    if key.bytes().all(|byte| byte.is_ascii_digit()) {
      key.parse::<u64>().ok()
    } else {
      None
    }
  };

  match (numeric(a), numeric(b)) {
    (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
    (Some(_), None) => Ordering::Less,
    (None, Some(_)) => Ordering::Greater,
    (None, None) => a.cmp(b),
  }
}

fn score_by_text(
  query_tokens: &[String],
  record: &Record,
  table: &CategoryConfig,
) -> (f64, BTreeSet<String>) {
  let mut score = 0.0;
  let mut matched = BTreeSet::new();

  for (name, spec) in &table.fields {
    let Some(value) = record.field(name) else {
      continue;
    };

    let contribution = spec.weight * field_match(query_tokens, value);
    if contribution > 0.0 {
      score += contribution;
      matched.insert(name.clone());
    }
  }

  (score, matched)
}

fn score_by_filters(filters: &Filters, table: &CategoryConfig) -> (f64, BTreeSet<String>) {
  let weight: f64 =
    filters.keys().filter_map(|name| table.fields.get(name)).map(|spec| spec.weight).sum();
  let matched = filters.keys().cloned().collect();

  // Zero-weight filter fields still have to surface the records they selected.
  (if weight > 0.0 { weight } else { 1.0 }, matched)
}
