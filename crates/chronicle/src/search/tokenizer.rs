//! Query and field normalization, and per-field match strength

use once_cell::sync::Lazy;
use regex::Regex;

use crate::records::FieldValue;

/// Match strength for a case-insensitive match of the whole field
pub const EXACT_MATCH: f64 = 1.0;
/// Match strength for a substring or partial token overlap
pub const PARTIAL_MATCH: f64 = 0.5;
pub const NO_MATCH: f64 = 0.0;

static PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{N}\s]").unwrap());

/// Lowercase, strip punctuation, split on whitespace.
///
/// Pure and deterministic: the same raw input always yields the same tokens.
pub fn normalize(text: &str) -> Vec<String> {
  let lowered = text.to_lowercase();
  PUNCTUATION.replace_all(&lowered, "").split_whitespace().map(str::to_string).collect()
}

/// How strongly `query_tokens` match one field value, in `[0, 1]`.
///
/// Text fields compare token sets; integer and date fields are binary equality checks against
/// individual query tokens (a date also matches its four-digit year).
pub fn field_match(query_tokens: &[String], value: &FieldValue) -> f64 {
  if query_tokens.is_empty() {
    return NO_MATCH;
  }

  match value {
    FieldValue::Text(text) => text_match(query_tokens, &normalize(text)),
    FieldValue::Integer(number) => {
      binary(query_tokens.iter().any(|token| token.parse::<i64>().is_ok_and(|n| n == *number)))
    }
    FieldValue::Date(date) => {
      let compact = date.format("%Y%m%d").to_string();
      let year = date.format("%Y").to_string();
      binary(query_tokens.iter().any(|token| *token == compact || *token == year))
    }
  }
}

fn text_match(query_tokens: &[String], field_tokens: &[String]) -> f64 {
  if field_tokens.is_empty() {
    return NO_MATCH;
  }

  if query_tokens == field_tokens {
    return EXACT_MATCH;
  }

  let overlaps = query_tokens
    .iter()
    .any(|query_token| field_tokens.iter().any(|field_token| field_token.contains(query_token)));

  if overlaps {
    PARTIAL_MATCH
  } else {
    NO_MATCH
  }
}

fn binary(matched: bool) -> f64 {
  if matched {
    EXACT_MATCH
  } else {
    NO_MATCH
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::NaiveDate;

  fn tokens(text: &str) -> Vec<String> {
    normalize(text)
  }

  #[test]
  fn test_normalize_lowercases_and_strips_punctuation() {
    assert_eq!(
      normalize("Sgt. Patrick CASSIDY, 97 Sqn!"),
      vec!["sgt", "patrick", "cassidy", "97", "sqn"]
    );
    assert_eq!(normalize("Avro Lancaster B.III"), vec!["avro", "lancaster", "biii"]);
    assert!(normalize("  ...  ").is_empty());
  }

  #[test]
  fn test_normalize_is_deterministic() {
    let raw = "Operation Chastise (Dambusters) - 16/17 May 1943";
    assert_eq!(normalize(raw), normalize(raw));
  }

  #[test]
  fn test_exact_full_field_match() {
    let value = FieldValue::Text("Patrick Cassidy".to_string());
    assert_eq!(field_match(&tokens("patrick cassidy"), &value), EXACT_MATCH);
    assert_eq!(field_match(&tokens("PATRICK   Cassidy."), &value), EXACT_MATCH);
  }

  #[test]
  fn test_partial_overlap() {
    let value = FieldValue::Text("Patrick Cassidy".to_string());
    assert_eq!(field_match(&tokens("Cassidy"), &value), PARTIAL_MATCH);
    assert_eq!(field_match(&tokens("cass"), &value), PARTIAL_MATCH);
    assert_eq!(field_match(&tokens("Gibson"), &value), NO_MATCH);
  }

  #[test]
  fn test_empty_query_never_matches() {
    let value = FieldValue::Text("anything".to_string());
    assert_eq!(field_match(&[], &value), NO_MATCH);
    assert_eq!(field_match(&tokens(""), &FieldValue::Integer(22)), NO_MATCH);
  }

  #[test]
  fn test_numeric_and_date_fields_are_binary() {
    assert_eq!(field_match(&tokens("aged 22"), &FieldValue::Integer(22)), EXACT_MATCH);
    assert_eq!(field_match(&tokens("aged 2"), &FieldValue::Integer(22)), NO_MATCH);

    let date = FieldValue::Date(NaiveDate::from_ymd_opt(1944, 9, 22).unwrap());
    assert_eq!(field_match(&tokens("lost in 1944"), &date), EXACT_MATCH);
    assert_eq!(field_match(&tokens("1944-09-22"), &date), EXACT_MATCH);
    assert_eq!(field_match(&tokens("1943"), &date), NO_MATCH);
  }
}
