//! Structured field constraints
//!
//! Filters are hard predicates: a record that fails any one of them is out, whatever its text
//! score. Multiple filters combine with AND.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ChronicleError, Result};
use crate::records::{FieldKind, FieldValue, Record};

/// Field name to constraint. Ordered so that validation errors are reported deterministically.
pub type Filters = BTreeMap<String, Constraint>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
  /// Equality; case-insensitive for text
  Exact(FieldValue),
  /// Membership in a fixed set of values
  OneOf(Vec<FieldValue>),
  /// Inclusive bounds on an integer or date field
  Range {
    #[serde(default)]
    min: Option<FieldValue>,
    #[serde(default)]
    max: Option<FieldValue>,
  },
  /// Case-insensitive substring of a text field
  Contains(String),
}

impl Constraint {
  /// Check the constraint is meaningful for a field of `kind`
  pub fn validate(&self, field: &str, kind: FieldKind) -> Result<()> {
    let mismatch = |value: &FieldValue| {
      ChronicleError::invalid_query(format!(
        "filter on '{field}' expects a {kind:?} value, got {:?}",
        value.kind()
      ))
    };

    match self {
      Constraint::Exact(value) if value.kind() != kind => Err(mismatch(value)),
      Constraint::Exact(_) => Ok(()),
      Constraint::OneOf(values) if values.is_empty() => {
        Err(ChronicleError::invalid_query(format!("filter on '{field}' has an empty value set")))
      }
      Constraint::OneOf(values) => match values.iter().find(|value| value.kind() != kind) {
        Some(value) => Err(mismatch(value)),
        None => Ok(()),
      },
      Constraint::Range { .. } if kind == FieldKind::Text => Err(ChronicleError::invalid_query(
        format!("range filter is not supported on text field '{field}'"),
      )),
      Constraint::Range { min, max } => {
        for bound in [min, max].into_iter().flatten() {
          if bound.kind() != kind {
            return Err(mismatch(bound));
          }
        }
        match (min, max) {
          (Some(min), Some(max)) if min > max => Err(ChronicleError::invalid_query(format!(
            "range filter on '{field}' has min {min} above max {max}"
          ))),
          _ => Ok(()),
        }
      }
      Constraint::Contains(_) if kind != FieldKind::Text => Err(ChronicleError::invalid_query(
        format!("contains filter is only supported on text fields, '{field}' is {kind:?}"),
      )),
      Constraint::Contains(_) => Ok(()),
    }
  }

  pub fn matches(&self, value: &FieldValue) -> bool {
    match self {
      Constraint::Exact(expected) => values_equal(expected, value),
      Constraint::OneOf(expected) => {
        expected.iter().any(|candidate| values_equal(candidate, value))
      }
      Constraint::Range { min, max } => {
        let above_min = min.as_ref().map_or(true, |min| min.kind() == value.kind() && value >= min);
        let below_max = max.as_ref().map_or(true, |max| max.kind() == value.kind() && value <= max);
        above_min && below_max
      }
      Constraint::Contains(needle) => {
        value.as_text().is_some_and(|text| text.to_lowercase().contains(&needle.to_lowercase()))
      }
    }
  }

  /// Parse the compact CLI form for a field of `kind`.
  ///
  /// `a|b|c` is a value set, `min..max` a range (either side may be empty), `~text` a substring
  /// match, anything else an exact value.
  pub fn parse(kind: FieldKind, raw: &str) -> Result<Self> {
    if let Some(needle) = raw.strip_prefix('~') {
      return Ok(Constraint::Contains(needle.trim().to_string()));
    }

    if kind != FieldKind::Text {
      if let Some((min, max)) = raw.split_once("..") {
        let bound = |raw: &str| -> Result<Option<FieldValue>> {
          match raw.trim() {
            "" => Ok(None),
            value => FieldValue::parse_as(kind, value).map(Some),
          }
        };
        return Ok(Constraint::Range { min: bound(min)?, max: bound(max)? });
      }
    }

    if raw.contains('|') {
      let values =
        raw.split('|').map(|value| FieldValue::parse_as(kind, value)).collect::<Result<_>>()?;
      return Ok(Constraint::OneOf(values));
    }

    FieldValue::parse_as(kind, raw).map(Constraint::Exact)
  }
}

fn values_equal(expected: &FieldValue, actual: &FieldValue) -> bool {
  match (expected, actual) {
    (FieldValue::Text(expected), FieldValue::Text(actual)) => {
      expected.trim().eq_ignore_ascii_case(actual.trim())
    }
    _ => expected == actual,
  }
}

/// AND across all filters; a record missing a filtered field fails that filter
pub fn record_passes(record: &Record, filters: &Filters) -> bool {
  filters.iter().all(|(field, constraint)| {
    record.field(field).is_some_and(|value| constraint.matches(value))
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::records::Category;
  use chrono::NaiveDate;

  fn date(y: i32, m: u32, d: u32) -> FieldValue {
    FieldValue::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
  }

  #[test]
  fn test_exact_text_is_case_insensitive() {
    let constraint = Constraint::Exact("97 squadron".into());
    assert!(constraint.matches(&"97 Squadron".into()));
    assert!(!constraint.matches(&"97 Squadron RAF Pathfinders".into()));
  }

  #[test]
  fn test_range_is_inclusive() {
    let constraint =
      Constraint::Range { min: Some(FieldValue::Integer(20)), max: Some(FieldValue::Integer(22)) };
    assert!(constraint.matches(&FieldValue::Integer(20)));
    assert!(constraint.matches(&FieldValue::Integer(22)));
    assert!(!constraint.matches(&FieldValue::Integer(23)));

    let open = Constraint::Range { min: Some(date(1944, 1, 1)), max: None };
    assert!(open.matches(&date(1944, 9, 22)));
    assert!(!open.matches(&date(1943, 11, 18)));
  }

  #[test]
  fn test_validation_rejects_kind_mismatches() {
    assert!(Constraint::Exact(FieldValue::Integer(22)).validate("name", FieldKind::Text).is_err());
    assert!(Constraint::Range { min: None, max: None }.validate("name", FieldKind::Text).is_err());
    assert!(Constraint::Contains("x".into()).validate("age", FieldKind::Integer).is_err());
    assert!(Constraint::OneOf(vec![]).validate("rank", FieldKind::Text).is_err());
    let inverted =
      Constraint::Range { min: Some(FieldValue::Integer(30)), max: Some(FieldValue::Integer(20)) };
    assert!(inverted.validate("age", FieldKind::Integer).is_err());
    assert!(Constraint::OneOf(vec!["Sergeant".into(), "Pilot Officer".into()])
      .validate("rank", FieldKind::Text)
      .is_ok());
  }

  #[test]
  fn test_parse_compact_forms() {
    assert_eq!(
      Constraint::parse(FieldKind::Integer, "20..25").unwrap(),
      Constraint::Range { min: Some(FieldValue::Integer(20)), max: Some(FieldValue::Integer(25)) }
    );
    assert_eq!(
      Constraint::parse(FieldKind::Date, "..1944-01-01").unwrap(),
      Constraint::Range { min: None, max: Some(date(1944, 1, 1)) }
    );
    assert_eq!(
      Constraint::parse(FieldKind::Text, "Sergeant|Pilot").unwrap(),
      Constraint::OneOf(vec!["Sergeant".into(), "Pilot".into()])
    );
    assert_eq!(
      Constraint::parse(FieldKind::Text, "~pathfinders").unwrap(),
      Constraint::Contains("pathfinders".to_string())
    );
    assert!(Constraint::parse(FieldKind::Integer, "lots").is_err());
  }

  #[test]
  fn test_record_missing_field_fails_filter() {
    let record = Record::new(Category::Aircraft, "JB174").with_field("aircraft_type", "Lancaster");
    let mut filters = Filters::new();
    filters.insert("squadron".to_string(), Constraint::Exact("97 Squadron".into()));
    assert!(!record_passes(&record, &filters));
    assert!(record_passes(&record, &Filters::new()));
  }
}
