//! Record data model
//!
//! Records are immutable snapshots owned by the record store. The search and research code only
//! ever reads them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ChronicleError;

const SUMMARY_VALUE_CHARS: usize = 200;

/// The four record kinds a query can be scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
  Personnel,
  Aircraft,
  Squadron,
  Mission,
}

impl Category {
  pub const ALL: [Category; 4] =
    [Category::Personnel, Category::Aircraft, Category::Squadron, Category::Mission];

  pub fn as_str(&self) -> &'static str {
    match self {
      Category::Personnel => "personnel",
      Category::Aircraft => "aircraft",
      Category::Squadron => "squadron",
      Category::Mission => "mission",
    }
  }
}

impl fmt::Display for Category {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Category {
  type Err = ChronicleError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "personnel" | "person" | "people" => Ok(Category::Personnel),
      "aircraft" => Ok(Category::Aircraft),
      "squadron" | "squadrons" => Ok(Category::Squadron),
      "mission" | "missions" => Ok(Category::Mission),
      other => Err(ChronicleError::invalid_query(format!("unrecognized category '{other}'"))),
    }
  }
}

/// Declared type of a record field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
  Text,
  Integer,
  Date,
}

impl FieldKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      FieldKind::Text => "text",
      FieldKind::Integer => "integer",
      FieldKind::Date => "date",
    }
  }
}

impl fmt::Display for FieldKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A single typed field value.
///
/// Deserializes untagged: JSON numbers become `Integer`, `YYYY-MM-DD` strings become `Date`,
/// every other string is `Text`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
  Integer(i64),
  Date(NaiveDate),
  Text(String),
}

impl FieldValue {
  pub fn kind(&self) -> FieldKind {
    match self {
      FieldValue::Integer(_) => FieldKind::Integer,
      FieldValue::Date(_) => FieldKind::Date,
      FieldValue::Text(_) => FieldKind::Text,
    }
  }

  pub fn as_text(&self) -> Option<&str> {
    match self {
      FieldValue::Text(text) => Some(text),
      _ => None,
    }
  }

  /// Parse a raw string (CLI or query-string input) as a value of the given kind
  pub fn parse_as(kind: FieldKind, raw: &str) -> Result<Self, ChronicleError> {
    let raw = raw.trim();
    match kind {
      FieldKind::Text => Ok(FieldValue::Text(raw.to_string())),
      FieldKind::Integer => raw
        .parse::<i64>()
        .map(FieldValue::Integer)
        .map_err(|_| ChronicleError::invalid_query(format!("'{raw}' is not an integer"))),
      FieldKind::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(FieldValue::Date)
        .map_err(|_| ChronicleError::invalid_query(format!("'{raw}' is not a YYYY-MM-DD date"))),
    }
  }

  /// Convert a deserialized value to the declared kind of its field.
  ///
  /// Anything renders as text, and text is reparsed as an integer or date. Integers and dates
  /// never convert into each other.
  pub fn coerce(self, kind: FieldKind) -> Option<Self> {
    match (self, kind) {
      (value, kind) if value.kind() == kind => Some(value),
      (value, FieldKind::Text) => Some(FieldValue::Text(value.to_string())),
      (FieldValue::Text(raw), kind) => FieldValue::parse_as(kind, &raw).ok(),
      _ => None,
    }
  }
}

impl fmt::Display for FieldValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FieldValue::Integer(value) => write!(f, "{value}"),
      FieldValue::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
      FieldValue::Text(text) => f.write_str(text),
    }
  }
}

impl From<&str> for FieldValue {
  fn from(value: &str) -> Self {
    FieldValue::Text(value.to_string())
  }
}

impl From<i64> for FieldValue {
  fn from(value: i64) -> Self {
    FieldValue::Integer(value)
  }
}

impl From<NaiveDate> for FieldValue {
  fn from(value: NaiveDate) -> Self {
    FieldValue::Date(value)
  }
}

/// A structured historical record identified by a stable primary key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
  pub key: String,
  pub category: Category,
  pub fields: BTreeMap<String, FieldValue>,
}

impl Record {
  pub fn new(category: Category, key: impl Into<String>) -> Self {
    Self { key: key.into(), category, fields: BTreeMap::new() }
  }

  pub fn with_field(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
    self.fields.insert(name.to_string(), value.into());
    self
  }

  pub fn field(&self, name: &str) -> Option<&FieldValue> {
    self.fields.get(name)
  }

  /// One-line description handed to analyzers as record context
  pub fn summary(&self) -> String {
    let fields = self
      .fields
      .iter()
      .map(|(name, value)| format!("{name}: {}", truncate(&value.to_string(), SUMMARY_VALUE_CHARS)))
      .collect::<Vec<_>>()
      .join("; ");

    format!("[{} {}] {fields}", self.category, self.key)
  }
}

fn truncate(text: &str, max_chars: usize) -> String {
  match text.char_indices().nth(max_chars) {
    Some((cut, _)) => format!("{}...", &text[..cut]),
    None => text.to_string(),
  }
}
