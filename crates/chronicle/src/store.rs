//! Record Store Adapter
//!
//! The store is read-only from chronicle's point of view: it returns candidates for a category
//! that satisfy the structured filters and knows nothing about relevance.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::{CategoryConfig, Config};
use crate::error::{ChronicleError, Result};
use crate::filters::{record_passes, Filters};
use crate::records::{Category, FieldValue, Record};

const SEED_RECORDS: &str = include_str!("../data/records.json");

/// Synchronous, read-only access to records
pub trait RecordStore: Send + Sync {
  /// Records of `category` matching every filter
  fn fetch(&self, category: Category, filters: &Filters) -> Result<Vec<Record>>;
}

/// Immutable in-memory snapshot
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
  records: BTreeMap<Category, Vec<Record>>,
}

/// On-disk layout: one array of flat field maps per category
#[derive(Debug, Deserialize)]
struct RecordsFile {
  #[serde(default)]
  personnel: Vec<BTreeMap<String, FieldValue>>,
  #[serde(default)]
  aircraft: Vec<BTreeMap<String, FieldValue>>,
  #[serde(default, alias = "squadrons")]
  squadron: Vec<BTreeMap<String, FieldValue>>,
  #[serde(default, alias = "missions")]
  mission: Vec<BTreeMap<String, FieldValue>>,
}

impl MemoryStore {
  pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
    let mut grouped: BTreeMap<Category, Vec<Record>> = BTreeMap::new();
    for record in records {
      grouped.entry(record.category).or_default().push(record);
    }
    Self { records: grouped }
  }

  /// Load a JSON records file, keying each record by its category's primary-key field
  pub fn load_json<P: AsRef<Path>>(path: P, config: &Config) -> Result<Self> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
      ChronicleError::store_unavailable(format!("cannot read {}: {e}", path.display()))
    })?;

    let store = Self::parse_json(&content, &path.display().to_string(), config)?;
    tracing::debug!(path = %path.display(), records = store.len(), "loaded record snapshot");
    Ok(store)
  }

  /// The memorial dataset compiled into the binary
  pub fn seed(config: &Config) -> Result<Self> {
    Self::parse_json(SEED_RECORDS, "bundled records", config)
  }

  /// Parse a records document, checking every field against the category schema
  pub fn parse_json(content: &str, source: &str, config: &Config) -> Result<Self> {
    let file: RecordsFile = serde_json::from_str(content).map_err(|e| {
      ChronicleError::store_unavailable(format!("cannot parse {source}: {e}"))
    })?;

    let sections = [
      (Category::Personnel, file.personnel),
      (Category::Aircraft, file.aircraft),
      (Category::Squadron, file.squadron),
      (Category::Mission, file.mission),
    ];

    let mut records = Vec::new();
    for (category, entries) in sections {
      let table = config.category(category)?;
      for (index, raw) in entries.into_iter().enumerate() {
        let fields = typed_fields(table, raw).map_err(|message| {
          ChronicleError::store_unavailable(format!(
            "{category} record #{index} in {source}: {message}"
          ))
        })?;

        let primary_key = &table.primary_key;
        let key = fields.get(primary_key).map(|value| value.to_string()).ok_or_else(|| {
          ChronicleError::store_unavailable(format!(
            "{category} record #{index} in {source} has no '{primary_key}'"
          ))
        })?;
        records.push(Record { key, category, fields });
      }
    }

    Ok(Self::from_records(records))
  }

  pub fn len(&self) -> usize {
    self.records.values().map(Vec::len).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn count(&self, category: Category) -> usize {
    self.records.get(&category).map_or(0, Vec::len)
  }
}

fn typed_fields(
  table: &CategoryConfig,
  raw: BTreeMap<String, FieldValue>,
) -> std::result::Result<BTreeMap<String, FieldValue>, String> {
  let mut fields = BTreeMap::new();

  for (name, value) in raw {
    let spec = table.fields.get(&name).ok_or_else(|| format!("unknown field '{name}'"))?;
    let shown = value.to_string();
    let value = value
      .coerce(spec.kind)
      .ok_or_else(|| format!("field '{name}' expects {}, got '{shown}'", spec.kind))?;
    fields.insert(name, value);
  }

  Ok(fields)
}

impl RecordStore for MemoryStore {
  fn fetch(&self, category: Category, filters: &Filters) -> Result<Vec<Record>> {
    Ok(
      self
        .records
        .get(&category)
        .map(|records| {
          records.iter().filter(|record| record_passes(record, filters)).cloned().collect()
        })
        .unwrap_or_default(),
    )
  }
}
