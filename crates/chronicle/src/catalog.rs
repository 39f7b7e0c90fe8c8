//! Snapshot summaries: collection statistics and the values available to structured filters

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::Config;
use crate::error::Result;
use crate::filters::Filters;
use crate::records::{Category, FieldKind, FieldValue, Record};
use crate::store::RecordStore;

/// Text fields with longer values are free text and offer no value list
const MAX_OPTION_CHARS: usize = 80;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
  pub counts: BTreeMap<Category, usize>,
  pub total: usize,
  /// Mean `age_at_death` over personnel that record it, to one decimal place
  pub average_age_at_death: Option<f64>,
  pub squadrons: Vec<SquadronBreakdown>,
}

/// Personnel and aircraft sharing one `squadron` value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadronBreakdown {
  pub squadron: String,
  pub personnel: usize,
  pub aircraft: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldOptions {
  /// Distinct values, sorted
  Text { values: Vec<String> },
  Integer { min: i64, max: i64 },
  Date { min: FieldValue, max: FieldValue },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
  pub category: Category,
  pub fields: BTreeMap<String, FieldOptions>,
}

fn everything(store: &dyn RecordStore, category: Category) -> Result<Vec<Record>> {
  store.fetch(category, &Filters::new())
}

pub fn statistics(store: &dyn RecordStore) -> Result<Statistics> {
  let mut counts = BTreeMap::new();
  for category in Category::ALL {
    counts.insert(category, everything(store, category)?.len());
  }

  let personnel = everything(store, Category::Personnel)?;
  let ages: Vec<i64> = personnel
    .iter()
    .filter_map(|record| match record.field("age_at_death") {
      Some(FieldValue::Integer(age)) => Some(*age),
      _ => None,
    })
    .collect();
  let average_age_at_death = (!ages.is_empty()).then(|| {
    let mean = ages.iter().sum::<i64>() as f64 / ages.len() as f64;
    (mean * 10.0).round() / 10.0
  });

  let mut breakdown: BTreeMap<String, (usize, usize)> = BTreeMap::new();
  for record in &personnel {
    if let Some(squadron) = record.field("squadron") {
      breakdown.entry(squadron.to_string()).or_default().0 += 1;
    }
  }
  for record in everything(store, Category::Aircraft)? {
    if let Some(squadron) = record.field("squadron") {
      breakdown.entry(squadron.to_string()).or_default().1 += 1;
    }
  }

  let mut squadrons: Vec<SquadronBreakdown> = breakdown
    .into_iter()
    .map(|(squadron, (personnel, aircraft))| SquadronBreakdown { squadron, personnel, aircraft })
    .collect();
  // BTreeMap order already ties on name
  squadrons.sort_by(|a, b| b.personnel.cmp(&a.personnel));

  Ok(Statistics { total: counts.values().sum(), counts, average_age_at_death, squadrons })
}

/// Distinct values of each short text field and the bounds of each integer and date field
pub fn filter_options(
  config: &Config,
  store: &dyn RecordStore,
  category: Category,
) -> Result<FilterOptions> {
  let table = config.category(category)?;
  let records = everything(store, category)?;
  let mut fields = BTreeMap::new();

  for (name, spec) in &table.fields {
    let values: Vec<&FieldValue> = records.iter().filter_map(|record| record.field(name)).collect();
    let options = match spec.kind {
      FieldKind::Text => {
        let distinct: BTreeSet<String> = values.iter().map(|value| value.to_string()).collect();
        if distinct.iter().any(|value| value.chars().count() > MAX_OPTION_CHARS) {
          continue;
        }
        if distinct.is_empty() {
          None
        } else {
          Some(FieldOptions::Text { values: distinct.into_iter().collect() })
        }
      }
      FieldKind::Integer => {
        let numbers: Vec<i64> = values
          .iter()
          .filter_map(|value| match value {
            FieldValue::Integer(number) => Some(*number),
            _ => None,
          })
          .collect();
        numbers
          .iter()
          .min()
          .zip(numbers.iter().max())
          .map(|(min, max)| FieldOptions::Integer { min: *min, max: *max })
      }
      FieldKind::Date => {
        let dates = values.iter().filter(|value| value.kind() == FieldKind::Date);
        let min = dates.clone().min();
        let max = dates.max();
        min
          .zip(max)
          .map(|(min, max)| FieldOptions::Date { min: (*min).clone(), max: (*max).clone() })
      }
    };

    if let Some(options) = options {
      fields.insert(name.clone(), options);
    }
  }

  Ok(FilterOptions { category, fields })
}
