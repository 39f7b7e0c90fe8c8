//! Configuration management for chronicle
//!
//! Field-weight tables, role definitions, fallback templates, and timeouts are loaded once into
//! an immutable [`Config`] and handed to the search service and orchestrator by `Arc`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ChronicleError, Result};
use crate::records::{Category, FieldKind};
use crate::research::roles::{self, Role, RoleConfig};

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Searchable schema and relevance weights per category
  pub categories: BTreeMap<Category, CategoryConfig>,
  /// Specialist panel
  pub roles: Vec<RoleConfig>,
  /// Roles consulted when no applicability predicate matches a research query
  pub default_roles: Vec<Role>,
  pub fallback: FallbackConfig,
  pub research: ResearchConfig,
  pub backend: BackendConfig,
}

/// Schema of one category as seen by the ranker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryConfig {
  /// Field holding the stable record key; also the ranking tie-break
  pub primary_key: String,
  pub fields: BTreeMap<String, FieldSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
  pub kind: FieldKind,
  #[serde(default)]
  pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
  /// Confidence reported for every fallback response
  pub confidence: f64,
  /// Canned narrative per category; `{query}` is replaced with the query text
  pub templates: BTreeMap<Category, String>,
  /// Dedication attached to every research response
  pub memorial_context: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
  /// Upper bound on each analyzer's backend call
  pub analyzer_timeout_ms: u64,
  /// Number of ranked records passed to analyzers as context
  pub context_limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
  /// Base URL of an OpenAI-compatible API
  pub base_url: String,
  pub model: String,
  pub max_tokens: u32,
  pub temperature: f32,
  /// Environment variable holding the API key
  pub api_key_env: String,
}

impl Default for ResearchConfig {
  fn default() -> Self {
    Self { analyzer_timeout_ms: 20_000, context_limit: 5 }
  }
}

impl Default for BackendConfig {
  fn default() -> Self {
    Self {
      base_url: "https://api.openai.com/v1".to_string(),
      model: "gpt-4o-mini".to_string(),
      max_tokens: 1000,
      temperature: 0.7,
      api_key_env: "OPENAI_API_KEY".to_string(),
    }
  }
}

impl Default for FallbackConfig {
  fn default() -> Self {
    let templates = [
      (
        Category::Personnel,
        "The research panel is unavailable, so no specialist analysis of \"{query}\" could be \
         produced. Service records for RAF Bomber Command aircrew are held in the AIR 79 series \
         at The National Archives; the Commonwealth War Graves Commission database lists burial \
         and memorial details along with next of kin. A service number is the most reliable \
         identifier for both.",
      ),
      (
        Category::Aircraft,
        "The research panel is unavailable, so no specialist analysis of \"{query}\" could be \
         produced. Aircraft histories can be traced through squadron Operations Record Books \
         (AIR 27) and aircraft movement cards; the serial number unlocks crew and loss details.",
      ),
      (
        Category::Squadron,
        "The research panel is unavailable, so no specialist analysis of \"{query}\" could be \
         produced. Squadron Operations Record Books (AIR 27) give the daily history of every \
         Bomber Command squadron, and the RAF Museum research team can help interpret them.",
      ),
      (
        Category::Mission,
        "The research panel is unavailable, so no specialist analysis of \"{query}\" could be \
         produced. Raid planning and outcomes are recorded in Bomber Command records (AIR 14) \
         and combat reports (AIR 50); cross-reference several sources, as official records can \
         contain errors.",
      ),
    ]
    .into_iter()
    .map(|(category, text)| (category, text.to_string()))
    .collect();

    Self {
      confidence: 0.3,
      templates,
      memorial_context: "This research honors the memory of those who served with RAF Bomber \
                         Command during the Second World War."
        .to_string(),
    }
  }
}

fn fields(specs: &[(&str, FieldKind, f64)]) -> BTreeMap<String, FieldSpec> {
  specs
    .iter()
    .map(|(name, kind, weight)| (name.to_string(), FieldSpec { kind: *kind, weight: *weight }))
    .collect()
}

fn default_categories() -> BTreeMap<Category, CategoryConfig> {
  use FieldKind::{Date, Integer, Text};

  let mut categories = BTreeMap::new();
  categories.insert(
    Category::Personnel,
    CategoryConfig {
      primary_key: "service_number".to_string(),
      fields: fields(&[
        ("service_number", Text, 5.0),
        ("name", Text, 5.0),
        ("rank", Text, 2.0),
        ("role", Text, 2.0),
        ("squadron", Text, 2.5),
        ("aircraft_type", Text, 1.5),
        ("date_of_birth", Date, 0.5),
        ("date_of_death", Date, 1.0),
        ("age_at_death", Integer, 0.5),
        ("place_of_birth", Text, 1.0),
        ("next_of_kin", Text, 0.5),
        ("memorial_location", Text, 1.0),
        ("memorial_panel", Text, 1.0),
        ("biography", Text, 1.0),
        ("awards", Text, 1.0),
        ("final_mission", Text, 1.5),
        ("base_location", Text, 1.0),
        ("mission_count", Integer, 0.5),
        ("service_start_date", Date, 0.5),
        ("service_end_date", Date, 0.5),
      ]),
    },
  );
  categories.insert(
    Category::Aircraft,
    CategoryConfig {
      primary_key: "aircraft_id".to_string(),
      fields: fields(&[
        ("aircraft_id", Text, 5.0),
        ("aircraft_type", Text, 3.0),
        ("squadron", Text, 2.5),
        ("squadron_code", Text, 2.0),
        ("service_period_start", Date, 0.5),
        ("service_period_end", Date, 0.5),
        ("service_days", Integer, 0.25),
        ("fate", Text, 1.5),
        ("notable_crew", Text, 2.0),
        ("missions_flown", Integer, 0.5),
        ("base_location", Text, 1.0),
        ("manufacturer", Text, 1.0),
        ("first_flight_date", Date, 0.5),
      ]),
    },
  );
  categories.insert(
    Category::Squadron,
    CategoryConfig {
      primary_key: "squadron_number".to_string(),
      fields: fields(&[
        ("squadron_number", Text, 5.0),
        ("squadron_name", Text, 4.0),
        ("base_location", Text, 1.5),
        ("formation_date", Date, 0.5),
        ("aircraft_types", Text, 1.5),
        ("notable_operations", Text, 2.0),
        ("country", Text, 1.0),
        ("group_number", Text, 1.0),
      ]),
    },
  );
  categories.insert(
    Category::Mission,
    CategoryConfig {
      primary_key: "mission_name".to_string(),
      fields: fields(&[
        ("mission_name", Text, 5.0),
        ("mission_date", Date, 1.0),
        ("target_location", Text, 3.0),
        ("target_country", Text, 1.5),
        ("aircraft_involved", Integer, 0.5),
        ("personnel_involved", Integer, 0.5),
        ("mission_type", Text, 1.5),
        ("outcome", Text, 1.5),
        ("casualties", Integer, 0.5),
        ("weather_conditions", Text, 0.5),
        ("commanding_officer", Text, 2.0),
      ]),
    },
  );
  categories
}

impl Default for Config {
  fn default() -> Self {
    Self {
      categories: default_categories(),
      roles: roles::default_roles(),
      default_roles: vec![Role::Personnel, Role::HistoricalContext],
      fallback: FallbackConfig::default(),
      research: ResearchConfig::default(),
      backend: BackendConfig::default(),
    }
  }
}

impl Config {
  /// Load and validate configuration from a YAML file
  pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
      .map_err(|e| ChronicleError::config(format!("cannot read {}: {e}", path.display())))?;
    let config: Config = serde_yaml::from_str(&content)
      .map_err(|e| ChronicleError::config(format!("cannot parse {}: {e}", path.display())))?;
    config.validate()?;
    Ok(config)
  }

  /// Load the first config file found in the standard locations, or defaults
  pub fn load() -> Result<Self> {
    for path in Self::search_paths() {
      if path.exists() {
        tracing::debug!(path = %path.display(), "loading configuration");
        return Self::load_from_file(path);
      }
    }

    Ok(Config::default())
  }

  /// An explicit path wins; otherwise fall back to [`Config::load`]
  pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
    match path {
      Some(path) => Self::load_from_file(path),
      None => Self::load(),
    }
  }

  fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("chronicle.yaml"), PathBuf::from(".chronicle.yaml")];
    if let Some(home) = dirs::home_dir() {
      paths.push(home.join(".chronicle").join("config.yaml"));
    }
    paths
  }

  /// Save configuration as YAML
  pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
    let content =
      serde_yaml::to_string(self).map_err(|e| ChronicleError::config(e.to_string()))?;
    std::fs::write(path, content).map_err(|e| ChronicleError::config(e.to_string()))
  }

  pub fn category(&self, category: Category) -> Result<&CategoryConfig> {
    self.categories.get(&category).ok_or_else(|| {
      ChronicleError::invalid_query(format!("category '{category}' is not searchable"))
    })
  }

  pub fn role(&self, role: Role) -> Option<&RoleConfig> {
    self.roles.iter().find(|config| config.role == role)
  }

  pub fn analyzer_timeout(&self) -> Duration {
    Duration::from_millis(self.research.analyzer_timeout_ms)
  }

  pub fn validate(&self) -> Result<()> {
    for (category, table) in &self.categories {
      match table.fields.get(&table.primary_key) {
        Some(spec) if spec.kind == FieldKind::Text => {}
        Some(_) => {
          return Err(ChronicleError::config(format!(
            "primary key '{}' of {category} must be a text field",
            table.primary_key
          )))
        }
        None => {
          return Err(ChronicleError::config(format!(
            "primary key '{}' of {category} is not a declared field",
            table.primary_key
          )))
        }
      }

      if let Some((name, _)) =
        table.fields.iter().find(|(_, spec)| !spec.weight.is_finite() || spec.weight < 0.0)
      {
        return Err(ChronicleError::config(format!("weight of {category}.{name} must be >= 0")));
      }
    }

    let mut seen = BTreeSet::new();
    for role in &self.roles {
      if !seen.insert(role.role) {
        return Err(ChronicleError::config(format!("role '{}' is configured twice", role.role)));
      }
    }

    if let Some(missing) = self.default_roles.iter().find(|role| !seen.contains(role)) {
      return Err(ChronicleError::config(format!("default role '{missing}' is not configured")));
    }

    if !(0.0..=1.0).contains(&self.fallback.confidence) {
      return Err(ChronicleError::config("fallback confidence must be within [0, 1]"));
    }

    if self.research.analyzer_timeout_ms == 0 {
      return Err(ChronicleError::config("analyzer_timeout_ms must be greater than zero"));
    }

    if self.research.context_limit == 0 {
      return Err(ChronicleError::config("context_limit must be greater than zero"));
    }

    Ok(())
  }
}
