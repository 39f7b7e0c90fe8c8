//! Specialist role definitions
//!
//! The five roles are data, not code: each one is an identifier plus an applicability predicate
//! and an instruction template, all run through the same generic analyzer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ChronicleError;
use crate::records::Category;
use crate::search::tokenizer;

/// Specialist perspectives, declared in merge priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
  Personnel,
  Aircraft,
  Operations,
  HistoricalContext,
  Statistical,
}

impl Role {
  pub const PRIORITY: [Role; 5] =
    [Role::Personnel, Role::Aircraft, Role::Operations, Role::HistoricalContext, Role::Statistical];

  pub fn as_str(&self) -> &'static str {
    match self {
      Role::Personnel => "personnel",
      Role::Aircraft => "aircraft",
      Role::Operations => "operations",
      Role::HistoricalContext => "historical-context",
      Role::Statistical => "statistical",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = ChronicleError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Role::PRIORITY
      .into_iter()
      .find(|role| role.as_str() == s.trim().to_lowercase())
      .ok_or_else(|| ChronicleError::invalid_query(format!("unknown role '{s}'")))
  }
}

/// Configuration for one specialist role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleConfig {
  pub role: Role,
  /// Heading used for this role in merged narratives
  pub label: String,
  /// Area of expertise, interpolated into the instruction and the prompt
  pub expertise: String,
  /// System instruction sent to the reasoning backend; `{label}` and `{expertise}` are filled in
  pub instruction: String,
  /// Categories for which the role always applies
  #[serde(default)]
  pub categories: Vec<Category>,
  /// Query words that make the role apply regardless of category
  #[serde(default)]
  pub keywords: Vec<String>,
}

impl RoleConfig {
  /// Applicability predicate: category membership, or a keyword among the query tokens
  pub fn applies_to(&self, category: Category, query_tokens: &[String]) -> bool {
    if self.categories.contains(&category) {
      return true;
    }

    self.keywords.iter().any(|keyword| {
      let keyword = tokenizer::normalize(keyword);
      !keyword.is_empty() && keyword.iter().all(|word| query_tokens.contains(word))
    })
  }

  pub fn render_instruction(&self) -> String {
    self.instruction.replace("{label}", &self.label).replace("{expertise}", &self.expertise)
  }
}

const MEMORIAL_INSTRUCTION: &str = "You are the {label}, specializing in {expertise} for RAF \
Bomber Command research.\n\nProvide detailed, historically accurate analysis while keeping the \
respectful tone appropriate for a memorial database. Focus on factual information, historical \
context, and the human stories behind the records. Only rely on the record context you are \
given and say so when the records are silent.\n\nThis is a memorial to those who served and \
gave their lives. Maintain dignity and respect in every response.";

fn role(
  role: Role,
  label: &str,
  expertise: &str,
  categories: &[Category],
  keywords: &[&str],
) -> RoleConfig {
  RoleConfig {
    role,
    label: label.to_string(),
    expertise: expertise.to_string(),
    instruction: MEMORIAL_INSTRUCTION.to_string(),
    categories: categories.to_vec(),
    keywords: keywords.iter().map(|k| k.to_string()).collect(),
  }
}

/// The stock five-role panel
pub fn default_roles() -> Vec<RoleConfig> {
  vec![
    role(
      Role::Personnel,
      "Personnel Specialist",
      "biographical research, service records, and personal histories of RAF personnel",
      &[Category::Personnel],
      &["personnel", "crew", "service", "airman", "pilot", "navigator", "engineer", "gunner"],
    ),
    role(
      Role::Aircraft,
      "Aircraft Specialist",
      "aircraft technical specifications, service history, and operational capabilities",
      &[Category::Aircraft],
      &["aircraft", "lancaster", "halifax", "bomber", "serial"],
    ),
    role(
      Role::Operations,
      "Operations Specialist",
      "mission analysis, tactical operations, and combat effectiveness",
      &[Category::Mission],
      &["mission", "operation", "raid", "combat", "pathfinder", "pathfinders", "target"],
    ),
    role(
      Role::HistoricalContext,
      "Historical Context Specialist",
      "strategic analysis, historical significance, and broader wartime context",
      &[Category::Squadron],
      &["history", "historical", "context", "war", "strategic", "campaign"],
    ),
    role(
      Role::Statistical,
      "Statistical Analyst",
      "data analysis, statistical patterns, and quantitative research",
      &[],
      &["statistics", "statistical", "data", "analysis", "numbers", "average", "count"],
    ),
  ]
}

#[cfg(test)]
mod tests {
  use super::*;

  fn tokens(text: &str) -> Vec<String> {
    tokenizer::normalize(text)
  }

  #[test]
  fn test_priority_order_matches_ord() {
    let mut shuffled = vec![Role::Statistical, Role::Personnel, Role::HistoricalContext];
    shuffled.sort();
    assert_eq!(shuffled, vec![Role::Personnel, Role::HistoricalContext, Role::Statistical]);
  }

  #[test]
  fn test_role_round_trips_through_str() {
    for role in Role::PRIORITY {
      assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
    }
    assert!("navigator".parse::<Role>().is_err());
  }

  #[test]
  fn test_aircraft_role_skipped_for_pure_biography_query() {
    let roles = default_roles();
    let aircraft = roles.iter().find(|r| r.role == Role::Aircraft).unwrap();
    let personnel = roles.iter().find(|r| r.role == Role::Personnel).unwrap();

    let query = tokens("Where was Patrick Cassidy born?");
    assert!(!aircraft.applies_to(Category::Personnel, &query));
    assert!(personnel.applies_to(Category::Personnel, &query));
  }

  #[test]
  fn test_keyword_applies_across_categories() {
    let roles = default_roles();
    let aircraft = roles.iter().find(|r| r.role == Role::Aircraft).unwrap();
    assert!(aircraft.applies_to(Category::Personnel, &tokens("Which Lancaster did he fly?")));
  }

  #[test]
  fn test_instruction_interpolation() {
    let roles = default_roles();
    let rendered = roles[0].render_instruction();
    assert!(rendered.starts_with("You are the Personnel Specialist"));
    assert!(!rendered.contains("{expertise}"));
  }
}
