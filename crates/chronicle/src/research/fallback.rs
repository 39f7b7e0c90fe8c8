//! Deterministic fallback narrative, used when no analyzer succeeds

use std::fmt::Write;

use crate::config::FallbackConfig;
use crate::records::Category;

const GENERIC_TEMPLATE: &str = "The research panel is unavailable, so no specialist analysis of \
\"{query}\" could be produced. The memorial records below are the best available starting point.";

/// Canned narrative for `category`, followed by the record context when there is any.
///
/// Depends only on its inputs, so identical calls always produce identical text, and the result
/// is never empty.
pub fn narrative(
  config: &FallbackConfig,
  query: &str,
  category: Category,
  context: &[String],
) -> String {
  let template = config
    .templates
    .get(&category)
    .map(String::as_str)
    .filter(|template| !template.trim().is_empty())
    .unwrap_or(GENERIC_TEMPLATE);

  let mut text = template.replace("{query}", query.trim());

  if !context.is_empty() {
    text.push_str("\n\nMatching records:");
    for summary in context {
      let _ = write!(text, "\n- {summary}");
    }
  }

  text
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_template_is_keyed_by_category() {
    let config = FallbackConfig::default();
    let text = narrative(&config, "Lancaster JB174", Category::Aircraft, &[]);
    assert!(text.contains("\"Lancaster JB174\""));
    assert!(text.contains("AIR 27"));
    assert_eq!(text, narrative(&config, "Lancaster JB174", Category::Aircraft, &[]));
  }

  #[test]
  fn test_context_is_listed() {
    let config = FallbackConfig::default();
    let context = vec!["[aircraft JB174] aircraft_type: Avro Lancaster B.III".to_string()];
    let text = narrative(&config, "JB174", Category::Aircraft, &context);
    assert!(text.ends_with("\n- [aircraft JB174] aircraft_type: Avro Lancaster B.III"));
  }

  #[test]
  fn test_missing_template_uses_generic_text() {
    let config = FallbackConfig { templates: Default::default(), ..FallbackConfig::default() };
    let text = narrative(&config, "Chastise", Category::Mission, &[]);
    assert!(text.starts_with("The research panel is unavailable"));
    assert!(text.contains("\"Chastise\""));
  }
}
