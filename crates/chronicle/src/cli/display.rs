//! Display formatting utilities for CLI output

use colored::*;

use crate::catalog::{FieldOptions, FilterOptions, Statistics};
use crate::research::roles::RoleConfig;
use crate::research::ResearchResponse;
use crate::search::tokenizer;
use crate::search::ScoredResult;

const WRAP_WIDTH: usize = 88;

/// Greedy word wrap; blank lines in the input are kept
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
  let mut lines = Vec::new();

  for paragraph in text.lines() {
    let mut line = String::new();
    for word in paragraph.split_whitespace() {
      if !line.is_empty() && line.len() + 1 + word.len() > width {
        lines.push(std::mem::take(&mut line));
      }
      if !line.is_empty() {
        line.push(' ');
      }
      line.push_str(word);
    }
    lines.push(line);
  }

  lines
}

fn is_query_word(word: &str, query_tokens: &[String]) -> bool {
  tokenizer::normalize(word)
    .iter()
    .any(|token| query_tokens.iter().any(|query| token.contains(query.as_str())))
}

/// Bold the words of `text` that contain a query token
pub fn highlight(text: &str, query_tokens: &[String]) -> String {
  text
    .split(' ')
    .map(|word| {
      if !word.is_empty() && is_query_word(word, query_tokens) {
        word.yellow().bold().to_string()
      } else {
        word.to_string()
      }
    })
    .collect::<Vec<_>>()
    .join(" ")
}

pub fn display_search_result(position: usize, scored: &ScoredResult, terms: &[String]) {
  let query_tokens = tokenizer::normalize(&terms.join(" "));

  println!(
    "{} {} {}",
    format!("{position:>3}.").dimmed(),
    scored.record.key.bold(),
    format!("(score {:.2})", scored.score).dimmed()
  );

  for name in &scored.matched_fields {
    if let Some(value) = scored.record.field(name) {
      println!("     {}: {}", name.cyan(), highlight(&value.to_string(), &query_tokens));
    }
  }
  println!();
}

/// One section per answering specialist in panel order, or the fallback narrative alone
pub fn narrative_sections(response: &ResearchResponse) -> Vec<(Option<&str>, &str)> {
  if response.used_fallback {
    return vec![(None, response.narrative.as_str())];
  }

  response
    .results
    .iter()
    .filter(|result| result.succeeded)
    .map(|result| (Some(result.label.as_str()), result.narrative.as_str()))
    .collect()
}

pub fn display_research(response: &ResearchResponse) {
  let heading = format!("Research: {} ({})", response.query, response.category);
  println!("{}", heading.bold());
  println!("{}", bentley::banner_line(heading.chars().count(), '='));
  println!();

  for (label, text) in narrative_sections(response) {
    if let Some(label) = label {
      println!("{}", label.cyan().bold());
    }
    for line in wrap_text(text, WRAP_WIDTH) {
      println!("{line}");
    }
    println!();
  }

  let source = if response.used_fallback { "fallback templates".yellow() } else { "panel".green() };
  println!(
    "{} {:.2} from {} in {}ms",
    "Confidence:".bold(),
    response.confidence,
    source,
    response.elapsed_ms
  );

  for failed in response.results.iter().filter(|result| !result.succeeded) {
    let reason = failed.failure_reason.as_deref().unwrap_or("unknown failure");
    println!("  {} {}: {}", "skipped".red(), failed.label, reason);
  }

  println!();
  for line in wrap_text(&response.memorial_context, WRAP_WIDTH) {
    println!("{}", line.italic().dimmed());
  }
}

pub fn display_role(role: &RoleConfig, is_default: bool) {
  let marker = if is_default { " (default)".green().to_string() } else { String::new() };
  println!("{} {}{}", role.role.as_str().bold(), format!("- {}", role.label).dimmed(), marker);

  for line in wrap_text(&role.expertise, WRAP_WIDTH - 4) {
    println!("    {line}");
  }

  let categories: Vec<&str> = role.categories.iter().map(|category| category.as_str()).collect();
  if !categories.is_empty() {
    println!("    {} {}", "categories:".cyan(), categories.join(", "));
  }
  if !role.keywords.is_empty() {
    println!("    {} {}", "keywords:".cyan(), role.keywords.join(", "));
  }
}

pub fn display_statistics(stats: &Statistics) {
  println!("{}", "Memorial records".bold());
  for (category, count) in &stats.counts {
    println!("  {:<10} {count}", category.to_string().cyan());
  }
  println!("  {:<10} {}", "total".bold(), stats.total);

  if let Some(age) = stats.average_age_at_death {
    println!();
    println!("{} {age:.1}", "Average age at death:".bold());
  }

  if !stats.squadrons.is_empty() {
    println!();
    println!("{}", "Squadrons".bold());
    for squadron in &stats.squadrons {
      println!(
        "  {} {}",
        squadron.squadron,
        format!("({} personnel, {} aircraft)", squadron.personnel, squadron.aircraft).dimmed()
      );
    }
  }
}

pub fn display_filter_options(options: &FilterOptions) {
  println!("{}", format!("Filters for {}", options.category).bold());

  for (field, field_options) in &options.fields {
    match field_options {
      FieldOptions::Text { values } => {
        println!("  {}", field.cyan());
        for value in values {
          println!("    {value}");
        }
      }
      FieldOptions::Integer { min, max } => println!("  {} {min}..{max}", field.cyan()),
      FieldOptions::Date { min, max } => println!("  {} {min}..{max}", field.cyan()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::records::Category;
  use crate::research::{AnalyzerResult, Role};

  #[test]
  fn test_wrap_text_respects_width() {
    let lines = wrap_text("Sergeant Patrick Cassidy flew with 97 Squadron", 20);
    assert_eq!(lines, vec!["Sergeant Patrick", "Cassidy flew with 97", "Squadron"]);
  }

  #[test]
  fn test_wrap_text_keeps_blank_lines() {
    assert_eq!(wrap_text("one\n\ntwo", 10), vec!["one", "", "two"]);
  }

  #[test]
  fn test_highlight_marks_matching_words() {
    colored::control::set_override(false);
    let tokens = tokenizer::normalize("cassidy");
    assert_eq!(highlight("Patrick Cassidy,", &tokens), "Patrick Cassidy,");
    assert!(is_query_word("Cassidy,", &tokens));
    assert!(!is_query_word("Patrick", &tokens));
  }

  fn answered(role: Role, label: &str, narrative: &str) -> AnalyzerResult {
    AnalyzerResult {
      role,
      label: label.to_string(),
      narrative: narrative.to_string(),
      confidence: 0.8,
      succeeded: true,
      failure_reason: None,
    }
  }

  fn response(
    results: Vec<AnalyzerResult>,
    narrative: &str,
    used_fallback: bool,
  ) -> ResearchResponse {
    ResearchResponse {
      query: "Patrick Cassidy".to_string(),
      category: Category::Personnel,
      narrative: narrative.to_string(),
      confidence: 0.8,
      results,
      used_fallback,
      memorial_context: String::new(),
      elapsed_ms: 0,
    }
  }

  #[test]
  fn test_sections_use_result_labels_not_narrative_markup() {
    let mut failed = answered(Role::Aircraft, "Aircraft Specialist", "");
    failed.succeeded = false;
    let results = vec![
      answered(Role::Personnel, "Personnel Specialist", "## Early life\nBorn in Dublin."),
      failed,
    ];
    let response = response(results, "merged text", false);

    let sections = narrative_sections(&response);
    assert_eq!(sections, vec![(Some("Personnel Specialist"), "## Early life\nBorn in Dublin.")]);
  }

  #[test]
  fn test_fallback_is_a_single_unlabelled_section() {
    let response = response(Vec::new(), "## not a heading", true);
    assert_eq!(narrative_sections(&response), vec![(None, "## not a heading")]);
  }
}
