//! CLI command implementations

use anyhow::{anyhow, Context as _, Result};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::catalog;
use crate::cli::display;
use crate::config::Config;
use crate::filters::{Constraint, Filters};
use crate::records::Category;
use crate::research::{OpenAiBackend, Orchestrator};
use crate::search::{SearchQuery, SearchService};
use crate::server::{self, AppState};
use crate::store::MemoryStore;

/// Loaded configuration plus the record snapshot every command runs against
pub struct Workspace {
  pub config: Arc<Config>,
  pub store: Arc<MemoryStore>,
}

impl Workspace {
  /// Records come from `records_path`, else `~/.chronicle/records.json` when it exists, else the
  /// bundled dataset
  pub fn load(config_path: Option<&Path>, records_path: Option<&Path>) -> Result<Self> {
    let config = Config::load_or_default(config_path)?;
    let records_path = records_path.map(Path::to_path_buf).or_else(|| {
      let default = default_records_path();
      default.is_file().then_some(default)
    });

    let store = match records_path {
      Some(path) => MemoryStore::load_json(&path, &config)?,
      None => {
        tracing::debug!("no records file found, using the bundled dataset");
        MemoryStore::seed(&config)?
      }
    };

    Ok(Self { config: Arc::new(config), store: Arc::new(store) })
  }

  pub fn search_service(&self) -> Arc<SearchService> {
    Arc::new(SearchService::new(self.config.clone(), self.store.clone()))
  }

  fn backend(&self) -> Result<OpenAiBackend> {
    OpenAiBackend::from_env(&self.config.backend, self.config.analyzer_timeout())
      .map_err(|e| anyhow!("{e}"))
  }
}

/// Default records location: `~/.chronicle/records.json`
pub fn default_records_path() -> PathBuf {
  dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".chronicle").join("records.json")
}

/// Parse `field=value` arguments against the category's schema
pub fn parse_filters(config: &Config, category: Category, raw: &[String]) -> Result<Filters> {
  let table = config.category(category)?;
  let mut filters = Filters::new();

  for argument in raw {
    let (field, value) = argument
      .split_once('=')
      .ok_or_else(|| anyhow!("filter '{argument}' must look like field=value"))?;
    let field = field.trim();
    let spec = table
      .fields
      .get(field)
      .ok_or_else(|| anyhow!("unknown field '{field}' for category {category}"))?;

    filters.insert(field.to_string(), Constraint::parse(spec.kind, value)?);
  }

  Ok(filters)
}

pub struct SearchOptions<'a> {
  pub category: Category,
  pub filters: &'a [String],
  pub offset: usize,
  pub limit: usize,
  pub json: bool,
}

pub fn search_records(
  workspace: &Workspace,
  terms: &[String],
  options: SearchOptions,
) -> Result<()> {
  let text = terms.join(" ");
  let query = SearchQuery {
    text: text.clone(),
    category: options.category,
    filters: parse_filters(&workspace.config, options.category, options.filters)?,
    offset: options.offset,
    limit: options.limit,
  };

  let results = workspace.search_service().search(&query)?;

  if options.json {
    println!("{}", serde_json::to_string_pretty(&results)?);
    return Ok(());
  }

  if results.total_count == 0 {
    bentley::warn!("No {} records matched '{}'", options.category, text);
    return Ok(());
  }

  bentley::info!(
    "{} {} record(s) found, showing {}-{}",
    results.total_count,
    options.category,
    options.offset + 1,
    options.offset + results.results.len()
  );
  for (index, scored) in results.results.iter().enumerate() {
    display::display_search_result(options.offset + index + 1, scored, terms);
  }

  Ok(())
}

pub async fn research(
  workspace: &Workspace,
  terms: &[String],
  category: Category,
  json: bool,
) -> Result<()> {
  let backend = workspace.backend()?;
  if !backend.is_configured() {
    bentley::warn!(
      "{} is not set; the research panel will answer from fallback templates",
      workspace.config.backend.api_key_env
    );
  }

  let orchestrator =
    Orchestrator::new(workspace.config.clone(), workspace.search_service(), Arc::new(backend));
  let response = orchestrator.research(&terms.join(" "), category).await?;
  if !response.used_fallback && !json {
    let answered = response.results.iter().filter(|result| result.succeeded).count();
    bentley::success!("{answered} of {} specialists answered", response.results.len());
  }

  if json {
    println!("{}", serde_json::to_string_pretty(&response)?);
  } else {
    display::display_research(&response);
  }

  Ok(())
}

pub async fn serve(workspace: &Workspace, addr: SocketAddr) -> Result<()> {
  let backend = workspace.backend()?;
  let backend_configured = backend.is_configured();
  let search = workspace.search_service();
  let orchestrator =
    Orchestrator::new(workspace.config.clone(), search.clone(), Arc::new(backend));

  let state = AppState {
    config: workspace.config.clone(),
    search,
    orchestrator: Arc::new(orchestrator),
    records: workspace.store.len(),
    backend_configured,
  };

  bentley::announce!("chronicle {} serving {} records", env!("CARGO_PKG_VERSION"), state.records);
  server::start_server(addr, state).await.context("server stopped unexpectedly")
}

pub fn statistics(workspace: &Workspace, json: bool) -> Result<()> {
  let stats = catalog::statistics(workspace.store.as_ref())?;

  if json {
    println!("{}", serde_json::to_string_pretty(&stats)?);
  } else {
    display::display_statistics(&stats);
  }

  Ok(())
}

pub fn filter_options(workspace: &Workspace, category: Category, json: bool) -> Result<()> {
  let options = catalog::filter_options(&workspace.config, workspace.store.as_ref(), category)?;

  if json {
    println!("{}", serde_json::to_string_pretty(&options)?);
  } else {
    display::display_filter_options(&options);
  }

  Ok(())
}

pub fn list_roles(config: &Config) -> Result<()> {
  let mut roles: Vec<_> = config.roles.iter().collect();
  roles.sort_by_key(|role| role.role);

  for role in roles {
    display::display_role(role, config.default_roles.contains(&role.role));
  }

  Ok(())
}
