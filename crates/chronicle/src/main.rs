use anyhow::Result;
use chronicle::cli::commands::{self, SearchOptions, Workspace};
use chronicle::{Category, Config};
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chronicle")]
#[command(
  about = "Chronicle - RAF Bomber Command memorial research\nRanked record search and multi-specialist research narratives"
)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
  #[command(flatten)]
  sources: Sources,

  #[command(subcommand)]
  command: Command,
}

/// Where configuration and records come from
#[derive(Args)]
struct Sources {
  /// Configuration file (defaults to ./chronicle.yaml or ~/.chronicle/config.yaml)
  #[arg(long, global = true, env = "CHRONICLE_CONFIG")]
  config: Option<PathBuf>,
  /// Records JSON file (defaults to ~/.chronicle/records.json, then the bundled dataset)
  #[arg(long, global = true, env = "CHRONICLE_RECORDS")]
  records: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
  /// Search records of one category by relevance
  Search {
    /// Search terms (space-separated)
    terms: Vec<String>,
    /// Record category: personnel, aircraft, squadron or mission
    #[arg(short, long, default_value = "personnel")]
    category: Category,
    /// Structured filter: field=value, field=a|b, field=min..max or field=~text
    #[arg(short, long = "filter")]
    filters: Vec<String>,
    /// Number of ranked results to skip
    #[arg(long, default_value = "0")]
    offset: usize,
    /// Maximum number of results to show
    #[arg(short, long, default_value = "20")]
    limit: usize,
    /// Print results as JSON
    #[arg(long)]
    json: bool,
  },
  /// Ask the specialist panel a research question
  Research {
    /// Research question
    #[arg(required = true)]
    query: Vec<String>,
    /// Record category the question is about
    #[arg(short, long, default_value = "personnel")]
    category: Category,
    /// Print the response as JSON
    #[arg(long)]
    json: bool,
  },
  /// Serve the REST API
  Serve {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: SocketAddr,
  },
  /// Record counts, average age at death and squadron breakdown
  Statistics {
    /// Print as JSON
    #[arg(long)]
    json: bool,
  },
  /// Values and bounds available to --filter for a category
  Filters {
    #[arg(short, long, default_value = "personnel")]
    category: Category,
    /// Print as JSON
    #[arg(long)]
    json: bool,
  },
  /// List the configured specialist roles
  Roles,
}

async fn handle(sources: Sources, command: Command) -> Result<()> {
  let workspace = || Workspace::load(sources.config.as_deref(), sources.records.as_deref());

  match command {
    Command::Search { terms, category, filters, offset, limit, json } => {
      let options = SearchOptions { category, filters: &filters, offset, limit, json };
      commands::search_records(&workspace()?, &terms, options)
    }
    Command::Research { query, category, json } => {
      commands::research(&workspace()?, &query, category, json).await
    }
    Command::Serve { addr } => commands::serve(&workspace()?, addr).await,
    Command::Statistics { json } => commands::statistics(&workspace()?, json),
    Command::Filters { category, json } => commands::filter_options(&workspace()?, category, json),
    Command::Roles => commands::list_roles(&Config::load_or_default(sources.config.as_deref())?),
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  bentley::init_tracing("chronicle=info");
  let cli = Cli::parse();

  if let Err(e) = handle(cli.sources, cli.command).await {
    bentley::error!("{e:#}");
    std::process::exit(1);
  }

  Ok(())
}
