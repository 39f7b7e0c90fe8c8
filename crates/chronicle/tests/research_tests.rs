mod common;

use chronicle::filters::Filters;
use chronicle::research::{BackendError, Orchestrator, Role};
use chronicle::search::SearchService;
use chronicle::{Category, ChronicleError, Config, Record, RecordStore};
use common::{orchestrator, orchestrator_with, Behavior, MockBackend};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

fn roles_of(response: &chronicle::research::ResearchResponse) -> Vec<Role> {
  response.results.iter().map(|result| result.role).collect()
}

#[tokio::test]
async fn test_outage_falls_back_to_templates() {
  let backend = Arc::new(MockBackend::outage());
  let orchestrator = orchestrator(backend.clone());

  let response =
    orchestrator.research("Patrick Cassidy Lancaster", Category::Personnel).await.unwrap();

  assert!(response.used_fallback);
  assert!(response.results.is_empty());
  assert_eq!(response.confidence, Config::default().fallback.confidence);
  assert!(!response.narrative.trim().is_empty());
  assert!(response.narrative.contains("Patrick Cassidy Lancaster"));
  assert!(response.narrative.contains("[personnel 1802082]"));
  assert!(backend.calls() >= 1);
}

#[tokio::test]
async fn test_fallback_is_deterministic() {
  let first = orchestrator(Arc::new(MockBackend::outage()))
    .research("Operation Chastise", Category::Mission)
    .await
    .unwrap();
  let second = orchestrator(Arc::new(MockBackend::outage()))
    .research("Operation Chastise", Category::Mission)
    .await
    .unwrap();

  assert_eq!(first.narrative, second.narrative);
  assert_eq!(first.confidence, second.confidence);
}

#[tokio::test]
async fn test_mean_of_successes_in_priority_order() {
  // Personnel finishes last but still leads the merged narrative
  let backend = Arc::new(
    MockBackend::outage()
      .with(
        "Personnel Specialist",
        Behavior::delayed("Flight engineer, 97 Sqn.", 0.4, Duration::from_millis(100)),
      )
      .with("Aircraft Specialist", Behavior::reply("Lancaster JB174, OF-S.", 0.8))
      .with("Operations Specialist", Behavior::Fail(BackendError::rate_limited("429"))),
  );
  let orchestrator = orchestrator(backend.clone());

  let response = orchestrator
    .research("Patrick Cassidy Lancaster mission", Category::Personnel)
    .await
    .unwrap();

  assert!(!response.used_fallback);
  assert!((response.confidence - 0.6).abs() < 1e-9);
  assert_eq!(roles_of(&response), vec![Role::Personnel, Role::Aircraft, Role::Operations]);
  assert_eq!(
    response.narrative,
    concat!(
      "## Personnel Specialist\nFlight engineer, 97 Sqn.\n\n",
      "## Aircraft Specialist\nLancaster JB174, OF-S."
    )
  );

  let failed = &response.results[2];
  assert!(!failed.succeeded);
  assert!(failed.failure_reason.as_deref().unwrap_or_default().contains("rate limited"));
  assert_eq!(backend.calls(), 3);
}

#[tokio::test]
async fn test_timed_out_analyzer_counts_as_failed() {
  let mut config = Config::default();
  config.research.analyzer_timeout_ms = 50;
  let backend = Arc::new(
    MockBackend::new(Behavior::reply("unused", 0.5))
      .with("Personnel Specialist", Behavior::stall())
      .with("Aircraft Specialist", Behavior::reply("Lancaster B.III", 0.7)),
  );
  let orchestrator = orchestrator_with(config, backend);

  let started = Instant::now();
  let response = orchestrator.research("Cassidy Lancaster", Category::Personnel).await.unwrap();
  assert!(started.elapsed() < Duration::from_secs(5));

  assert!(!response.used_fallback);
  assert_eq!(response.confidence, 0.7);
  let personnel = &response.results[0];
  assert_eq!(personnel.role, Role::Personnel);
  assert!(!personnel.succeeded);
  assert!(personnel.failure_reason.as_deref().unwrap_or_default().contains("timed out"));
}

#[tokio::test]
async fn test_all_analyzers_timing_out_uses_fallback() {
  let mut config = Config::default();
  config.research.analyzer_timeout_ms = 20;
  let orchestrator = orchestrator_with(config, Arc::new(MockBackend::new(Behavior::stall())));

  let response = orchestrator.research("Patrick Cassidy", Category::Personnel).await.unwrap();
  assert!(response.used_fallback);
  assert!(response.results.is_empty());
}

#[tokio::test]
async fn test_cancellation_abandons_in_flight_analyzers() {
  let orchestrator = orchestrator(Arc::new(MockBackend::new(Behavior::stall())));
  let cancel = CancellationToken::new();

  let trigger = cancel.clone();
  tokio::spawn(async move {
    tokio::time::sleep(Duration::from_millis(50)).await;
    trigger.cancel();
  });

  let outcome = tokio::time::timeout(
    Duration::from_secs(5),
    orchestrator.research_until("Patrick Cassidy", Category::Personnel, cancel),
  )
  .await
  .expect("cancelled research should return promptly");

  assert!(matches!(outcome, Err(ChronicleError::Cancelled)));
}

#[tokio::test]
async fn test_already_cancelled_token() {
  let backend = Arc::new(MockBackend::new(Behavior::reply("ok", 0.9)));
  let orchestrator = orchestrator(backend);
  let cancel = CancellationToken::new();
  cancel.cancel();

  let outcome = orchestrator.research_until("Guy Gibson", Category::Personnel, cancel).await;
  assert!(matches!(outcome, Err(ChronicleError::Cancelled)));
}

#[tokio::test]
async fn test_biography_query_skips_aircraft_role() {
  let backend = Arc::new(MockBackend::new(Behavior::reply("Born in Dublin.", 0.8)));
  let orchestrator = orchestrator(backend.clone());

  let response =
    orchestrator.research("Where was Patrick Cassidy born?", Category::Personnel).await.unwrap();

  assert_eq!(roles_of(&response), vec![Role::Personnel]);
  assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn test_default_roles_when_nothing_applies() {
  let mut config = Config::default();
  for role in &mut config.roles {
    role.categories.clear();
  }
  let backend = Arc::new(MockBackend::new(Behavior::reply("Context.", 0.5)));
  let orchestrator = orchestrator_with(config, backend.clone());

  let response = orchestrator.research("Patrick Cassidy", Category::Personnel).await.unwrap();
  assert_eq!(roles_of(&response), vec![Role::Personnel, Role::HistoricalContext]);
  assert_eq!(backend.calls(), 2);
}

#[tokio::test]
async fn test_analyzers_receive_record_context() {
  let backend = Arc::new(MockBackend::new(Behavior::reply("Noted.", 0.8)));
  let orchestrator = orchestrator(backend.clone());

  let response = orchestrator.research("JB174", Category::Aircraft).await.unwrap();
  assert_eq!(response.query, "JB174");
  assert_eq!(response.category, Category::Aircraft);
  assert!(!response.memorial_context.is_empty());

  let prompts = backend.prompts.lock().unwrap();
  assert!(!prompts.is_empty());
  assert!(prompts.iter().all(|prompt| prompt.contains("[aircraft JB174]")));
}

#[tokio::test]
async fn test_empty_query_is_invalid() {
  let backend = Arc::new(MockBackend::new(Behavior::reply("unused", 0.5)));
  let orchestrator = orchestrator(backend.clone());

  let outcome = orchestrator.research("  ?! ", Category::Personnel).await;
  assert!(matches!(outcome, Err(ChronicleError::InvalidQuery { .. })));
  assert_eq!(backend.calls(), 0);
}

struct BrokenStore;

impl RecordStore for BrokenStore {
  fn fetch(&self, _category: Category, _filters: &Filters) -> chronicle::Result<Vec<Record>> {
    Err(ChronicleError::store_unavailable("connection reset"))
  }
}

#[tokio::test]
async fn test_store_failure_is_not_masked_by_fallback() {
  let config = Arc::new(Config::default());
  let search = Arc::new(SearchService::new(config.clone(), Arc::new(BrokenStore)));
  let backend = Arc::new(MockBackend::outage());
  let orchestrator = Orchestrator::new(config, search, backend.clone());

  let outcome = orchestrator.research("Patrick Cassidy", Category::Personnel).await;
  assert!(matches!(outcome, Err(ChronicleError::StoreUnavailable { .. })));
  assert_eq!(backend.calls(), 0);
}
