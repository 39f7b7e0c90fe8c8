#![allow(dead_code)]

use async_trait::async_trait;
use chronicle::research::{
  BackendError, Generation, GenerationRequest, Orchestrator, ReasoningBackend,
};
use chronicle::search::SearchService;
use chronicle::{Category, Config, MemoryStore, Record, RecordStore};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How the mock backend answers one role
#[derive(Clone)]
pub enum Behavior {
  Reply { text: String, confidence: Option<f64>, delay: Duration },
  Fail(BackendError),
}

impl Behavior {
  pub fn reply(text: &str, confidence: f64) -> Self {
    Behavior::Reply { text: text.to_string(), confidence: Some(confidence), delay: Duration::ZERO }
  }

  pub fn delayed(text: &str, confidence: f64, delay: Duration) -> Self {
    Behavior::Reply { text: text.to_string(), confidence: Some(confidence), delay }
  }

  /// Answers long after any sensible timeout
  pub fn stall() -> Self {
    Self::delayed("arrived too late", 1.0, Duration::from_secs(30))
  }

  pub fn unavailable() -> Self {
    Behavior::Fail(BackendError::unavailable("connection refused"))
  }
}

/// Mock reasoning backend scripted per role label
pub struct MockBackend {
  /// (role label, behaviour); the label is matched against the rendered instruction
  pub script: Vec<(String, Behavior)>,
  pub default: Behavior,
  pub call_count: AtomicUsize,
  pub prompts: Mutex<Vec<String>>,
}

impl MockBackend {
  pub fn new(default: Behavior) -> Self {
    Self {
      script: Vec::new(),
      default,
      call_count: AtomicUsize::new(0),
      prompts: Mutex::new(Vec::new()),
    }
  }

  /// Backend that fails every call, as during an outage
  pub fn outage() -> Self {
    Self::new(Behavior::unavailable())
  }

  pub fn with(mut self, label: &str, behavior: Behavior) -> Self {
    self.script.push((label.to_string(), behavior));
    self
  }

  pub fn calls(&self) -> usize {
    self.call_count.load(Ordering::SeqCst)
  }

  fn behavior_for(&self, instruction: &str) -> Behavior {
    self
      .script
      .iter()
      .find(|(label, _)| instruction.contains(&format!("You are the {label}")))
      .map(|(_, behavior)| behavior.clone())
      .unwrap_or_else(|| self.default.clone())
  }
}

#[async_trait]
impl ReasoningBackend for MockBackend {
  async fn generate(&self, request: &GenerationRequest) -> Result<Generation, BackendError> {
    self.call_count.fetch_add(1, Ordering::SeqCst);
    self.prompts.lock().unwrap().push(request.prompt.clone());

    match self.behavior_for(&request.instruction) {
      Behavior::Reply { text, confidence, delay } => {
        if !delay.is_zero() {
          tokio::time::sleep(delay).await;
        }
        Ok(Generation { text, confidence })
      }
      Behavior::Fail(error) => Err(error),
    }
  }
}

pub fn records_path() -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data").join("records.json")
}

/// The bundled memorial dataset
pub fn seed_store() -> MemoryStore {
  MemoryStore::load_json(records_path(), &Config::default()).expect("seed records load")
}

pub fn person(service_number: &str, name: &str) -> Record {
  Record::new(Category::Personnel, service_number)
    .with_field("service_number", service_number)
    .with_field("name", name)
}

pub fn aircraft(serial: &str, aircraft_type: &str, squadron: &str) -> Record {
  Record::new(Category::Aircraft, serial)
    .with_field("aircraft_id", serial)
    .with_field("aircraft_type", aircraft_type)
    .with_field("squadron", squadron)
}

pub fn search_service(store: impl RecordStore + 'static) -> Arc<SearchService> {
  Arc::new(SearchService::new(Arc::new(Config::default()), Arc::new(store)))
}

pub fn orchestrator_with(config: Config, backend: Arc<MockBackend>) -> Orchestrator {
  let config = Arc::new(config);
  let search = Arc::new(SearchService::new(config.clone(), Arc::new(seed_store())));
  Orchestrator::new(config, search, backend)
}

pub fn orchestrator(backend: Arc<MockBackend>) -> Orchestrator {
  orchestrator_with(Config::default(), backend)
}
