//! Multi-role research panel over the record search service

pub mod analyzer;
pub mod backend;
pub mod fallback;
pub mod orchestrator;
pub mod roles;

pub use analyzer::{AnalyzerRequest, AnalyzerResult};
pub use backend::{BackendError, Generation, GenerationRequest, OpenAiBackend, ReasoningBackend};
pub use orchestrator::{Orchestrator, ResearchResponse};
pub use roles::{Role, RoleConfig};
