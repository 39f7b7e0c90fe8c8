//! Chronicle: relevance-ranked search and multi-role research over RAF Bomber Command memorial
//! records.
//!
//! [`search::SearchService`] ranks records of one category against free text and structured
//! filters. [`research::Orchestrator`] consults that service for record context and fans the
//! query out to a panel of specialist analyzers backed by a [`research::ReasoningBackend`].

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod filters;
pub mod records;
pub mod research;
pub mod search;
pub mod server;
pub mod store;

pub use config::Config;
pub use error::{ChronicleError, Result};
pub use records::{Category, FieldKind, FieldValue, Record};
pub use store::{MemoryStore, RecordStore};
