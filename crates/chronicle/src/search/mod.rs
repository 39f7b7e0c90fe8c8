//! Relevance-ranked search over structured records

pub mod ranker;
pub mod service;
pub mod tokenizer;

pub use ranker::ScoredResult;
pub use service::{SearchQuery, SearchResults, SearchService};
