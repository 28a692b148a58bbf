//! Web search and page retrieval.
//!
//! This module provides:
//! - The HTTP transport trait and its reqwest implementation
//! - Search-engine result parsing with redirect unwrapping
//! - Plain-text extraction with a fixed length cap
//! - Configuration for all of the above

mod client;
mod config;
mod extract;
mod models;
mod protocols;
mod search;

pub use client::HttpFetchClient;
pub use config::{ExtractionConfig, FetchConfig, RetryConfig, SearchConfig};
pub use extract::{normalize_whitespace, ContentExtractor};
pub use models::{truncate_chars, FetchedDocument, SearchHit, SearchResultSet};
pub use protocols::{
    FetchObserver, FetchRequest, FetchResult, Fetcher, LoggingFetchObserver, NoOpFetchObserver,
};
pub use search::{unwrap_redirect_url, SearchProvider};
