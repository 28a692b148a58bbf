//! Testing utilities for research sessions.
//!
//! This module provides:
//! - An in-memory `Fetcher` with canned responses
//! - Markup fixtures for search pages and articles
//! - Assertions for tool outputs

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_tool_data_contains, assert_tool_failed_with, assert_tool_succeeded};
pub use fixtures::{article_page, search_page, SearchFixture};
pub use mocks::StaticFetcher;
