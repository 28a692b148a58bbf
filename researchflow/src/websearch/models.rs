//! Data models for search results and fetched documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One result from a search-engine listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchHit {
    /// Result title.
    pub title: String,
    /// Direct destination URL (never the engine's redirect wrapper).
    pub url: String,
    /// Result snippet.
    #[serde(default)]
    pub snippet: String,
    /// 1-based rank, dense within one result set.
    pub rank: usize,
    /// 1-based position of the result container on the engine's page.
    pub position: usize,
}

impl SearchHit {
    /// Creates a new search hit.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        snippet: impl Into<String>,
        rank: usize,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
            rank,
            position: rank,
        }
    }

    /// Sets the container position.
    #[must_use]
    pub fn with_position(mut self, position: usize) -> Self {
        self.position = position;
        self
    }

    /// Converts to dictionary.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut dict = HashMap::new();
        dict.insert("title".to_string(), serde_json::json!(self.title));
        dict.insert("url".to_string(), serde_json::json!(self.url));
        dict.insert("snippet".to_string(), serde_json::json!(self.snippet));
        dict.insert("rank".to_string(), serde_json::json!(self.rank));
        dict
    }
}

/// Ordered hits produced by a single search call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchResultSet {
    /// The query that produced this set.
    pub query: String,
    /// Hits ordered by rank ascending.
    pub hits: Vec<SearchHit>,
    /// Number of result containers inspected (at most the configured cap).
    pub considered: usize,
    /// Containers dropped because they had no usable URL.
    pub dropped: usize,
}

impl SearchResultSet {
    /// Creates an empty result set for a query.
    #[must_use]
    pub fn empty(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Number of hits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Whether there are no hits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Destination URLs in rank order.
    #[must_use]
    pub fn urls(&self) -> Vec<&str> {
        self.hits.iter().map(|hit| hit.url.as_str()).collect()
    }

    /// Converts to dictionary.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut dict = HashMap::new();
        dict.insert("query".to_string(), serde_json::json!(self.query));
        dict.insert(
            "results".to_string(),
            serde_json::json!(self.hits.iter().map(SearchHit::to_dict).collect::<Vec<_>>()),
        );
        dict.insert("count".to_string(), serde_json::json!(self.hits.len()));
        dict
    }
}

/// Plain-text rendition of a fetched page, capped in length.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FetchedDocument {
    /// The requested URL.
    pub source_url: String,
    /// Document title, if the page had one.
    pub title: Option<String>,
    /// Extracted text, at most the configured cap plus the truncation marker.
    pub content: String,
    /// Character count of the extracted text before truncation.
    pub original_length: usize,
    /// Whether `content` was cut and carries the truncation marker.
    pub truncated: bool,
    /// When the document was fetched.
    pub fetched_at: DateTime<Utc>,
}

impl FetchedDocument {
    /// Builds a document from extracted text, truncating to `max_chars`
    /// characters and appending `marker` when cut.
    #[must_use]
    pub fn from_text(
        source_url: impl Into<String>,
        title: Option<String>,
        text: &str,
        max_chars: usize,
        marker: &str,
    ) -> Self {
        let (content, original_length, truncated) = truncate_chars(text, max_chars, marker);
        Self {
            source_url: source_url.into(),
            title,
            content,
            original_length,
            truncated,
            fetched_at: Utc::now(),
        }
    }

    /// Character count of the returned content.
    #[must_use]
    pub fn content_length(&self) -> usize {
        self.content.chars().count()
    }

    /// Converts to dictionary.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut dict = HashMap::new();
        dict.insert("url".to_string(), serde_json::json!(self.source_url));
        if let Some(ref title) = self.title {
            dict.insert("title".to_string(), serde_json::json!(title));
        }
        dict.insert("content".to_string(), serde_json::json!(self.content));
        dict.insert("length".to_string(), serde_json::json!(self.original_length));
        dict.insert("truncated".to_string(), serde_json::json!(self.truncated));
        dict
    }
}

/// Cuts `text` to at most `max_chars` characters.
///
/// Returns the content, the original character count and whether the marker
/// was appended. Counting is by `char`, so multi-byte text is never split
/// inside a code point.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize, marker: &str) -> (String, usize, bool) {
    let original_length = text.chars().count();
    if original_length <= max_chars {
        return (text.to_string(), original_length, false);
    }

    let cut = text
        .char_indices()
        .nth(max_chars)
        .map_or(text.len(), |(idx, _)| idx);
    let mut content = String::with_capacity(cut + marker.len());
    content.push_str(&text[..cut]);
    content.push_str(marker);
    (content, original_length, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MARKER: &str = "\n\n[Content truncated...]";

    #[test]
    fn test_short_text_is_untouched() {
        let (content, len, truncated) = truncate_chars("hello world", 3000, MARKER);
        assert_eq!(content, "hello world");
        assert_eq!(len, 11);
        assert!(!truncated);
    }

    #[test]
    fn test_exact_cap_is_untouched() {
        let text = "a".repeat(3000);
        let (content, len, truncated) = truncate_chars(&text, 3000, MARKER);
        assert_eq!(content.len(), 3000);
        assert_eq!(len, 3000);
        assert!(!truncated);
        assert!(!content.ends_with(MARKER));
    }

    #[test]
    fn test_long_text_is_cut_with_marker() {
        let text = "b".repeat(4500);
        let (content, len, truncated) = truncate_chars(&text, 3000, MARKER);
        assert!(truncated);
        assert_eq!(len, 4500);
        assert_eq!(content, format!("{}{MARKER}", "b".repeat(3000)));
    }

    #[test]
    fn test_truncation_counts_chars_not_bytes() {
        let text = "é".repeat(10);
        let (content, len, truncated) = truncate_chars(&text, 4, "…");
        assert_eq!(len, 10);
        assert!(truncated);
        assert_eq!(content, "éééé…");
    }

    #[test]
    fn test_empty_document() {
        let doc = FetchedDocument::from_text("https://example.com", None, "", 3000, MARKER);
        assert_eq!(doc.content, "");
        assert_eq!(doc.original_length, 0);
        assert!(!doc.truncated);
    }

    #[test]
    fn test_document_length_bound() {
        let text = "x".repeat(10_000);
        let doc = FetchedDocument::from_text("https://example.com", None, &text, 3000, MARKER);
        assert!(doc.content_length() <= 3000 + MARKER.chars().count());
        assert_eq!(doc.original_length, 10_000);
    }

    #[test]
    fn test_result_set_to_dict() {
        let set = SearchResultSet {
            query: "rust".to_string(),
            hits: vec![SearchHit::new("Rust", "https://www.rust-lang.org/", "A language", 1)],
            considered: 1,
            dropped: 0,
        };

        let dict = set.to_dict();
        assert_eq!(dict.get("count"), Some(&serde_json::json!(1)));
        assert_eq!(set.urls(), vec!["https://www.rust-lang.org/"]);
    }
}
