//! Protocol traits for the HTTP transport.
//!
//! The transport is injected into every component that does I/O, so tests can
//! substitute a fake implementation.

use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::errors::ResearchError;

/// An outbound GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Target URL without query string additions.
    pub url: String,
    /// Query parameters appended to the URL.
    pub query: Vec<(String, String)>,
}

impl FetchRequest {
    /// Creates a request for a URL.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
        }
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// Result of a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// HTTP status code.
    pub status_code: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body as text.
    pub text: String,
    /// Final URL after redirects.
    pub final_url: String,
    /// Content type from headers.
    pub content_type: Option<String>,
    /// Time taken to fetch in milliseconds.
    pub duration_ms: f64,
}

impl FetchResult {
    /// Creates a 200 response with an HTML body.
    #[must_use]
    pub fn html(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            headers: HashMap::new(),
            text: body.into(),
            final_url: url.into(),
            content_type: Some("text/html; charset=utf-8".to_string()),
            duration_ms: 0.0,
        }
    }

    /// Whether the response is HTML.
    #[must_use]
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_ref()
            .is_some_and(|ct| ct.contains("text/html") || ct.contains("application/xhtml"))
    }

    /// Whether the body can be treated as markup or text.
    ///
    /// A missing content type is assumed to be markup.
    #[must_use]
    pub fn is_markup(&self) -> bool {
        self.content_type.as_deref().map_or(true, |ct| {
            let ct = ct.to_ascii_lowercase();
            ct.starts_with("text/") || ct.contains("html") || ct.contains("xml")
        })
    }

    /// Whether the body is plain text rather than markup.
    #[must_use]
    pub fn is_plain_text(&self) -> bool {
        self.content_type
            .as_ref()
            .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("text/plain"))
    }

    /// Whether the fetch was successful (2xx status).
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Protocol for HTTP fetching.
///
/// Implementations must be safe to call concurrently. Non-success statuses,
/// timeouts and unreachable hosts are reported as `ResearchError::Network`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Performs a GET request.
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResult, ResearchError>;
}

/// Observability callbacks for fetch operations.
pub trait FetchObserver: Send + Sync {
    /// Called when a fetch starts.
    fn on_fetch_start(&self, url: &str, request_id: &str);

    /// Called when a fetch completes.
    fn on_fetch_complete(&self, url: &str, request_id: &str, duration_ms: f64, status_code: u16);

    /// Called before a retry is scheduled.
    fn on_fetch_retry(&self, url: &str, request_id: &str, attempt: usize, reason: &str);

    /// Called when a fetch fails for good.
    fn on_fetch_error(&self, url: &str, request_id: &str, error: &str);
}

/// No-op implementation of `FetchObserver`.
#[derive(Debug, Clone, Default)]
pub struct NoOpFetchObserver;

impl FetchObserver for NoOpFetchObserver {
    fn on_fetch_start(&self, _url: &str, _request_id: &str) {}
    fn on_fetch_complete(&self, _url: &str, _request_id: &str, _duration_ms: f64, _status_code: u16) {}
    fn on_fetch_retry(&self, _url: &str, _request_id: &str, _attempt: usize, _reason: &str) {}
    fn on_fetch_error(&self, _url: &str, _request_id: &str, _error: &str) {}
}

/// Observer that reports fetch lifecycle events through `tracing`.
#[derive(Debug, Clone, Default)]
pub struct LoggingFetchObserver;

impl FetchObserver for LoggingFetchObserver {
    fn on_fetch_start(&self, url: &str, request_id: &str) {
        debug!(url = %url, request_id = %request_id, "fetch started");
    }

    fn on_fetch_complete(&self, url: &str, request_id: &str, duration_ms: f64, status_code: u16) {
        debug!(
            url = %url,
            request_id = %request_id,
            duration_ms,
            status_code,
            "fetch completed"
        );
    }

    fn on_fetch_retry(&self, url: &str, request_id: &str, attempt: usize, reason: &str) {
        debug!(url = %url, request_id = %request_id, attempt, reason = %reason, "fetch retrying");
    }

    fn on_fetch_error(&self, url: &str, request_id: &str, error: &str) {
        warn!(url = %url, request_id = %request_id, error = %error, "fetch failed");
    }
}
