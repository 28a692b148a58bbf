//! Configuration types for searching and fetching.
//!
//! Everything here is fixed at construction time and read-only afterwards.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Configuration for the HTTP transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: f64,
    /// Connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: f64,
    /// Maximum number of redirects to follow.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// User agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Accept header sent with every request.
    #[serde(default = "default_accept")]
    pub accept: String,
    /// Accept-Language header sent with every request.
    #[serde(default = "default_accept_language")]
    pub accept_language: String,
    /// Additional headers to include.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Retry configuration.
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_timeout() -> f64 {
    30.0
}

fn default_connect_timeout() -> f64 {
    10.0
}

fn default_max_redirects() -> usize {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; researchflow/0.1; +https://github.com/researchflow/researchflow)"
        .to_string()
}

fn default_accept() -> String {
    "text/html,application/xhtml+xml,application/xml;q=0.9,text/plain;q=0.8,*/*;q=0.5".to_string()
}

fn default_accept_language() -> String {
    "en-US,en;q=0.9".to_string()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
            accept: default_accept(),
            accept_language: default_accept_language(),
            headers: HashMap::new(),
            retry: RetryConfig::default(),
        }
    }
}

impl FetchConfig {
    /// Creates a new fetch configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Replaces the retry configuration.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Gets timeout as Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_seconds.max(0.0))
    }

    /// Gets connect timeout as Duration.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.connect_timeout_seconds.max(0.0))
    }
}

/// Retry configuration for failed requests.
///
/// Retries live in the transport only; search and extraction never retry on
/// their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first request.
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    /// Initial delay between retries in seconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_seconds: f64,
    /// Backoff multiplier.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    /// Maximum delay between retries.
    #[serde(default = "default_max_delay")]
    pub max_delay_seconds: f64,
    /// Whether to add up to 25% random jitter to each delay.
    #[serde(default = "default_jitter")]
    pub jitter: bool,
    /// Status codes that should trigger a retry.
    #[serde(default = "default_retry_status_codes")]
    pub retry_status_codes: HashSet<u16>,
    /// Whether timeouts and connection failures are retried.
    #[serde(default = "default_retry_transport_errors")]
    pub retry_transport_errors: bool,
}

fn default_max_retries() -> usize {
    2
}

fn default_retry_delay() -> f64 {
    0.5
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_max_delay() -> f64 {
    10.0
}

fn default_jitter() -> bool {
    true
}

fn default_retry_status_codes() -> HashSet<u16> {
    [429, 500, 502, 503, 504].into_iter().collect()
}

fn default_retry_transport_errors() -> bool {
    true
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_seconds: default_retry_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            max_delay_seconds: default_max_delay(),
            jitter: default_jitter(),
            retry_status_codes: default_retry_status_codes(),
            retry_transport_errors: default_retry_transport_errors(),
        }
    }
}

impl RetryConfig {
    /// A configuration that never retries.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Calculates the delay for a given attempt, without jitter.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay = self.retry_delay_seconds * self.backoff_multiplier.powi(exponent);
        let capped = delay.min(self.max_delay_seconds).max(0.0);
        Duration::from_secs_f64(capped)
    }

    /// Calculates the delay for a given attempt, adding jitter if enabled.
    #[must_use]
    pub fn jittered_delay_for_attempt(&self, attempt: usize) -> Duration {
        let base = self.delay_for_attempt(attempt);
        if self.jitter {
            base + base.mul_f64(0.25 * rand::random::<f64>())
        } else {
            base
        }
    }

    /// Whether a status code should trigger a retry.
    #[must_use]
    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_status_codes.contains(&status)
    }
}

/// Configuration for the search-engine results page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Markup-returning search endpoint.
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,
    /// Name of the free-text query parameter.
    #[serde(default = "default_query_param")]
    pub query_param: String,
    /// Maximum number of result containers considered per search.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// CSS selector for one result container.
    #[serde(default = "default_result_selector")]
    pub result_selector: String,
    /// CSS selector for the title link inside a container.
    #[serde(default = "default_title_selector")]
    pub title_selector: String,
    /// CSS selector for the snippet inside a container.
    #[serde(default = "default_snippet_selector")]
    pub snippet_selector: String,
    /// Query parameter of the engine's redirect wrapper that carries the target URL.
    #[serde(default = "default_redirect_param")]
    pub redirect_param: String,
}

fn default_search_endpoint() -> String {
    "https://html.duckduckgo.com/html/".to_string()
}

fn default_query_param() -> String {
    "q".to_string()
}

fn default_max_results() -> usize {
    5
}

fn default_result_selector() -> String {
    ".result".to_string()
}

fn default_title_selector() -> String {
    ".result__a".to_string()
}

fn default_snippet_selector() -> String {
    ".result__snippet".to_string()
}

fn default_redirect_param() -> String {
    "uddg".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            query_param: default_query_param(),
            max_results: default_max_results(),
            result_selector: default_result_selector(),
            title_selector: default_title_selector(),
            snippet_selector: default_snippet_selector(),
            redirect_param: default_redirect_param(),
        }
    }
}

impl SearchConfig {
    /// Creates a new search configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the search endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the result cap.
    #[must_use]
    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }
}

/// Configuration for turning fetched markup into plain text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// CSS selectors for elements removed before text extraction.
    #[serde(default = "default_remove_selectors")]
    pub remove_selectors: Vec<String>,
    /// Maximum number of characters kept from the extracted text.
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    /// Appended to content that was cut at `max_chars`.
    #[serde(default = "default_truncation_marker")]
    pub truncation_marker: String,
}

fn default_remove_selectors() -> Vec<String> {
    vec![
        "script".to_string(),
        "style".to_string(),
        "noscript".to_string(),
        "nav".to_string(),
        "header".to_string(),
        "footer".to_string(),
        "iframe".to_string(),
        "frame".to_string(),
        ".ad".to_string(),
        ".ads".to_string(),
        ".advert".to_string(),
        ".advertisement".to_string(),
        "[class*=\"advert\"]".to_string(),
        "[id*=\"advert\"]".to_string(),
    ]
}

fn default_max_chars() -> usize {
    3000
}

fn default_truncation_marker() -> String {
    "\n\n[Content truncated...]".to_string()
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            remove_selectors: default_remove_selectors(),
            max_chars: default_max_chars(),
            truncation_marker: default_truncation_marker(),
        }
    }
}

impl ExtractionConfig {
    /// Creates a new extraction configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a selector to remove.
    #[must_use]
    pub fn with_remove_selector(mut self, selector: impl Into<String>) -> Self {
        self.remove_selectors.push(selector.into());
        self
    }

    /// Sets the character cap.
    #[must_use]
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }
}
