//! Top-level configuration.
//!
//! Loaded from JSON (every field optional) and then optionally overridden
//! from `RESEARCHFLOW_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::errors::ResearchError;
use crate::websearch::{ExtractionConfig, FetchConfig, SearchConfig};

/// Limits for one research session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum number of policy decisions per session.
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// Concurrency bound for batch page fetches.
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
}

fn default_max_steps() -> usize {
    24
}

fn default_max_concurrent_fetches() -> usize {
    4
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
        }
    }
}

impl SessionConfig {
    /// Sets the step budget.
    #[must_use]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }
}

/// Configuration for the whole toolkit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// HTTP transport.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Search engine.
    #[serde(default)]
    pub search: SearchConfig,
    /// Text extraction.
    #[serde(default)]
    pub extraction: ExtractionConfig,
    /// Session limits.
    #[serde(default)]
    pub session: SessionConfig,
}

impl ResearchConfig {
    /// Parses a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ResearchError> {
        serde_json::from_str(json).map_err(|e| ResearchError::config(format!("invalid config: {e}")))
    }

    /// Reads a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ResearchError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ResearchError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    /// Applies overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ResearchError> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary lookup.
    ///
    /// Recognized keys: `RESEARCHFLOW_TIMEOUT_SECONDS`, `RESEARCHFLOW_MAX_RETRIES`,
    /// `RESEARCHFLOW_USER_AGENT`, `RESEARCHFLOW_SEARCH_ENDPOINT`,
    /// `RESEARCHFLOW_MAX_RESULTS`, `RESEARCHFLOW_MAX_CHARS` and `RESEARCHFLOW_MAX_STEPS`.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self, ResearchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parsed(&lookup, "RESEARCHFLOW_TIMEOUT_SECONDS")? {
            self.fetch.timeout_seconds = v;
        }
        if let Some(v) = parsed(&lookup, "RESEARCHFLOW_MAX_RETRIES")? {
            self.fetch.retry.max_retries = v;
        }
        if let Some(v) = lookup("RESEARCHFLOW_USER_AGENT") {
            self.fetch.user_agent = v;
        }
        if let Some(v) = lookup("RESEARCHFLOW_SEARCH_ENDPOINT") {
            self.search.endpoint = v;
        }
        if let Some(v) = parsed(&lookup, "RESEARCHFLOW_MAX_RESULTS")? {
            self.search.max_results = v;
        }
        if let Some(v) = parsed(&lookup, "RESEARCHFLOW_MAX_CHARS")? {
            self.extraction.max_chars = v;
        }
        if let Some(v) = parsed(&lookup, "RESEARCHFLOW_MAX_STEPS")? {
            self.session.max_steps = v;
        }
        Ok(self)
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ResearchError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| ResearchError::config(format!("{key}={raw:?}: {e}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ResearchConfig::default();
        assert_eq!(config.search.max_results, 5);
        assert_eq!(config.extraction.max_chars, 3000);
        assert_eq!(config.session.max_steps, 24);
    }

    #[test]
    fn test_from_json_partial() {
        let config = ResearchConfig::from_json_str(
            r#"{"search": {"max_results": 3}, "session": {"max_steps": 6}}"#,
        )
        .unwrap();

        assert_eq!(config.search.max_results, 3);
        assert_eq!(config.search.query_param, "q");
        assert_eq!(config.session.max_steps, 6);
        assert_eq!(config.session.max_concurrent_fetches, 4);
    }

    #[test]
    fn test_from_json_invalid() {
        let err = ResearchConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ResearchError::Config(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"extraction": {{"max_chars": 500}}}}"#).unwrap();

        let config = ResearchConfig::from_file(file.path()).unwrap();
        assert_eq!(config.extraction.max_chars, 500);
    }

    #[test]
    fn test_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ResearchConfig::from_file(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ResearchError::Config(_)));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("RESEARCHFLOW_TIMEOUT_SECONDS", "5.5"),
            ("RESEARCHFLOW_MAX_RESULTS", "8"),
            ("RESEARCHFLOW_SEARCH_ENDPOINT", "http://127.0.0.1:9/html/"),
            ("RESEARCHFLOW_MAX_STEPS", " 10 "),
        ]
        .into_iter()
        .collect();

        let config = ResearchConfig::default()
            .with_overrides_from(|k| env.get(k).map(|v| (*v).to_string()))
            .unwrap();

        assert!((config.fetch.timeout_seconds - 5.5).abs() < f64::EPSILON);
        assert_eq!(config.search.max_results, 8);
        assert_eq!(config.search.endpoint, "http://127.0.0.1:9/html/");
        assert_eq!(config.session.max_steps, 10);
        assert_eq!(config.extraction.max_chars, 3000);
    }

    #[test]
    fn test_bad_override_is_config_error() {
        let err = ResearchConfig::default()
            .with_overrides_from(|k| (k == "RESEARCHFLOW_MAX_CHARS").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(matches!(err, ResearchError::Config(ref m) if m.contains("RESEARCHFLOW_MAX_CHARS")));
    }
}
