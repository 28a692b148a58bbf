//! Search-engine result page retrieval and parsing.

use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use tracing::{debug, info};

use super::config::SearchConfig;
use super::models::{SearchHit, SearchResultSet};
use super::protocols::{FetchRequest, Fetcher};
use crate::errors::{ParseError, ResearchError, ToolError};

/// Issues search queries and turns the result listing into ranked hits.
#[derive(Clone)]
pub struct SearchProvider {
    fetcher: Arc<dyn Fetcher>,
    config: SearchConfig,
    selectors: Arc<ResultSelectors>,
}

/// Compiled selectors for one result page layout.
#[derive(Debug)]
struct ResultSelectors {
    container: Selector,
    title: Selector,
    snippet: Selector,
}

impl ResultSelectors {
    fn compile(config: &SearchConfig) -> Result<Self, ResearchError> {
        Ok(Self {
            container: compile_selector(&config.result_selector)?,
            title: compile_selector(&config.title_selector)?,
            snippet: compile_selector(&config.snippet_selector)?,
        })
    }
}

pub(crate) fn compile_selector(selector: &str) -> Result<Selector, ResearchError> {
    Selector::parse(selector)
        .map_err(|e| ResearchError::config(format!("invalid CSS selector '{selector}': {e}")))
}

impl SearchProvider {
    /// Creates a provider over an injected transport.
    pub fn new(fetcher: Arc<dyn Fetcher>, config: SearchConfig) -> Result<Self, ResearchError> {
        let selectors = ResultSelectors::compile(&config)?;
        Ok(Self {
            fetcher,
            config,
            selectors: Arc::new(selectors),
        })
    }

    /// Gets the configuration.
    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Runs a query against the search endpoint.
    ///
    /// A parseable page without results yields an empty set, not an error.
    pub async fn search(&self, query: &str) -> Result<SearchResultSet, ResearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ToolError::invalid_arguments("search", "query must not be empty").into());
        }

        let request = FetchRequest::get(&self.config.endpoint)
            .with_query(&self.config.query_param, query);
        let response = self.fetcher.fetch(request).await?;

        if !response.is_markup() {
            return Err(ParseError::new(
                &self.config.endpoint,
                format!(
                    "search endpoint returned non-markup content ({})",
                    response.content_type.as_deref().unwrap_or("unknown")
                ),
            )
            .into());
        }

        let results = self.parse_results(query, &response.text);
        info!(
            query = %query,
            hits = results.len(),
            dropped = results.dropped,
            "search completed"
        );
        Ok(results)
    }

    /// Parses a result page.
    ///
    /// The cap applies to the containers inspected, before containers with an
    /// empty destination URL are dropped. Ranks are dense over the surviving
    /// hits; `position` keeps each hit's container index.
    #[must_use]
    pub fn parse_results(&self, query: &str, html: &str) -> SearchResultSet {
        let document = Html::parse_document(html);
        let mut set = SearchResultSet::empty(query);

        for (index, container) in document
            .select(&self.selectors.container)
            .take(self.config.max_results)
            .enumerate()
        {
            set.considered += 1;

            let title_el = container.select(&self.selectors.title).next();
            let href = title_el
                .and_then(|el| el.value().attr("href"))
                .unwrap_or_default();
            let url = unwrap_redirect_url(href, &self.config.redirect_param);

            if url.is_empty() {
                debug!(position = index + 1, "dropping result without destination URL");
                set.dropped += 1;
                continue;
            }

            let title = title_el.map(element_text).unwrap_or_default();
            let snippet = container
                .select(&self.selectors.snippet)
                .next()
                .map(element_text)
                .unwrap_or_default();

            let rank = set.hits.len() + 1;
            set.hits
                .push(SearchHit::new(title, url, snippet, rank).with_position(index + 1));
        }

        set
    }
}

impl std::fmt::Debug for SearchProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchProvider")
            .field("endpoint", &self.config.endpoint)
            .field("max_results", &self.config.max_results)
            .finish()
    }
}

/// Joins an element's text nodes with single spaces.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Removes a search engine's redirect wrapper from a result link.
///
/// Takes the value of `param`, cuts it at the next `&`, and percent-decodes
/// it. Links without the parameter are returned unchanged, so applying this
/// to a direct URL is a no-op.
#[must_use]
pub fn unwrap_redirect_url(href: &str, param: &str) -> String {
    let href = href.trim();
    let Some(start) = find_param_value(href, param) else {
        return href.to_string();
    };

    let rest = &href[start..];
    let encoded = rest.find('&').map_or(rest, |end| &rest[..end]);
    let decoded = urlencoding::decode(encoded)
        .map_or_else(|_| encoded.to_string(), std::borrow::Cow::into_owned);

    if let Some(stripped) = decoded.strip_prefix("//") {
        format!("https://{stripped}")
    } else {
        decoded
    }
}

/// Byte offset of `param`'s value, only when `param` is a whole parameter name.
fn find_param_value(href: &str, param: &str) -> Option<usize> {
    if param.is_empty() {
        return None;
    }
    let needle = format!("{param}=");
    let mut from = 0;
    while let Some(offset) = href[from..].find(&needle) {
        let at = from + offset;
        let boundary = at == 0 || matches!(href.as_bytes()[at - 1], b'?' | b'&' | b';');
        if boundary {
            return Some(at + needle.len());
        }
        from = at + needle.len();
    }
    None
}
