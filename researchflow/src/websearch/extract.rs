//! Page fetching and plain-text extraction.

use futures::stream::{self, StreamExt};
use scraper::{Html, Selector};
use std::sync::Arc;
use tracing::info;

use super::config::ExtractionConfig;
use super::models::FetchedDocument;
use super::protocols::{FetchRequest, Fetcher};
use super::search::{compile_selector, element_text};
use crate::errors::{ParseError, ResearchError, ToolError};

/// Fetches pages and reduces them to bounded plain text.
#[derive(Clone)]
pub struct ContentExtractor {
    fetcher: Arc<dyn Fetcher>,
    config: ExtractionConfig,
    remove: Arc<Vec<Selector>>,
    body: Arc<Selector>,
    title: Arc<Selector>,
}

impl ContentExtractor {
    /// Creates an extractor over an injected transport.
    pub fn new(fetcher: Arc<dyn Fetcher>, config: ExtractionConfig) -> Result<Self, ResearchError> {
        let remove = config
            .remove_selectors
            .iter()
            .map(|s| compile_selector(s))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            fetcher,
            config,
            remove: Arc::new(remove),
            body: Arc::new(compile_selector("body")?),
            title: Arc::new(compile_selector("title")?),
        })
    }

    /// Gets the configuration.
    #[must_use]
    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Fetches a URL and returns its text content, capped at the configured length.
    ///
    /// An empty body yields a document with empty content.
    pub async fn fetch(&self, url: &str) -> Result<FetchedDocument, ResearchError> {
        let url = url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ToolError::invalid_arguments(
                "fetch",
                format!("expected an absolute http(s) URL, got '{url}'"),
            )
            .into());
        }

        let response = self.fetcher.fetch(FetchRequest::get(url)).await?;

        if !response.is_markup() {
            return Err(ParseError::new(
                url,
                format!(
                    "unsupported content type {}",
                    response.content_type.as_deref().unwrap_or("unknown")
                ),
            )
            .into());
        }

        let (title, text) = if response.is_plain_text() {
            (None, normalize_whitespace(&response.text))
        } else {
            self.extract_text(&response.text)
        };

        let document = FetchedDocument::from_text(
            url,
            title,
            &text,
            self.config.max_chars,
            &self.config.truncation_marker,
        );
        info!(
            url = %url,
            original_length = document.original_length,
            truncated = document.truncated,
            "page fetched"
        );
        Ok(document)
    }

    /// Fetches several URLs with bounded concurrency.
    ///
    /// Results come back in input order, one per URL.
    pub async fn fetch_many(
        &self,
        urls: &[String],
        max_concurrent: usize,
    ) -> Vec<Result<FetchedDocument, ResearchError>> {
        stream::iter(urls.iter().map(|url| self.fetch(url)))
            .buffered(max_concurrent.max(1))
            .collect()
            .await
    }

    /// Strips non-content elements and returns the page title and body text.
    #[must_use]
    pub fn extract_text(&self, html: &str) -> (Option<String>, String) {
        let mut document = Html::parse_document(html);

        let title = document
            .select(&self.title)
            .next()
            .map(element_text)
            .filter(|t| !t.is_empty());

        let doomed: Vec<_> = self
            .remove
            .iter()
            .flat_map(|selector| document.select(selector).map(|el| el.id()).collect::<Vec<_>>())
            .collect();
        for id in doomed {
            if let Some(mut node) = document.tree.get_mut(id) {
                node.detach();
            }
        }

        let text = match document.select(&self.body).next() {
            Some(body) => element_text(body),
            None => element_text(document.root_element()),
        };

        (title, text)
    }
}

impl std::fmt::Debug for ContentExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentExtractor")
            .field("max_chars", &self.config.max_chars)
            .field("remove_selectors", &self.config.remove_selectors.len())
            .finish()
    }
}

/// Collapses runs of whitespace to single spaces.
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticFetcher;
    use crate::websearch::protocols::FetchResult;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title> Ownership  explained </title><style>body { color: red; }</style></head>
<body>
  <header>Site header</header>
  <nav><a href="/">Home</a></nav>
  <script>var tracking = 1;</script>
  <article>
    <h1>Ownership</h1>
    <p>Each value has   a single owner.</p>
    <div class="advertisement">Buy now</div>
    <p>Borrowing lends access.</p>
  </article>
  <iframe src="https://ads.example/"></iframe>
  <footer>Copyright</footer>
</body>
</html>"#;

    fn extractor(fetcher: StaticFetcher) -> ContentExtractor {
        ContentExtractor::new(Arc::new(fetcher), ExtractionConfig::default()).unwrap()
    }

    #[test]
    fn test_extract_strips_non_content() {
        let (title, text) = extractor(StaticFetcher::new()).extract_text(PAGE);

        assert_eq!(title.as_deref(), Some("Ownership explained"));
        assert_eq!(
            text,
            "Ownership Each value has a single owner. Borrowing lends access."
        );
    }

    #[test]
    fn test_extract_malformed_markup() {
        let (_, text) = extractor(StaticFetcher::new())
            .extract_text("<div><p>unclosed <b>bold<p>next</div></span>");
        assert_eq!(text, "unclosed bold next");
    }

    #[tokio::test]
    async fn test_fetch_short_document() {
        let fetcher = StaticFetcher::new().with_html("https://example.com/a", PAGE);
        let doc = extractor(fetcher).fetch("https://example.com/a").await.unwrap();

        assert!(!doc.truncated);
        assert_eq!(doc.original_length, doc.content.chars().count());
        assert_eq!(doc.source_url, "https://example.com/a");
    }

    #[tokio::test]
    async fn test_fetch_truncates_long_document() {
        let body = format!("<html><body><p>{}</p></body></html>", "word ".repeat(2000));
        let fetcher = StaticFetcher::new().with_html("https://example.com/long", body);
        let doc = extractor(fetcher).fetch("https://example.com/long").await.unwrap();

        let marker = ExtractionConfig::default().truncation_marker;
        assert!(doc.truncated);
        assert_eq!(doc.original_length, 2000 * 5 - 1);
        assert!(doc.content.ends_with(&marker));
        assert_eq!(doc.content.chars().count(), 3000 + marker.chars().count());
    }

    #[tokio::test]
    async fn test_fetch_empty_body() {
        let fetcher = StaticFetcher::new().with_html("https://example.com/empty", "");
        let doc = extractor(fetcher).fetch("https://example.com/empty").await.unwrap();

        assert_eq!(doc.content, "");
        assert_eq!(doc.original_length, 0);
    }

    #[tokio::test]
    async fn test_fetch_plain_text() {
        let fetcher = StaticFetcher::new().with_response(
            "https://example.com/notes.txt",
            FetchResult {
                content_type: Some("text/plain".to_string()),
                ..FetchResult::html("https://example.com/notes.txt", "line one\n\n<b>line</b> two")
            },
        );
        let doc = extractor(fetcher).fetch("https://example.com/notes.txt").await.unwrap();
        assert_eq!(doc.content, "line one <b>line</b> two");
        assert_eq!(doc.title, None);
    }

    #[tokio::test]
    async fn test_fetch_unknown_url_is_network_error() {
        let err = extractor(StaticFetcher::new())
            .fetch("https://missing.example/")
            .await
            .unwrap_err();
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_fetch_binary_is_parse_error() {
        let fetcher = StaticFetcher::new().with_response(
            "https://example.com/paper.pdf",
            FetchResult {
                content_type: Some("application/pdf".to_string()),
                ..FetchResult::html("https://example.com/paper.pdf", "%PDF-1.7")
            },
        );
        let err = extractor(fetcher).fetch("https://example.com/paper.pdf").await.unwrap_err();
        assert!(err.is_parse());
    }

    #[tokio::test]
    async fn test_fetch_rejects_relative_url() {
        let err = extractor(StaticFetcher::new()).fetch("/relative").await.unwrap_err();
        assert!(matches!(err, ResearchError::Tool(ToolError::InvalidArguments { .. })));
    }

    #[tokio::test]
    async fn test_fetch_many_preserves_order() {
        let fetcher = StaticFetcher::new()
            .with_html("https://a.example/", "<p>alpha</p>")
            .with_html("https://c.example/", "<p>gamma</p>");
        let urls = vec![
            "https://a.example/".to_string(),
            "https://b.example/".to_string(),
            "https://c.example/".to_string(),
        ];

        let results = extractor(fetcher).fetch_many(&urls, 2).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().content, "alpha");
        assert!(results[1].as_ref().unwrap_err().is_network());
        assert_eq!(results[2].as_ref().unwrap().content, "gamma");
    }
}
