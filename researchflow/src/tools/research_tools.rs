//! The four research tools and the toolkit that registers them.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;

use super::{Tool, ToolDefinition, ToolOutput, ToolRegistry};
use crate::config::ResearchConfig;
use crate::errors::{ResearchError, ToolError};
use crate::research::{AssessmentInput, ProgressTracker, ResearchState, SynthesisGate, SynthesisSignal};
use crate::websearch::{
    ContentExtractor, FetchedDocument, Fetcher, HttpFetchClient, SearchProvider,
    SearchResultSet,
};

/// Name of the search tool.
pub const SEARCH_TOOL: &str = "search";
/// Name of the fetch tool.
pub const FETCH_TOOL: &str = "fetch";
/// Name of the assessment tool.
pub const ASSESS_TOOL: &str = "assess";
/// Name of the finalize tool.
pub const FINALIZE_TOOL: &str = "finalize";

fn parse_args<T: DeserializeOwned>(tool: &str, arguments: serde_json::Value) -> Result<T, ResearchError> {
    serde_json::from_value(arguments)
        .map_err(|e| ToolError::invalid_arguments(tool, e.to_string()).into())
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
}

#[derive(Debug, Deserialize)]
struct FetchArgs {
    url: String,
}

#[derive(Debug, Deserialize)]
struct FinalizeArgs {
    #[serde(default)]
    summary: String,
}

/// Web search over the configured engine.
#[derive(Debug, Clone)]
pub struct SearchTool {
    provider: SearchProvider,
}

impl SearchTool {
    /// Wraps a provider.
    #[must_use]
    pub fn new(provider: SearchProvider) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(SEARCH_TOOL)
            .with_description(format!(
                "Search the web. Returns up to {} results with title, url and snippet.",
                self.provider.config().max_results
            ))
            .with_input_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Free-text search query"}
                },
                "required": ["query"]
            }))
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ResearchError> {
        let args: SearchArgs = parse_args(SEARCH_TOOL, arguments)?;
        let results = self.provider.search(&args.query).await?;
        Ok(serde_json::to_value(results)?)
    }
}

/// Page retrieval and text extraction.
#[derive(Debug, Clone)]
pub struct FetchTool {
    extractor: ContentExtractor,
}

impl FetchTool {
    /// Wraps an extractor.
    #[must_use]
    pub fn new(extractor: ContentExtractor) -> Self {
        Self { extractor }
    }
}

#[async_trait]
impl Tool for FetchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(FETCH_TOOL)
            .with_description(format!(
                "Fetch a web page and return its main text, truncated to {} characters.",
                self.extractor.config().max_chars
            ))
            .with_input_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "url": {"type": "string", "description": "Absolute http(s) URL"}
                },
                "required": ["url"]
            }))
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ResearchError> {
        let args: FetchArgs = parse_args(FETCH_TOOL, arguments)?;
        let document = self.extractor.fetch(&args.url).await?;
        Ok(serde_json::to_value(document)?)
    }
}

/// Progress assessment.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssessTool {
    tracker: ProgressTracker,
}

#[async_trait]
impl Tool for AssessTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(ASSESS_TOOL)
            .with_description(
                "Assess research progress. Report the sources reviewed, key findings, \
                 critical gaps and a readiness verdict; returns whether to continue.",
            )
            .with_input_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "ranked_sources": {"type": "array", "items": {"type": "string"}},
                    "key_findings": {"type": "array", "items": {"type": "string"}},
                    "critical_gaps": {"type": "array", "items": {"type": "string"}},
                    "readiness_level": {
                        "type": "string",
                        "description": "'sufficient' or 'needs_more'"
                    }
                },
                "required": ["readiness_level"]
            }))
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ResearchError> {
        let input: AssessmentInput = parse_args(ASSESS_TOOL, arguments)?;
        Ok(serde_json::to_value(self.tracker.assess(input))?)
    }
}

/// End-of-research marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct FinalizeTool {
    gate: SynthesisGate,
}

#[async_trait]
impl Tool for FinalizeTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(FINALIZE_TOOL)
            .with_description(
                "Finish research. Call once findings are sufficient; returns instructions \
                 for writing the final answer.",
            )
            .with_input_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "summary": {"type": "string", "description": "One-line summary of the topic"}
                }
            }))
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ResearchError> {
        let args: FinalizeArgs = parse_args(FINALIZE_TOOL, arguments)?;
        Ok(serde_json::to_value(self.gate.finalize(&args.summary))?)
    }
}

/// The research capabilities behind one shared transport.
///
/// Exposes typed methods for direct use and a `ToolRegistry` for
/// name-based dispatch. Exactly four tools are registered.
#[derive(Debug)]
pub struct ResearchToolkit {
    search: SearchProvider,
    extractor: ContentExtractor,
    tracker: ProgressTracker,
    gate: SynthesisGate,
    registry: ToolRegistry,
    max_concurrent_fetches: usize,
}

impl ResearchToolkit {
    /// Builds the toolkit over an injected transport.
    pub fn new(fetcher: Arc<dyn Fetcher>, config: &ResearchConfig) -> Result<Self, ResearchError> {
        let search = SearchProvider::new(Arc::clone(&fetcher), config.search.clone())?;
        let extractor = ContentExtractor::new(fetcher, config.extraction.clone())?;
        let tracker = ProgressTracker::new();
        let gate = SynthesisGate::new();

        let registry = ToolRegistry::new();
        registry.register(Arc::new(SearchTool::new(search.clone())));
        registry.register(Arc::new(FetchTool::new(extractor.clone())));
        registry.register(Arc::new(AssessTool { tracker }));
        registry.register(Arc::new(FinalizeTool { gate }));

        Ok(Self {
            search,
            extractor,
            tracker,
            gate,
            registry,
            max_concurrent_fetches: config.session.max_concurrent_fetches,
        })
    }

    /// Builds the toolkit over a real HTTP client.
    pub fn from_config(config: &ResearchConfig) -> Result<Self, ResearchError> {
        let client = HttpFetchClient::new(config.fetch.clone())?;
        Self::new(Arc::new(client), config)
    }

    /// The tool registry.
    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Definitions of the registered tools, for advertising to a planner.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.registry.definitions()
    }

    /// Runs a tool by name.
    pub async fn dispatch(&self, name: &str, arguments: serde_json::Value) -> ToolOutput {
        self.registry.dispatch(name, arguments).await
    }

    /// Searches the web.
    pub async fn search(&self, query: &str) -> Result<SearchResultSet, ResearchError> {
        self.search.search(query).await
    }

    /// Fetches one page.
    pub async fn fetch(&self, url: &str) -> Result<FetchedDocument, ResearchError> {
        self.extractor.fetch(url).await
    }

    /// Fetches several pages with the configured concurrency bound.
    pub async fn fetch_many(&self, urls: &[String]) -> Vec<Result<FetchedDocument, ResearchError>> {
        self.extractor.fetch_many(urls, self.max_concurrent_fetches).await
    }

    /// Assesses progress.
    #[must_use]
    pub fn assess(&self, input: AssessmentInput) -> ResearchState {
        self.tracker.assess(input)
    }

    /// Produces the synthesis signal.
    #[must_use]
    pub fn finalize(&self, summary: &str) -> SynthesisSignal {
        self.gate.finalize(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        article_page, assert_tool_data_contains, assert_tool_failed_with, assert_tool_succeeded,
        search_page, SearchFixture, StaticFetcher,
    };
    use pretty_assertions::assert_eq;

    const ENDPOINT: &str = "https://html.duckduckgo.com/html/";

    fn toolkit(fetcher: StaticFetcher) -> ResearchToolkit {
        ResearchToolkit::new(Arc::new(fetcher), &ResearchConfig::default()).unwrap()
    }

    #[test]
    fn test_exactly_four_tools() {
        let kit = toolkit(StaticFetcher::new());
        assert_eq!(
            kit.registry().list_tools(),
            vec!["assess", "fetch", "finalize", "search"]
        );
        assert_eq!(kit.definitions().len(), 4);
    }

    #[test]
    fn test_definitions_declare_required_arguments() {
        let kit = toolkit(StaticFetcher::new());
        let defs = kit.definitions();
        let required = |name: &str| {
            defs.iter()
                .find(|d| d.name == name)
                .map(|d| d.required_arguments().join(","))
                .unwrap()
        };
        assert_eq!(required("search"), "query");
        assert_eq!(required("fetch"), "url");
        assert_eq!(required("assess"), "readiness_level");
        assert_eq!(required("finalize"), "");
    }

    #[tokio::test]
    async fn test_dispatch_search() {
        let fetcher = StaticFetcher::new().with_html(
            ENDPOINT,
            search_page(&[SearchFixture::new("Tokio", "https://tokio.rs/", "Runtime")]),
        );
        let output = toolkit(fetcher)
            .dispatch("search", serde_json::json!({"query": "tokio"}))
            .await;

        assert_tool_succeeded(&output);
        let set: SearchResultSet = output.data_as().unwrap();
        assert_eq!(set.urls(), vec!["https://tokio.rs/"]);
    }

    #[tokio::test]
    async fn test_dispatch_fetch() {
        let fetcher = StaticFetcher::new()
            .with_html("https://tokio.rs/", article_page("Tokio", &["An async runtime."]));
        let output = toolkit(fetcher)
            .dispatch("fetch", serde_json::json!({"url": "https://tokio.rs/"}))
            .await;

        assert_tool_succeeded(&output);
        assert_tool_data_contains(&output, "content");
        let doc: FetchedDocument = output.data_as().unwrap();
        assert_eq!(doc.content, "An async runtime.");
    }

    #[tokio::test]
    async fn test_fetch_failure_is_structured() {
        let output = toolkit(StaticFetcher::new())
            .dispatch("fetch", serde_json::json!({"url": "https://gone.example/"}))
            .await;
        assert_tool_failed_with(&output, "NetworkError");
    }

    #[tokio::test]
    async fn test_missing_argument_is_invalid() {
        let output = toolkit(StaticFetcher::new())
            .dispatch("search", serde_json::json!({}))
            .await;
        assert_tool_failed_with(&output, "ToolInvalidArguments");
    }

    #[tokio::test]
    async fn test_dispatch_assess_and_finalize() {
        let kit = toolkit(StaticFetcher::new());

        let assess = kit
            .dispatch(
                "assess",
                serde_json::json!({"readiness_level": "needs_more", "critical_gaps": ["benchmarks"]}),
            )
            .await;
        let state: ResearchState = assess.data_as().unwrap();
        assert!(state.should_continue);

        let finalize = kit.dispatch("finalize", serde_json::json!({"summary": "tokio"})).await;
        let signal: SynthesisSignal = finalize.data_as().unwrap();
        assert!(signal.ready);
    }

    #[tokio::test]
    async fn test_typed_fetch_many() {
        let fetcher = StaticFetcher::new()
            .with_html("https://a.example/", "<p>a</p>")
            .with_html("https://b.example/", "<p>b</p>");
        let urls = vec!["https://a.example/".to_string(), "https://b.example/".to_string()];

        let docs = toolkit(fetcher).fetch_many(&urls).await;
        assert!(docs.iter().all(Result::is_ok));
    }
}
