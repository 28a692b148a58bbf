//! The decision-making seam of a research session.
//!
//! A policy looks at the session so far and picks the next tool call. The
//! toolkit never decides anything itself; a language model, a script or a
//! heuristic can sit behind this trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::progress::AssessmentInput;
use super::session::SessionView;
use crate::tools::{ASSESS_TOOL, FETCH_TOOL, FINALIZE_TOOL, SEARCH_TOOL};

/// One decision of a policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Run a web search.
    Search {
        /// Free-text query.
        query: String,
    },
    /// Fetch a page.
    Fetch {
        /// Absolute URL.
        url: String,
    },
    /// Report progress.
    Assess(AssessmentInput),
    /// End research.
    Finalize {
        /// One-line topic summary.
        #[serde(default)]
        summary: String,
    },
    /// End the session without finalizing.
    Stop,
}

impl Action {
    /// Creates a search action.
    #[must_use]
    pub fn search(query: impl Into<String>) -> Self {
        Self::Search { query: query.into() }
    }

    /// Creates a fetch action.
    #[must_use]
    pub fn fetch(url: impl Into<String>) -> Self {
        Self::Fetch { url: url.into() }
    }

    /// Creates a finalize action.
    #[must_use]
    pub fn finalize(summary: impl Into<String>) -> Self {
        Self::Finalize { summary: summary.into() }
    }

    /// Whether this action gathers evidence (search or fetch).
    #[must_use]
    pub fn is_research(&self) -> bool {
        matches!(self, Self::Search { .. } | Self::Fetch { .. })
    }

    /// The tool name and arguments this action dispatches, or `None` for `Stop`.
    #[must_use]
    pub fn tool_call(&self) -> Option<(&'static str, serde_json::Value)> {
        match self {
            Self::Search { query } => Some((SEARCH_TOOL, serde_json::json!({ "query": query }))),
            Self::Fetch { url } => Some((FETCH_TOOL, serde_json::json!({ "url": url }))),
            Self::Assess(input) => Some((
                ASSESS_TOOL,
                serde_json::json!({
                    "ranked_sources": input.ranked_sources,
                    "key_findings": input.key_findings,
                    "critical_gaps": input.critical_gaps,
                    "readiness_level": input.readiness_level,
                }),
            )),
            Self::Finalize { summary } => {
                Some((FINALIZE_TOOL, serde_json::json!({ "summary": summary })))
            }
            Self::Stop => None,
        }
    }
}

/// Chooses the next action of a session.
#[async_trait]
pub trait ResearchPolicy: Send {
    /// Picks the next action given everything observed so far.
    async fn select_next_action(&mut self, view: &SessionView<'_>) -> Action;
}

/// Replays a fixed list of actions, then returns `Stop`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPolicy {
    actions: VecDeque<Action>,
}

impl ScriptedPolicy {
    /// Creates a policy from a script.
    #[must_use]
    pub fn new(actions: impl IntoIterator<Item = Action>) -> Self {
        Self {
            actions: actions.into_iter().collect(),
        }
    }

    /// Actions not yet replayed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.actions.len()
    }
}

#[async_trait]
impl ResearchPolicy for ScriptedPolicy {
    async fn select_next_action(&mut self, _view: &SessionView<'_>) -> Action {
        self.actions.pop_front().unwrap_or(Action::Stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tool_call_mapping() {
        let (name, args) = Action::search("rust").tool_call().unwrap();
        assert_eq!(name, "search");
        assert_eq!(args, serde_json::json!({"query": "rust"}));

        let (name, args) = Action::fetch("https://a.example/").tool_call().unwrap();
        assert_eq!(name, "fetch");
        assert_eq!(args["url"], "https://a.example/");

        let (name, args) = Action::Assess(AssessmentInput::new("sufficient").with_gap("g"))
            .tool_call()
            .unwrap();
        assert_eq!(name, "assess");
        assert_eq!(args["critical_gaps"], serde_json::json!(["g"]));

        assert_eq!(Action::finalize("x").tool_call().unwrap().0, "finalize");
        assert!(Action::Stop.tool_call().is_none());
    }

    #[test]
    fn test_is_research() {
        assert!(Action::search("q").is_research());
        assert!(Action::fetch("u").is_research());
        assert!(!Action::finalize("").is_research());
        assert!(!Action::Stop.is_research());
    }

    #[test]
    fn test_action_serde_tagged() {
        let json = serde_json::to_value(Action::search("rust")).unwrap();
        assert_eq!(json, serde_json::json!({"action": "search", "query": "rust"}));

        let parsed: Action = serde_json::from_value(serde_json::json!({
            "action": "assess",
            "readiness_level": "needs_more",
            "critical_gaps": ["x"]
        }))
        .unwrap();
        assert_eq!(parsed, Action::Assess(AssessmentInput::new("needs_more").with_gap("x")));

        let stop: Action = serde_json::from_str(r#"{"action": "stop"}"#).unwrap();
        assert_eq!(stop, Action::Stop);
    }

    #[tokio::test]
    async fn test_scripted_policy_replays_then_stops() {
        let mut policy = ScriptedPolicy::new([Action::search("a"), Action::finalize("b")]);
        let view = SessionView::empty("topic");

        assert_eq!(policy.select_next_action(&view).await, Action::search("a"));
        assert_eq!(policy.remaining(), 1);
        assert_eq!(policy.select_next_action(&view).await, Action::finalize("b"));
        assert_eq!(policy.select_next_action(&view).await, Action::Stop);
        assert_eq!(policy.select_next_action(&view).await, Action::Stop);
    }
}
