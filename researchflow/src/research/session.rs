//! Bounded research sessions.
//!
//! A session alternates between asking a policy for the next action and
//! dispatching it to the toolkit. It ends when the policy stops, when
//! `finalize` succeeds, or when the step budget runs out. Tool failures are
//! recorded and handed back to the policy; they never end a session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use super::policy::{Action, ResearchPolicy};
use super::progress::ResearchState;
use super::synthesis::SynthesisSignal;
use crate::config::SessionConfig;
use crate::observability::SpanTimer;
use crate::tools::{ResearchToolkit, ToolOutput, FETCH_TOOL};

/// One dispatched tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// 1-based step number.
    pub step: usize,
    /// What the policy asked for.
    pub action: Action,
    /// What the tool returned.
    pub output: ToolOutput,
    /// When the call started.
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: f64,
}

/// Read-only snapshot handed to the policy before each step.
#[derive(Debug, Clone, Copy)]
pub struct SessionView<'a> {
    /// The research query.
    pub query: &'a str,
    /// The step about to be taken, 1-based.
    pub step: usize,
    /// The step budget.
    pub max_steps: usize,
    /// Calls made so far.
    pub transcript: &'a [TranscriptEntry],
    /// Latest successful assessment.
    pub state: Option<&'a ResearchState>,
}

impl<'a> SessionView<'a> {
    /// A view of a session that has not taken any step.
    #[must_use]
    pub fn empty(query: &'a str) -> Self {
        Self {
            query,
            step: 1,
            max_steps: SessionConfig::default().max_steps,
            transcript: &[],
            state: None,
        }
    }

    /// The most recent call.
    #[must_use]
    pub fn last_entry(&self) -> Option<&'a TranscriptEntry> {
        self.transcript.last()
    }

    /// Steps left including the current one.
    #[must_use]
    pub fn remaining_steps(&self) -> usize {
        self.max_steps.saturating_sub(self.step - 1)
    }

    /// Whether the latest assessment advised stopping.
    #[must_use]
    pub fn stop_advised(&self) -> bool {
        self.state.is_some_and(|s| !s.should_continue)
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SessionOutcome {
    /// `finalize` succeeded.
    Finalized(SynthesisSignal),
    /// The policy returned `Stop`.
    Stopped,
    /// The step budget ran out.
    StepBudgetExhausted,
}

impl SessionOutcome {
    /// Whether the session reached synthesis.
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        matches!(self, Self::Finalized(_))
    }
}

/// Full record of a finished session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    /// Session identifier.
    pub session_id: Uuid,
    /// The research query.
    pub query: String,
    /// How the session ended.
    pub outcome: SessionOutcome,
    /// Every dispatched call, in order.
    pub transcript: Vec<TranscriptEntry>,
    /// Latest successful assessment.
    pub final_state: Option<ResearchState>,
    /// Search or fetch calls made after an assessment advised stopping.
    pub calls_after_stop_advice: usize,
    /// Start time.
    pub started_at: DateTime<Utc>,
    /// End time.
    pub finished_at: DateTime<Utc>,
}

impl SessionReport {
    /// Number of dispatched calls.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.transcript.len()
    }

    /// Number of failed calls.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.transcript.iter().filter(|e| !e.output.success).count()
    }

    /// URLs that were fetched successfully, in fetch order without repeats.
    ///
    /// These are the only sources the final answer may cite.
    #[must_use]
    pub fn fetched_sources(&self) -> Vec<&str> {
        let mut urls: Vec<&str> = Vec::new();
        for entry in &self.transcript {
            if let Action::Fetch { url } = &entry.action {
                if entry.output.tool == FETCH_TOOL
                    && entry.output.success
                    && !urls.contains(&url.as_str())
                {
                    urls.push(url);
                }
            }
        }
        urls
    }
}

/// Drives a policy against a toolkit for one query.
#[derive(Debug, Clone)]
pub struct ResearchSession {
    id: Uuid,
    query: String,
    toolkit: Arc<ResearchToolkit>,
    config: SessionConfig,
}

impl ResearchSession {
    /// Creates a session.
    #[must_use]
    pub fn new(query: impl Into<String>, toolkit: Arc<ResearchToolkit>, config: SessionConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            query: query.into(),
            toolkit,
            config,
        }
    }

    /// Session identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The research query.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Runs the session to completion.
    pub async fn run<P>(&self, policy: &mut P) -> SessionReport
    where
        P: ResearchPolicy + ?Sized,
    {
        let span = info_span!("research_session", session_id = %self.id, query = %self.query);
        self.run_inner(policy).instrument(span).await
    }

    async fn run_inner<P>(&self, policy: &mut P) -> SessionReport
    where
        P: ResearchPolicy + ?Sized,
    {
        let started_at = Utc::now();
        let mut transcript: Vec<TranscriptEntry> = Vec::new();
        let mut state: Option<ResearchState> = None;
        let mut calls_after_stop_advice = 0;
        let mut outcome = SessionOutcome::StepBudgetExhausted;

        info!(max_steps = self.config.max_steps, "session started");

        for step in 1..=self.config.max_steps {
            let (action, stop_advised) = {
                let view = SessionView {
                    query: &self.query,
                    step,
                    max_steps: self.config.max_steps,
                    transcript: &transcript,
                    state: state.as_ref(),
                };
                (policy.select_next_action(&view).await, view.stop_advised())
            };

            let Some((tool, arguments)) = action.tool_call() else {
                outcome = SessionOutcome::Stopped;
                break;
            };

            if stop_advised && action.is_research() {
                calls_after_stop_advice += 1;
                warn!(step, tool, "research call after assessment advised stopping");
            }

            let call_started = Utc::now();
            let timer = SpanTimer::start(tool);
            let output = self.toolkit.dispatch(tool, arguments).await;
            let duration_ms = timer.finish();

            let mut signal = None;
            if output.success {
                match action {
                    Action::Assess(_) => {
                        if let Some(assessed) = output.data_as::<ResearchState>() {
                            state = Some(assessed);
                        }
                    }
                    Action::Finalize { .. } => signal = output.data_as::<SynthesisSignal>(),
                    _ => {}
                }
            }

            transcript.push(TranscriptEntry {
                step,
                action,
                output,
                started_at: call_started,
                duration_ms,
            });

            if let Some(signal) = signal {
                outcome = SessionOutcome::Finalized(signal);
                break;
            }
        }

        if outcome == SessionOutcome::StepBudgetExhausted {
            warn!(steps = transcript.len(), "step budget exhausted");
        }

        let report = SessionReport {
            session_id: self.id,
            query: self.query.clone(),
            outcome,
            transcript,
            final_state: state,
            calls_after_stop_advice,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            steps = report.steps(),
            failures = report.failures(),
            finalized = report.outcome.is_finalized(),
            calls_after_stop_advice,
            "session finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResearchConfig;
    use crate::research::{AssessmentInput, ScriptedPolicy};
    use crate::testing::StaticFetcher;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    fn session(fetcher: StaticFetcher, max_steps: usize) -> ResearchSession {
        let toolkit = ResearchToolkit::new(Arc::new(fetcher), &ResearchConfig::default()).unwrap();
        ResearchSession::new(
            "what is ownership",
            Arc::new(toolkit),
            SessionConfig::default().with_max_steps(max_steps),
        )
    }

    #[tokio::test]
    async fn test_empty_script_stops_immediately() {
        let report = session(StaticFetcher::new(), 5)
            .run(&mut ScriptedPolicy::default())
            .await;

        assert_eq!(report.outcome, SessionOutcome::Stopped);
        assert_eq!(report.steps(), 0);
    }

    #[tokio::test]
    async fn test_finalize_ends_session() {
        let mut policy = ScriptedPolicy::new([
            Action::finalize("ownership"),
            Action::search("never reached"),
        ]);
        let report = session(StaticFetcher::new(), 5).run(&mut policy).await;

        assert!(report.outcome.is_finalized());
        assert_eq!(report.steps(), 1);
        assert_eq!(policy.remaining(), 1);
    }

    #[tokio::test]
    async fn test_step_budget() {
        let mut policy = ScriptedPolicy::new(
            (0..10).map(|i| Action::Assess(AssessmentInput::new("needs_more").with_gap(format!("g{i}")))),
        );
        let report = session(StaticFetcher::new(), 3).run(&mut policy).await;

        assert_eq!(report.outcome, SessionOutcome::StepBudgetExhausted);
        assert_eq!(report.steps(), 3);
        assert_eq!(report.final_state.unwrap().critical_gaps, vec!["g2"]);
    }

    #[tokio::test]
    async fn test_failures_do_not_abort() {
        let mut policy = ScriptedPolicy::new([
            Action::fetch("https://down.example/"),
            Action::fetch("not a url"),
            Action::finalize("x"),
        ]);
        let report = session(StaticFetcher::new(), 5).run(&mut policy).await;

        assert!(report.outcome.is_finalized());
        assert_eq!(report.failures(), 2);
        assert!(report.fetched_sources().is_empty());
        assert_eq!(report.transcript[0].output.error_type(), Some("NetworkError"));
        assert_eq!(report.transcript[1].output.error_type(), Some("ToolInvalidArguments"));
    }

    #[tokio::test]
    async fn test_calls_after_stop_advice_are_counted_not_blocked() {
        let fetcher = StaticFetcher::new().with_html("https://a.example/", "<p>a</p>");
        let mut policy = ScriptedPolicy::new([
            Action::Assess(AssessmentInput::new("sufficient")),
            Action::fetch("https://a.example/"),
            Action::fetch("https://a.example/"),
            Action::finalize("x"),
        ]);
        let report = session(fetcher, 10).run(&mut policy).await;

        assert_eq!(report.calls_after_stop_advice, 2);
        assert_eq!(report.failures(), 0);
        assert_eq!(report.fetched_sources(), vec!["https://a.example/"]);
    }

    struct ObservingPolicy {
        seen: Vec<(usize, usize, bool)>,
    }

    #[async_trait]
    impl ResearchPolicy for ObservingPolicy {
        async fn select_next_action(&mut self, view: &SessionView<'_>) -> Action {
            self.seen.push((view.step, view.transcript.len(), view.stop_advised()));
            match view.step {
                1 => Action::Assess(AssessmentInput::new("needs_more").with_gap("x")),
                2 => Action::Assess(AssessmentInput::new("sufficient")),
                _ => Action::Stop,
            }
        }
    }

    #[tokio::test]
    async fn test_view_reflects_latest_state() {
        let mut policy = ObservingPolicy { seen: Vec::new() };
        let report = session(StaticFetcher::new(), 10).run(&mut policy).await;

        assert_eq!(report.outcome, SessionOutcome::Stopped);
        assert_eq!(policy.seen, vec![(1, 0, false), (2, 1, false), (3, 2, true)]);
    }

    #[test]
    fn test_view_remaining_steps() {
        let view = SessionView {
            step: 4,
            max_steps: 5,
            ..SessionView::empty("q")
        };
        assert_eq!(view.remaining_steps(), 2);
        assert!(view.last_entry().is_none());
    }
}
