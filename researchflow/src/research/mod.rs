//! Research progress, synthesis gating and session driving.
//!
//! This module provides:
//! - Progress assessment with a continue/stop decision
//! - The synthesis signal that ends the research phase
//! - The policy seam and a bounded session driver

mod policy;
mod progress;
mod session;
mod synthesis;


pub use policy::{Action, ResearchPolicy, ScriptedPolicy};
pub use progress::{
    AssessmentInput, ProgressTracker, Readiness, ResearchState, MAX_GAPS_IN_RECOMMENDATION,
};
pub use session::{
    ResearchSession, SessionOutcome, SessionReport, SessionView, TranscriptEntry,
};
pub use synthesis::{SynthesisGate, SynthesisSignal, ANSWER_SECTIONS};
