//! # Researchflow
//!
//! Building blocks for bounded, tool-calling research sessions.
//!
//! An external policy (a language model, a script or a person) drives a
//! session by calling four tools:
//!
//! - **search**: query a web search engine and get ranked, unwrapped results
//! - **fetch**: retrieve a page and reduce it to capped plain text
//! - **assess**: report progress and get a continue/stop decision
//! - **finalize**: end the research phase and get answer-writing instructions
//!
//! The HTTP transport is injected, so every component can run against a
//! fake web in tests.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use researchflow::prelude::*;
//! use std::sync::Arc;
//!
//! let config = ResearchConfig::default().with_env_overrides()?;
//! let toolkit = Arc::new(ResearchToolkit::from_config(&config)?);
//! let session = ResearchSession::new("what is ownership", toolkit, config.session.clone());
//!
//! let mut policy = ScriptedPolicy::new([
//!     Action::search("rust ownership"),
//!     Action::finalize("Rust ownership"),
//! ]);
//! let report = session.run(&mut policy).await;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod errors;
pub mod observability;
pub mod research;
pub mod testing;
pub mod tools;
pub mod websearch;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{ResearchConfig, SessionConfig};
    pub use crate::errors::{NetworkError, ParseError, ResearchError, ToolError};
    pub use crate::observability::init_tracing;
    pub use crate::research::{
        Action, AssessmentInput, ProgressTracker, Readiness, ResearchPolicy, ResearchSession,
        ResearchState, ScriptedPolicy, SessionOutcome, SessionReport, SessionView,
        SynthesisGate, SynthesisSignal,
    };
    pub use crate::tools::{ResearchToolkit, Tool, ToolDefinition, ToolOutput, ToolRegistry};
    pub use crate::websearch::{
        ContentExtractor, FetchConfig, FetchedDocument, Fetcher, HttpFetchClient, SearchHit,
        SearchProvider, SearchResultSet,
    };
}
