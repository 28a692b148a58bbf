//! Tools subsystem.
//!
//! This module provides:
//! - Tool definitions and structured outputs
//! - An explicit name-based registry
//! - The research tools: search, fetch, assess and finalize

mod definitions;
mod registry;
mod research_tools;

pub use definitions::{ToolDefinition, ToolOutput};
pub use registry::{ResolvedToolCall, Tool, ToolRegistry, UnresolvedToolCall};
pub use research_tools::{
    AssessTool, FetchTool, FinalizeTool, ResearchToolkit, SearchTool, ASSESS_TOOL, FETCH_TOOL,
    FINALIZE_TOOL, SEARCH_TOOL,
};
