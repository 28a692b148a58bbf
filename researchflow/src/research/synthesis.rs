//! Terminal marker for the research phase.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sections the final answer is expected to contain, in order.
pub const ANSWER_SECTIONS: [&str; 4] = ["Summary", "Key Findings", "Sources", "Limitations"];

/// Produced once research is complete; tells the planner to stop calling
/// research tools and write the final answer.
///
/// Nothing enforces the stop. It is a protocol convention between the
/// toolkit and whoever drives it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisSignal {
    /// Always true.
    pub ready: bool,
    /// Short status line.
    pub message: String,
    /// How to write the final answer.
    pub instruction: String,
}

impl SynthesisSignal {
    /// Converts to dictionary.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut dict = HashMap::new();
        dict.insert("ready".to_string(), serde_json::json!(self.ready));
        dict.insert("message".to_string(), serde_json::json!(self.message));
        dict.insert("instruction".to_string(), serde_json::json!(self.instruction));
        dict
    }
}

/// Builds `SynthesisSignal`s. Pure and infallible.
#[derive(Debug, Clone, Copy, Default)]
pub struct SynthesisGate;

impl SynthesisGate {
    /// Creates a gate.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Marks the end of research for `summary`.
    #[must_use]
    pub fn finalize(&self, summary: &str) -> SynthesisSignal {
        let summary = summary.trim();
        let topic = if summary.is_empty() {
            "the research query"
        } else {
            summary
        };

        SynthesisSignal {
            ready: true,
            message: "Research phase complete. Stop calling research tools.".to_string(),
            instruction: format!(
                "Write the final answer about {topic}. Structure it with these sections: {}. \
                 Cite only sources that were successfully fetched.",
                ANSWER_SECTIONS.join(", ")
            ),
        }
    }
}
