//! Test assertions for tool outputs.

use crate::tools::ToolOutput;

/// Asserts that the tool call succeeded.
pub fn assert_tool_succeeded(output: &ToolOutput) {
    assert!(
        output.success,
        "Expected {} to succeed, got error: {:?}",
        output.tool, output.error
    );
}

/// Asserts that the tool call failed with the given error type.
pub fn assert_tool_failed_with(output: &ToolOutput, error_type: &str) {
    assert!(
        !output.success,
        "Expected {} to fail with {}, but it succeeded",
        output.tool, error_type
    );
    assert_eq!(
        output.error_type(),
        Some(error_type),
        "Expected error type {:?}, got {:?}",
        error_type,
        output.error
    );
}

/// Asserts that the output data contains a specific key.
pub fn assert_tool_data_contains(output: &ToolOutput, key: &str) {
    assert!(
        output.data.as_ref().and_then(|d| d.get(key)).is_some(),
        "Expected {} data to contain key '{}', got {:?}",
        output.tool,
        key,
        output.data
    );
}
