//! JSON output formatting

use serde::Serialize;

/// Format any view as pretty JSON
pub fn format<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!(r#"{{"error": "Failed to serialize results: {}"}}"#, e))
}
