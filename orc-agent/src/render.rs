//! Rendering a tool's JSON result to the plain text a model sees.

use serde_json::Value;

/// Render a tool's JSON result as plain text.
///
/// A single-key object (the common shape returned by primitives like
/// `read_file` — `{"content": "..."}`) is unwrapped to that one value's
/// rendering; anything else renders as its JSON (a bare string renders
/// unquoted).
pub fn render_tool_output(value: &Value) -> String {
    if let Value::Object(map) = value {
        if map.len() == 1 {
            let only = map.values().next().expect("len == 1");
            return render_scalar(only);
        }
    }
    render_scalar(value)
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
