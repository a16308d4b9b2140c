//! `{{path}}` template substitution over message text and button labels.

use crate::runtime::vars::{VariableStore, resolve_path};
use serde_json::Value;

/// Replaces every `{{path}}` occurrence in `text` with the value the store
/// resolves for the trimmed path. Unresolved placeholders stay verbatim,
/// braces included. Pure: the store is never mutated, so substituting
/// already-substituted text is a no-op.
pub fn substitute(text: &str, store: &VariableStore) -> String {
    replace_placeholders(text, |path| store.resolve(path).map(render_value))
}

/// Renders one dynamic-item template against its source element: first
/// `{{item.path}}` placeholders, then bare `{{path}}` placeholders, both
/// resolved inside the element.
pub fn render_item_template(template: &str, item: &Value) -> String {
    let first_pass = replace_placeholders(template, |path| {
        path.strip_prefix("item.")
            .and_then(|rest| resolve_path(item, rest))
            .map(render_value)
    });
    replace_placeholders(&first_pass, |path| {
        resolve_path(item, path).map(render_value)
    })
}

/// Renders a variable value the way it should read inside message text:
/// strings bare, integral numbers without a fractional part, objects and
/// arrays as compact JSON.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn replace_placeholders(text: &str, mut resolve: impl FnMut(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find("{{") {
        let Some(close_offset) = rest[open + 2..].find("}}") else {
            break;
        };
        let close = open + 2 + close_offset;
        result.push_str(&rest[..open]);
        let raw_path = rest[open + 2..close].trim();
        match resolve(raw_path) {
            Some(rendered) => result.push_str(&rendered),
            None => result.push_str(&rest[open..close + 2]),
        }
        rest = &rest[close + 2..];
    }
    result.push_str(rest);
    result
}
