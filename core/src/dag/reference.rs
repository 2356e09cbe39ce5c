//! `$.path` reference resolution against a rolling context map.

use std::collections::HashMap;

use serde_json::Value;

/// Resolves one value against `context`: strings starting with `$` are
/// treated as a dotted path (`$.a.b.c`) walked segment by segment through
/// `context`, yielding `Value::Null` on any missing segment; object and array
/// values are resolved recursively; everything else passes through unchanged.
pub fn resolve_reference(value: &Value, context: &HashMap<String, Value>) -> Value {
    match value {
        Value::String(s) => {
            if let Some(path) = s.strip_prefix('$') {
                resolve_path(path, context)
            } else {
                value.clone()
            }
        }
        Value::Object(map) => {
            let resolved = map
                .iter()
                .map(|(k, v)| (k.clone(), resolve_reference(v, context)))
                .collect();
            Value::Object(resolved)
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| resolve_reference(v, context)).collect()),
        other => other.clone(),
    }
}

fn resolve_path(path: &str, context: &HashMap<String, Value>) -> Value {
    let path = path.strip_prefix('.').unwrap_or(path);
    let mut segments = path.split('.');
    let Some(first) = segments.next() else {
        return Value::Null;
    };
    let mut current = match context.get(first) {
        Some(v) => v.clone(),
        None => return Value::Null,
    };
    for segment in segments {
        current = match current.get(segment) {
            Some(v) => v.clone(),
            None => return Value::Null,
        };
    }
    current
}
