use ahash::AHashMap;
use serde_json::Value;

/// Session-scoped variable bindings with dotted-path lookup.
///
/// Top-level names map to JSON values; `resolve` walks dotted paths through
/// object fields and numeric array indices underneath them.
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    values: AHashMap<String, Value>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Resolves a dotted path like `acct.balance` or `accounts.0.name`.
    /// Returns `None` as soon as any segment fails to resolve.
    pub fn resolve(&self, path: &str) -> Option<&Value> {
        match path.split_once('.') {
            Some((first, rest)) => resolve_path(self.values.get(first)?, rest),
            None => self.values.get(path),
        }
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Walks a dotted path below an already-resolved value.
pub(crate) fn resolve_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}
