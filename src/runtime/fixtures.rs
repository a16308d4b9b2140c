use crate::error::DocumentError;
use ahash::AHashMap;
use log::warn;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Resolves simulated API responses for the session interpreter.
///
/// Implementations answer by exact URL or by fixture file name and return
/// `None` when nothing matches. A miss is routed to the screen's declared
/// error path by the interpreter; it is never raised as an error.
pub trait FixtureProvider {
    /// Looks up a canned response for an exact URL.
    fn by_url(&self, url: &str) -> Option<Value>;

    /// Loads a canned response by fixture file name.
    fn by_file(&self, name: &str) -> Option<Value>;
}

/// Fixture table backed by an exact-URL map and an optional base directory
/// for file-backed lookups.
#[derive(Debug, Clone, Default)]
pub struct FixtureSet {
    responses: AHashMap<String, Value>,
    base_dir: Option<PathBuf>,
}

impl FixtureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a canned response for an exact URL.
    pub fn insert(&mut self, url: &str, response: Value) {
        self.responses.insert(url.to_string(), response);
    }

    pub fn with_response(mut self, url: &str, response: Value) -> Self {
        self.insert(url, response);
        self
    }

    /// Sets the directory that `mock_file` names resolve against.
    pub fn with_base_dir(mut self, dir: &str) -> Self {
        self.base_dir = Some(PathBuf::from(dir));
        self
    }

    /// Loads a fixture table from a JSON file whose top level maps URLs to
    /// response values. The file's directory becomes the base for
    /// file-backed lookups.
    pub fn from_file(path: &str) -> Result<Self, DocumentError> {
        let json = std::fs::read_to_string(path).map_err(|e| DocumentError::FileRead {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        let responses: AHashMap<String, Value> = serde_json::from_str(&json)
            .map_err(|e| DocumentError::JsonParseError(e.to_string()))?;
        let base_dir = Path::new(path).parent().map(Path::to_path_buf);
        Ok(Self {
            responses,
            base_dir,
        })
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

impl FixtureProvider for FixtureSet {
    fn by_url(&self, url: &str) -> Option<Value> {
        self.responses.get(url).cloned()
    }

    fn by_file(&self, name: &str) -> Option<Value> {
        let path = match &self.base_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        };
        let json = match std::fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) => {
                warn!("Fixture file '{}' could not be read: {}", path.display(), e);
                return None;
            }
        };
        match serde_json::from_str(&json) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Fixture file '{}' is not valid JSON: {}", path.display(), e);
                None
            }
        }
    }
}
