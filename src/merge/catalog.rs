use crate::document::FlowDocument;
use crate::error::MergeError;
use crate::merge::SubFlow;
use log::warn;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// One template entry in a catalog file. `label` and `entry_screen` also
/// accept their older spellings `name` and `start_screen`.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    #[serde(alias = "name")]
    pub label: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_entry_screen", alias = "start_screen")]
    pub entry_screen: String,
    pub file: String,
}

fn default_category() -> String {
    "getting_started".to_string()
}

fn default_entry_screen() -> String {
    "start".to_string()
}

#[derive(Debug, Deserialize)]
struct CatalogManifest {
    templates: Vec<CatalogEntry>,
}

/// A library of mergeable sub-flow templates and their metadata.
///
/// The catalog file is a JSON object with a `templates` array; template file
/// paths resolve relative to the catalog file's directory. Metadata is
/// trusted verbatim; the documents themselves still pass through
/// classification when loaded.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    entries: Vec<CatalogEntry>,
    base_dir: PathBuf,
}

impl TemplateCatalog {
    pub fn new(entries: Vec<CatalogEntry>, base_dir: &str) -> Self {
        Self {
            entries,
            base_dir: PathBuf::from(base_dir),
        }
    }

    /// Loads a catalog description from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, MergeError> {
        let json = std::fs::read_to_string(path).map_err(|e| MergeError::TemplateLoad {
            template: path.to_string(),
            message: e.to_string(),
        })?;
        let manifest: CatalogManifest =
            serde_json::from_str(&json).map_err(|e| MergeError::TemplateLoad {
                template: path.to_string(),
                message: e.to_string(),
            })?;
        let base_dir = Path::new(path)
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        Ok(Self {
            entries: manifest.templates,
            base_dir,
        })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Every template id, in catalog order.
    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.id.clone()).collect()
    }

    /// Loads the selected templates in order.
    ///
    /// The first unknown id or unreadable file aborts the whole load, so a
    /// merge never sees a partial selection.
    pub fn load_sub_flows(&self, selection: &[String]) -> Result<Vec<SubFlow>, MergeError> {
        let mut sub_flows = Vec::with_capacity(selection.len());
        for id in selection {
            let entry = self
                .entries
                .iter()
                .find(|entry| entry.id == *id)
                .ok_or_else(|| MergeError::UnknownTemplate(id.clone()))?;
            let path = self.base_dir.join(&entry.file);
            let (document, warnings) = FlowDocument::from_json_file(&path.to_string_lossy())
                .map_err(|e| MergeError::TemplateLoad {
                    template: id.clone(),
                    message: e.to_string(),
                })?;
            for warning in warnings {
                warn!("Template '{}': {}", id, warning);
            }
            sub_flows.push(SubFlow {
                namespace: entry.id.clone(),
                label: entry.label.clone(),
                category: entry.category.clone(),
                entry_screen: entry.entry_screen.clone(),
                document,
            });
        }
        Ok(sub_flows)
    }

    /// Loads every template in the catalog.
    pub fn load_all(&self) -> Result<Vec<SubFlow>, MergeError> {
        self.load_sub_flows(&self.ids())
    }
}
