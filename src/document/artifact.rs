use crate::document::model::FlowDocument;
use crate::error::BundleError;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};

/// A deployable, self-contained composed bot: a display name plus its master
/// flow document.
///
/// The document travels as canonical JSON inside the binary envelope, so the
/// on-disk representation stays single-sourced with what `FlowDocument`
/// serializes everywhere else.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FlowBundle {
    pub name: String,
    document_json: String,
}

impl FlowBundle {
    /// Wraps a composed document for deployment.
    pub fn new(name: &str, document: &FlowDocument) -> Result<Self, BundleError> {
        let document_json = document
            .to_json()
            .map_err(|e| BundleError::Encode(e.to_string()))?;
        Ok(Self {
            name: name.to_string(),
            document_json,
        })
    }

    /// Recovers the canonical document carried by the bundle.
    pub fn document(&self) -> Result<FlowDocument, BundleError> {
        let (document, warnings) = FlowDocument::from_json(&self.document_json)
            .map_err(|e| BundleError::Decode(e.to_string()))?;
        for warning in warnings {
            log::warn!("Bundle '{}': {}", self.name, warning);
        }
        Ok(document)
    }

    /// Saves the bundle to a file using the bincode format.
    pub fn save(&self, path: &str) -> Result<(), BundleError> {
        let bytes = self.to_bytes()?;
        let mut file = fs::File::create(path).map_err(|e| BundleError::File {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        file.write_all(&bytes).map_err(|e| BundleError::File {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Serializes the bundle to a byte vector.
    pub fn to_bytes(&self) -> Result<Vec<u8>, BundleError> {
        encode_to_vec(self, standard()).map_err(|e| BundleError::Encode(e.to_string()))
    }

    /// Loads a bundle from a file.
    pub fn from_file(path: &str) -> Result<Self, BundleError> {
        let mut file = fs::File::open(path).map_err(|e| BundleError::File {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|e| BundleError::File {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::from_bytes(&bytes)
    }

    /// Deserializes a bundle from a byte slice.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BundleError> {
        decode_from_slice(bytes, standard())
            .map(|(bundle, _)| bundle) // bincode 2 returns a tuple (data, bytes_read)
            .map_err(|e| BundleError::Decode(e.to_string()))
    }
}
