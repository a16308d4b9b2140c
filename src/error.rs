use thiserror::Error;

/// Non-blocking problems detected while canonicalizing an authored document.
///
/// Warnings are reported alongside the canonical document and never prevent
/// canonicalization from completing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthoringWarning {
    #[error("Duplicate screen id '{0}': the later definition replaces the earlier one")]
    DuplicateScreenId(String),

    #[error("Screen '{key}' declares screen_id '{declared}', which disagrees with its key")]
    ScreenIdMismatch { key: String, declared: String },

    #[error("An authored node with an empty screen_id was skipped")]
    MissingScreenId,

    #[error("Document has an empty start_screen_id; a session cannot start until one is set")]
    EmptyStartScreen,
}

/// Errors that can occur while reading or parsing a flow document or fixture file.
#[derive(Error, Debug, Clone)]
pub enum DocumentError {
    #[error("Failed to parse flow document JSON: {0}")]
    JsonParseError(String),

    #[error("Failed to serialize flow document: {0}")]
    Serialize(String),

    #[error("Could not read '{path}': {message}")]
    FileRead { path: String, message: String },
}

/// Errors that can occur while composing a master bot from sub-flows.
#[derive(Error, Debug, Clone)]
pub enum MergeError {
    #[error("Cannot compose a master bot from an empty sub-flow selection")]
    NoSubFlows,

    #[error("Duplicate sub-flow namespace '{0}'")]
    DuplicateNamespace(String),

    #[error("Screen id '{0}' collides with a screen already present in the master document")]
    ScreenIdCollision(String),

    #[error("Template '{0}' is not present in the catalog")]
    UnknownTemplate(String),

    #[error("Sub-flow '{template}' failed to load: {message}")]
    TemplateLoad { template: String, message: String },
}

/// Errors that can occur while driving a conversation session.
#[derive(Error, Debug, Clone)]
pub enum SessionError {
    #[error("No choice is currently awaited; start the session and wait for a menu")]
    NotAwaitingChoice,

    #[error("Choice index {index} is out of range: {available} choices are available")]
    InvalidChoice { index: usize, available: usize },
}

/// Errors that can occur while saving or loading a deployable flow bundle.
#[derive(Error, Debug, Clone)]
pub enum BundleError {
    #[error("Failed to encode bundle: {0}")]
    Encode(String),

    #[error("Failed to decode bundle: {0}")]
    Decode(String),

    #[error("Could not access bundle file '{path}': {message}")]
    File { path: String, message: String },
}
