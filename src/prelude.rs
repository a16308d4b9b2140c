//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the kaiwa crate.
//! Import this module to get access to the core functionality without having to import
//! each type individually.
//!
//! # Example
//!
//! ```rust,no_run
//! // Use the prelude to get easy access to all the core types.
//! use kaiwa::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! // Load a template catalog and merge every service into one bot
//! let catalog = TemplateCatalog::from_file("templates/catalog.json")?;
//! let sub_flows = catalog.load_all()?;
//!
//! let merger = Merger::builder(BotConfig::default()).build();
//! let document = merger.merge(&sub_flows)?;
//!
//! // Drive a conversation over the merged document
//! let mut session = ChatSession::new(document);
//! let step = session.start();
//! println!("{}", TranscriptFormatter::format_conversation(&step.entries));
//! # Ok(())
//! # }
//! ```

// Document model and parsing
pub use crate::document::{FlowBundle, FlowDocument, IntoFlowDocument, ScreenKind, ScreenNode};

// Flow composition
pub use crate::merge::{BotConfig, MenuStyle, Merger, SubFlow, TemplateCatalog};

// Conversation runtime
pub use crate::runtime::{
    ChatSession, Choice, FixtureProvider, FixtureSet, SessionState, StepOutcome, VariableStore,
};

// Error types
pub use crate::error::{DocumentError, MergeError, SessionError};

// Transcript formatting
pub use crate::runtime::TranscriptFormatter;

// Standard library re-exports commonly used with this crate
pub use std::collections::HashMap;
pub use std::path::Path;

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
