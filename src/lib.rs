//! # Kaiwa - Chatbot Flow Authoring and Conversation Engine
//!
//! **Kaiwa** is a flow-document engine for menu-driven chatbots. It parses
//! node-based flow documents authored in JSON into a canonical screen graph,
//! merges independently authored service flows into one navigable bot, and
//! interprets the result as an interactive conversation with variables,
//! simulated API calls, and conditional branching.
//!
//! ## Core Workflow
//!
//! The engine is format-tolerant on the way in and canonical on the way out.
//! It operates on an internal model of a "flow document." The primary
//! workflow is:
//!
//! 1.  **Load Your Flows**: Parse authored JSON (editor exports, template files) with `FlowDocument::from_json`, or implement the `IntoFlowDocument` trait to feed screens from your own authoring structs. Legacy field spellings are resolved and every screen is classified into its canonical kind.
//! 2.  **Merge**: Use `Merger::builder` to combine independent sub-flows into a single document behind a generated main menu, with every screen id namespaced to its service so nothing collides.
//! 3.  **Converse**: Create a `ChatSession` over the document and drive it with `start` and `choose`. API screens are answered by a pluggable `FixtureProvider` instead of the network.
//! 4.  **Ship**: Serialize the document back to editor-compatible JSON, or pack it into a compact binary `FlowBundle`.
//!
//! ## Quick Start
//!
//! The following example demonstrates the end-to-end process for a single
//! authored flow.
//!
//! ```rust,no_run
//! use kaiwa::prelude::*;
//! use kaiwa::runtime::{FixtureSet, SessionState};
//! use serde_json::json;
//!
//! fn main() -> Result<()> {
//!     // Assume the document was exported from the flow editor.
//!     let json = std::fs::read_to_string("flows/balance_check.json")?;
//!     let (document, warnings) = FlowDocument::from_json(&json)?;
//!     for warning in &warnings {
//!         eprintln!("warning: {warning}");
//!     }
//!
//!     // Answer the document's API screens with canned responses.
//!     let fixtures = FixtureSet::new()
//!         .with_response("https://api.example.com/balance", json!({ "balance": 42 }));
//!
//!     let mut session = ChatSession::builder(document)
//!         .with_fixtures(fixtures)
//!         .build();
//!
//!     // The bot speaks first; the visitor always picks the first option.
//!     let step = session.start();
//!     for entry in &step.entries {
//!         println!("{entry}");
//!     }
//!     while session.state() == SessionState::AwaitingChoice {
//!         let step = session.choose(0)?;
//!         for entry in &step.entries {
//!             println!("{entry}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod document;
pub mod error;
pub mod merge;
pub mod prelude;
pub mod rewrite;
pub mod runtime;
