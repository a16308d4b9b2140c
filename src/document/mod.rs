//! The canonical flow-document model and everything that produces it:
//! duck-typed authored input, classification, and the deployable bundle
//! artifact.

pub mod artifact;
pub mod authored;
pub mod classify;
pub mod model;

pub use artifact::FlowBundle;
pub use authored::{
    AuthoredApiCall, AuthoredButton, AuthoredCondition, AuthoredDocument,
    AuthoredDynamicButtons, AuthoredScreen, IntoFlowDocument,
};
pub use classify::{
    canonicalize_document, canonicalize_nodes, classify, default_node, default_screen_id,
};
pub use model::{
    ApiCall, Button, Condition, ConditionOperator, DynamicButtons, FlowDocument, ScreenId,
    ScreenKind, ScreenNode,
};
