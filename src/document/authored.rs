use crate::document::model::FlowDocument;
use crate::error::AuthoringWarning;
use ahash::AHashMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// A duck-typed authored screen object, exactly as editors and template files
/// supply it: every field optional, legacy spellings accepted, unknown fields
/// ignored. Consumed only through classification.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthoredScreen {
    pub screen_id: Option<String>,
    #[serde(rename = "type")]
    pub screen_type: Option<String>,
    pub message_text: Option<String>,
    #[serde(default, deserialize_with = "nullable_string")]
    pub go_to_screen_id: Option<Option<String>>,
    pub on_false_go_to_screen_id: Option<String>,
    pub buttons: Option<Vec<AuthoredButton>>,
    pub dynamic_buttons: Option<AuthoredDynamicButtons>,
    pub api_call: Option<AuthoredApiCall>,
    pub condition: Option<AuthoredCondition>,
    pub on_success: Option<String>,
    pub on_error: Option<String>,
}

/// A loosely authored button.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthoredButton {
    pub label: Option<String>,
    pub go_to_screen_id: Option<String>,
    pub set_variable: Option<String>,
    pub set_value: Option<Value>,
}

/// A loosely authored dynamic-button configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthoredDynamicButtons {
    pub source_variable: Option<String>,
    pub label_template: Option<String>,
    pub go_to_screen_id: Option<String>,
    pub set_variable_on_click: Option<BTreeMap<String, String>>,
    pub set_variable: Option<String>,
}

/// A loosely authored API call configuration, carrying both current and
/// legacy field spellings side by side. Alias resolution happens during
/// canonicalization, not here, so documents that carry both spellings at
/// once still parse.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthoredApiCall {
    pub url: Option<String>,
    pub method: Option<String>,
    pub save_response_to_variable: Option<String>,
    pub save_response_to: Option<String>,
    pub on_success_go_to_screen_id: Option<String>,
    pub on_error_go_to_screen_id: Option<String>,
    pub on_success: Option<String>,
    pub on_error: Option<String>,
    pub mock_response: Option<Value>,
    pub mock_file: Option<String>,
}

/// A loosely authored branch condition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthoredCondition {
    pub variable: Option<String>,
    pub operator: Option<String>,
    pub value: Option<Value>,
}

/// A loose authored document: a start reference plus duck-typed screens.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthoredDocument {
    pub start_screen_id: Option<String>,
    pub screens: Option<AHashMap<String, AuthoredScreen>>,
}

// Distinguishes an explicitly null field from an absent one; the difference
// decides end-screen classification.
fn nullable_string<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// A trait for authoring-side structures that can be turned into a canonical
/// `FlowDocument`.
///
/// This is the extension point for custom editor formats. Implementing it on
/// your own structs lets the validator, merge engine, and runtime consume
/// your format without caring how it was authored. Conversion never fails;
/// authoring problems surface as non-blocking warnings.
///
/// # Example
///
/// ```rust,no_run
/// use kaiwa::document::{AuthoredScreen, FlowDocument, IntoFlowDocument};
/// use kaiwa::error::AuthoringWarning;
///
/// // 1. Define your custom structs for parsing your editor's format.
/// struct MyEditorNode { id: String, text: String }
/// struct MyEditorFlow { entry: String, nodes: Vec<MyEditorNode> }
///
/// // 2. Implement `IntoFlowDocument` for your top-level struct.
/// impl IntoFlowDocument for MyEditorFlow {
///     fn into_flow_document(self) -> (FlowDocument, Vec<AuthoringWarning>) {
///         let mut screens = vec![AuthoredScreen {
///             screen_id: Some("start".to_string()),
///             screen_type: Some("START".to_string()),
///             go_to_screen_id: Some(Some(self.entry)),
///             ..AuthoredScreen::default()
///         }];
///         for node in self.nodes {
///             screens.push(AuthoredScreen {
///                 screen_id: Some(node.id),
///                 message_text: Some(node.text),
///                 ..AuthoredScreen::default()
///             });
///         }
///         screens.into_flow_document()
///     }
/// }
/// ```
pub trait IntoFlowDocument {
    /// Consumes the object and converts it into a canonical flow document,
    /// reporting any non-blocking authoring warnings.
    fn into_flow_document(self) -> (FlowDocument, Vec<AuthoringWarning>);
}

impl IntoFlowDocument for AuthoredDocument {
    fn into_flow_document(self) -> (FlowDocument, Vec<AuthoringWarning>) {
        crate::document::classify::canonicalize_document(self)
    }
}

impl IntoFlowDocument for Vec<AuthoredScreen> {
    fn into_flow_document(self) -> (FlowDocument, Vec<AuthoringWarning>) {
        crate::document::classify::canonicalize_nodes(self)
    }
}
