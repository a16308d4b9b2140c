use crate::document::authored::AuthoredDocument;
use crate::document::classify;
use crate::error::{AuthoringWarning, DocumentError};
use ahash::AHashMap;
use serde::ser::{Error as _, SerializeMap};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// String identifier of a screen, unique within a document.
pub type ScreenId = String;

/// The canonical kind of a screen node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenKind {
    Start,
    Message,
    Menu,
    ApiCall,
    Conditional,
    End,
}

impl fmt::Display for ScreenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScreenKind::Start => "start",
            ScreenKind::Message => "message",
            ScreenKind::Menu => "menu",
            ScreenKind::ApiCall => "api_call",
            ScreenKind::Conditional => "conditional",
            ScreenKind::End => "end",
        };
        write!(f, "{}", name)
    }
}

/// A single selectable button on a message or menu screen.
///
/// A `null` target marks deliberate conversation termination and always
/// serializes as literal JSON `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Button {
    pub label: String,
    pub go_to_screen_id: Option<ScreenId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_variable: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_value: Option<Value>,
}

impl Button {
    /// A plain navigation button with no variable writes.
    pub fn link(label: &str, target: &str) -> Self {
        Self {
            label: label.to_string(),
            go_to_screen_id: Some(target.to_string()),
            set_variable: None,
            set_value: None,
        }
    }
}

/// Configuration for synthesizing one button per element of an array variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DynamicButtons {
    pub source_variable: String,
    pub label_template: String,
    pub go_to_screen_id: Option<ScreenId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_variable_on_click: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_variable: Option<String>,
}

/// Comparison applied by a conditional screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    Exists,
    GreaterThan,
}

impl ConditionOperator {
    /// Parses an authored operator name; unrecognized names fall back to `equals`.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "exists" => ConditionOperator::Exists,
            "greater_than" => ConditionOperator::GreaterThan,
            _ => ConditionOperator::Equals,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionOperator::Equals => "equals",
            ConditionOperator::Exists => "exists",
            ConditionOperator::GreaterThan => "greater_than",
        }
    }
}

/// The branch test carried by a conditional screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    pub variable: String,
    pub operator: ConditionOperator,
    pub value: Value,
}

/// Simulated API call configuration carried by an `ApiCall` screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiCall {
    pub url: String,
    pub method: String,
    pub save_response_to_variable: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_success_go_to_screen_id: Option<ScreenId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_error_go_to_screen_id: Option<ScreenId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mock_response: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mock_file: Option<String>,
}

/// One node of a flow graph, in canonical tagged form.
///
/// Message and Menu behave identically at render time; the distinction is
/// purely classificatory (a canonical Menu always carries at least one static
/// button). The vestigial top-level `go_to_screen_id` on Message and Menu is
/// never followed at runtime; it survives as a rewriter target only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ScreenNode {
    #[serde(rename = "START")]
    Start { go_to_screen_id: ScreenId },

    #[serde(rename = "MESSAGE_SCREEN")]
    Message {
        message_text: String,
        buttons: Vec<Button>,
        #[serde(skip_serializing_if = "Option::is_none")]
        dynamic_buttons: Option<DynamicButtons>,
        #[serde(skip_serializing_if = "Option::is_none")]
        go_to_screen_id: Option<ScreenId>,
    },

    #[serde(rename = "MESSAGE_SCREEN")]
    Menu {
        message_text: String,
        buttons: Vec<Button>,
        #[serde(skip_serializing_if = "Option::is_none")]
        dynamic_buttons: Option<DynamicButtons>,
        #[serde(skip_serializing_if = "Option::is_none")]
        go_to_screen_id: Option<ScreenId>,
    },

    #[serde(rename = "API_SCREEN")]
    ApiCall { api_call: ApiCall },

    #[serde(rename = "CONDITIONAL_SCREEN")]
    Conditional {
        condition: Condition,
        #[serde(skip_serializing_if = "Option::is_none")]
        go_to_screen_id: Option<ScreenId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        on_false_go_to_screen_id: Option<ScreenId>,
    },

    #[serde(rename = "END_SCREEN")]
    End { message_text: String },
}

impl ScreenNode {
    pub fn kind(&self) -> ScreenKind {
        match self {
            ScreenNode::Start { .. } => ScreenKind::Start,
            ScreenNode::Message { .. } => ScreenKind::Message,
            ScreenNode::Menu { .. } => ScreenKind::Menu,
            ScreenNode::ApiCall { .. } => ScreenKind::ApiCall,
            ScreenNode::Conditional { .. } => ScreenKind::Conditional,
            ScreenNode::End { .. } => ScreenKind::End,
        }
    }

    /// The display text of nodes that carry one.
    pub fn message_text(&self) -> Option<&str> {
        match self {
            ScreenNode::Message { message_text, .. }
            | ScreenNode::Menu { message_text, .. }
            | ScreenNode::End { message_text } => Some(message_text),
            _ => None,
        }
    }

    /// The static buttons of nodes that carry them.
    pub fn buttons(&self) -> Option<&[Button]> {
        match self {
            ScreenNode::Message { buttons, .. } | ScreenNode::Menu { buttons, .. } => {
                Some(buttons)
            }
            _ => None,
        }
    }

    /// Mutable access to the static buttons of nodes that carry them.
    pub fn buttons_mut(&mut self) -> Option<&mut Vec<Button>> {
        match self {
            ScreenNode::Message { buttons, .. } | ScreenNode::Menu { buttons, .. } => {
                Some(buttons)
            }
            _ => None,
        }
    }
}

/// A complete flow graph: the entry reference plus an id-keyed screen map.
///
/// Documents are immutable once handed to a session; every transform
/// (rewriting, merging) produces a new document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlowDocument {
    pub start_screen_id: ScreenId,
    pub screens: AHashMap<ScreenId, ScreenNode>,
}

impl FlowDocument {
    /// An empty document pointing at the given start screen.
    pub fn new(start_screen_id: &str) -> Self {
        Self {
            start_screen_id: start_screen_id.to_string(),
            screens: AHashMap::new(),
        }
    }

    pub fn screen(&self, id: &str) -> Option<&ScreenNode> {
        self.screens.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.screens.contains_key(id)
    }

    /// Parses a JSON document through classification, reporting any
    /// non-blocking authoring warnings alongside the canonical result.
    pub fn from_json(json: &str) -> Result<(Self, Vec<AuthoringWarning>), DocumentError> {
        let authored: AuthoredDocument = serde_json::from_str(json)
            .map_err(|e| DocumentError::JsonParseError(e.to_string()))?;
        Ok(classify::canonicalize_document(authored))
    }

    /// Reads and parses a JSON document from a file.
    pub fn from_json_file(path: &str) -> Result<(Self, Vec<AuthoringWarning>), DocumentError> {
        let json = std::fs::read_to_string(path).map_err(|e| DocumentError::FileRead {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        serde_json::to_string(self).map_err(|e| DocumentError::Serialize(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String, DocumentError> {
        serde_json::to_string_pretty(self).map_err(|e| DocumentError::Serialize(e.to_string()))
    }
}

// Each serialized screen object repeats its map key as a `screen_id` field,
// which is what authoring tools and the original template files expect.
impl Serialize for FlowDocument {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut screens: BTreeMap<&ScreenId, Value> = BTreeMap::new();
        for (id, node) in &self.screens {
            let mut value = serde_json::to_value(node).map_err(S::Error::custom)?;
            if let Value::Object(object) = &mut value {
                object.insert("screen_id".to_string(), Value::String(id.clone()));
            }
            screens.insert(id, value);
        }
        let mut document = serializer.serialize_map(Some(2))?;
        document.serialize_entry("start_screen_id", &self.start_screen_id)?;
        document.serialize_entry("screens", &screens)?;
        document.end()
    }
}

// Parsing always runs through classification, so a document round-trips to
// the same canonical form no matter which legacy spellings it used.
impl<'de> Deserialize<'de> for FlowDocument {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let authored = AuthoredDocument::deserialize(deserializer)?;
        Ok(classify::canonicalize_document(authored).0)
    }
}
