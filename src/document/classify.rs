//! Duck-typed screen classification and document canonicalization.
//!
//! Authored nodes carry no reliable schema: the `type` tag is optional, two
//! generations of field spellings coexist, and whole sub-objects imply a kind
//! on their own. Everything entering the crate passes through
//! [`classify`] and the canonicalization functions here; nothing else in the
//! crate inspects authored shapes.

use crate::document::authored::{
    AuthoredButton, AuthoredDocument, AuthoredDynamicButtons, AuthoredScreen,
};
use crate::document::model::{
    ApiCall, Button, Condition, ConditionOperator, DynamicButtons, FlowDocument, ScreenKind,
    ScreenNode,
};
use crate::error::AuthoringWarning;
use ahash::AHashMap;
use log::warn;
use serde_json::Value;

/// Classifies a duck-typed authored screen into its canonical kind.
///
/// Priority order: ApiCall, Conditional, Start, End, Menu, Message. Shape
/// wins over the `type` tag, so an `api_call` object makes an ApiCall screen
/// even without a tag. A screen whose target is explicitly `null` is an End
/// screen regardless of its buttons; a screen with no target and no choices
/// of any kind is an End screen too (a dead-end message is a terminus).
pub fn classify(screen: &AuthoredScreen) -> ScreenKind {
    let type_tag = screen.screen_type.as_deref().unwrap_or("");
    if screen.api_call.is_some() || matches!(type_tag, "API_SCREEN" | "API_CALL") {
        return ScreenKind::ApiCall;
    }
    if screen.condition.is_some() || matches!(type_tag, "CONDITIONAL_SCREEN" | "CONDITIONAL") {
        return ScreenKind::Conditional;
    }
    if type_tag == "START" {
        return ScreenKind::Start;
    }
    let has_static = screen.buttons.as_ref().is_some_and(|b| !b.is_empty());
    let has_dynamic = screen.dynamic_buttons.is_some();
    let end = type_tag == "END_SCREEN"
        || match &screen.go_to_screen_id {
            Some(None) => true,
            None => !has_static && !has_dynamic,
            Some(Some(_)) => false,
        };
    if end {
        return ScreenKind::End;
    }
    if has_static || type_tag == "MENU" {
        return ScreenKind::Menu;
    }
    ScreenKind::Message
}

/// Canonicalizes one authored screen according to its classified kind,
/// folding legacy field spellings into their canonical fields.
pub fn canonical_node(screen: AuthoredScreen) -> ScreenNode {
    match classify(&screen) {
        ScreenKind::Start => ScreenNode::Start {
            go_to_screen_id: screen.go_to_screen_id.flatten().unwrap_or_default(),
        },
        ScreenKind::End => ScreenNode::End {
            message_text: screen.message_text.unwrap_or_default(),
        },
        ScreenKind::ApiCall => {
            let call = screen.api_call.unwrap_or_default();
            ScreenNode::ApiCall {
                api_call: ApiCall {
                    url: call.url.unwrap_or_default(),
                    method: call.method.unwrap_or_else(|| "GET".to_string()),
                    save_response_to_variable: first_non_empty([
                        call.save_response_to.as_ref(),
                        call.save_response_to_variable.as_ref(),
                    ])
                    .unwrap_or_default(),
                    on_success_go_to_screen_id: first_non_empty([
                        screen.on_success.as_ref(),
                        call.on_success.as_ref(),
                        call.on_success_go_to_screen_id.as_ref(),
                    ]),
                    on_error_go_to_screen_id: first_non_empty([
                        screen.on_error.as_ref(),
                        call.on_error.as_ref(),
                        call.on_error_go_to_screen_id.as_ref(),
                    ]),
                    mock_response: call.mock_response,
                    mock_file: call.mock_file,
                },
            }
        }
        ScreenKind::Conditional => {
            let condition = screen.condition.unwrap_or_default();
            ScreenNode::Conditional {
                condition: Condition {
                    variable: condition.variable.unwrap_or_default(),
                    operator: ConditionOperator::parse(
                        condition.operator.as_deref().unwrap_or("equals"),
                    ),
                    value: condition.value.unwrap_or(Value::Null),
                },
                go_to_screen_id: screen.go_to_screen_id.flatten(),
                on_false_go_to_screen_id: screen.on_false_go_to_screen_id,
            }
        }
        ScreenKind::Menu => {
            let (message_text, buttons, dynamic_buttons, go_to_screen_id) =
                message_parts(screen);
            ScreenNode::Menu {
                message_text,
                buttons,
                dynamic_buttons,
                go_to_screen_id,
            }
        }
        ScreenKind::Message => {
            let (message_text, buttons, dynamic_buttons, go_to_screen_id) =
                message_parts(screen);
            ScreenNode::Message {
                message_text,
                buttons,
                dynamic_buttons,
                go_to_screen_id,
            }
        }
    }
}

fn message_parts(
    screen: AuthoredScreen,
) -> (String, Vec<Button>, Option<DynamicButtons>, Option<String>) {
    let buttons = screen
        .buttons
        .unwrap_or_default()
        .into_iter()
        .map(canonical_button)
        .collect();
    (
        screen.message_text.unwrap_or_default(),
        buttons,
        screen.dynamic_buttons.map(canonical_dynamic_buttons),
        screen.go_to_screen_id.flatten(),
    )
}

fn canonical_button(button: AuthoredButton) -> Button {
    Button {
        label: button.label.unwrap_or_default(),
        go_to_screen_id: button.go_to_screen_id,
        set_variable: button.set_variable,
        set_value: button.set_value,
    }
}

fn canonical_dynamic_buttons(config: AuthoredDynamicButtons) -> DynamicButtons {
    DynamicButtons {
        source_variable: config.source_variable.unwrap_or_default(),
        label_template: config.label_template.unwrap_or_default(),
        go_to_screen_id: config.go_to_screen_id,
        set_variable_on_click: config.set_variable_on_click,
        set_variable: config.set_variable,
    }
}

// Legacy documents read dual spellings with `||`, so the oldest spelling wins
// and empty strings fall through to the next candidate.
fn first_non_empty<'a>(
    candidates: impl IntoIterator<Item = Option<&'a String>>,
) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .cloned()
}

/// Canonicalizes a loose authored document.
///
/// Never fails: problems are reported as warnings next to a best-effort
/// canonical document.
pub fn canonicalize_document(
    authored: AuthoredDocument,
) -> (FlowDocument, Vec<AuthoringWarning>) {
    let mut warnings = Vec::new();
    let start_screen_id = authored.start_screen_id.unwrap_or_default();
    if start_screen_id.is_empty() {
        warnings.push(AuthoringWarning::EmptyStartScreen);
    }
    let authored_screens = authored.screens.unwrap_or_default();
    let mut screens = AHashMap::with_capacity(authored_screens.len());
    for (key, screen) in authored_screens {
        if let Some(declared) = screen.screen_id.as_deref() {
            if !declared.is_empty() && declared != key {
                warnings.push(AuthoringWarning::ScreenIdMismatch {
                    key: key.clone(),
                    declared: declared.to_string(),
                });
            }
        }
        screens.insert(key, canonical_node(screen));
    }
    report(&warnings);
    (
        FlowDocument {
            start_screen_id,
            screens,
        },
        warnings,
    )
}

/// Canonicalizes an unordered editor node list.
///
/// Nodes without a screen id are skipped, later duplicates overwrite earlier
/// ones, and the START node's target names the document's entry screen.
pub fn canonicalize_nodes(nodes: Vec<AuthoredScreen>) -> (FlowDocument, Vec<AuthoringWarning>) {
    let mut warnings = Vec::new();
    let mut start_screen_id = String::new();
    let mut screens = AHashMap::with_capacity(nodes.len());
    for screen in nodes {
        let key = match screen.screen_id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                warnings.push(AuthoringWarning::MissingScreenId);
                continue;
            }
        };
        if screens.contains_key(&key) {
            warnings.push(AuthoringWarning::DuplicateScreenId(key.clone()));
        }
        let node = canonical_node(screen);
        if let ScreenNode::Start { go_to_screen_id } = &node {
            start_screen_id = go_to_screen_id.clone();
        }
        screens.insert(key, node);
    }
    if start_screen_id.is_empty() {
        warnings.push(AuthoringWarning::EmptyStartScreen);
    }
    report(&warnings);
    (
        FlowDocument {
            start_screen_id,
            screens,
        },
        warnings,
    )
}

fn report(warnings: &[AuthoringWarning]) {
    for warning in warnings {
        warn!("{}", warning);
    }
}

/// Returns the default configuration editors seed a freshly created node
/// with. Idempotent: calling it twice for the same kind yields identical
/// nodes.
pub fn default_node(kind: ScreenKind) -> ScreenNode {
    match kind {
        ScreenKind::Start => ScreenNode::Start {
            go_to_screen_id: String::new(),
        },
        ScreenKind::Message => ScreenNode::Message {
            message_text: "Enter your message here".to_string(),
            buttons: Vec::new(),
            dynamic_buttons: None,
            go_to_screen_id: None,
        },
        ScreenKind::Menu => ScreenNode::Menu {
            message_text: "Please select an option".to_string(),
            buttons: Vec::new(),
            dynamic_buttons: None,
            go_to_screen_id: None,
        },
        ScreenKind::ApiCall => ScreenNode::ApiCall {
            api_call: ApiCall {
                url: String::new(),
                method: "GET".to_string(),
                save_response_to_variable: String::new(),
                on_success_go_to_screen_id: None,
                on_error_go_to_screen_id: None,
                mock_response: None,
                mock_file: None,
            },
        },
        ScreenKind::Conditional => ScreenNode::Conditional {
            condition: Condition {
                variable: String::new(),
                operator: ConditionOperator::Equals,
                value: Value::String(String::new()),
            },
            go_to_screen_id: None,
            on_false_go_to_screen_id: None,
        },
        ScreenKind::End => ScreenNode::End {
            message_text: "Thank you!".to_string(),
        },
    }
}

/// The conventional screen id editors assign to singleton kinds.
pub fn default_screen_id(kind: ScreenKind) -> Option<&'static str> {
    match kind {
        ScreenKind::Start => Some("start"),
        ScreenKind::End => Some("end"),
        _ => None,
    }
}
