//! Namespace prefixing for sub-flow documents.

use crate::document::{ApiCall, Button, DynamicButtons, FlowDocument, ScreenId, ScreenNode};
use ahash::AHashMap;

/// Rewrites every screen id of `document` to `{prefix}_{id}` and closes all
/// internal references over the new ids.
///
/// A forward reference is rewritten only when its target is a screen of this
/// document; references to outside ids are left byte-identical, and a literal
/// `null` target is never rewritten. Pure copy-on-write: the source document
/// is untouched.
pub fn rewrite_with_prefix(document: &FlowDocument, prefix: &str) -> FlowDocument {
    let rewrite_id = |id: &str| -> ScreenId {
        if document.screens.contains_key(id) {
            format!("{prefix}_{id}")
        } else {
            id.to_string()
        }
    };
    let rewrite_target = |target: &Option<ScreenId>| -> Option<ScreenId> {
        target.as_ref().map(|id| rewrite_id(id))
    };
    let rewrite_buttons = |buttons: &[Button]| -> Vec<Button> {
        buttons
            .iter()
            .map(|button| Button {
                label: button.label.clone(),
                go_to_screen_id: rewrite_target(&button.go_to_screen_id),
                set_variable: button.set_variable.clone(),
                set_value: button.set_value.clone(),
            })
            .collect()
    };
    let rewrite_dynamic = |config: &DynamicButtons| -> DynamicButtons {
        DynamicButtons {
            go_to_screen_id: rewrite_target(&config.go_to_screen_id),
            ..config.clone()
        }
    };

    let mut screens = AHashMap::with_capacity(document.screens.len());
    for (id, node) in &document.screens {
        let rewritten = match node {
            ScreenNode::Start { go_to_screen_id } => ScreenNode::Start {
                go_to_screen_id: rewrite_id(go_to_screen_id),
            },
            ScreenNode::Message {
                message_text,
                buttons,
                dynamic_buttons,
                go_to_screen_id,
            } => ScreenNode::Message {
                message_text: message_text.clone(),
                buttons: rewrite_buttons(buttons),
                dynamic_buttons: dynamic_buttons.as_ref().map(|d| rewrite_dynamic(d)),
                go_to_screen_id: rewrite_target(go_to_screen_id),
            },
            ScreenNode::Menu {
                message_text,
                buttons,
                dynamic_buttons,
                go_to_screen_id,
            } => ScreenNode::Menu {
                message_text: message_text.clone(),
                buttons: rewrite_buttons(buttons),
                dynamic_buttons: dynamic_buttons.as_ref().map(|d| rewrite_dynamic(d)),
                go_to_screen_id: rewrite_target(go_to_screen_id),
            },
            ScreenNode::ApiCall { api_call } => ScreenNode::ApiCall {
                api_call: ApiCall {
                    on_success_go_to_screen_id: rewrite_target(
                        &api_call.on_success_go_to_screen_id,
                    ),
                    on_error_go_to_screen_id: rewrite_target(&api_call.on_error_go_to_screen_id),
                    ..api_call.clone()
                },
            },
            ScreenNode::Conditional {
                condition,
                go_to_screen_id,
                on_false_go_to_screen_id,
            } => ScreenNode::Conditional {
                condition: condition.clone(),
                go_to_screen_id: rewrite_target(go_to_screen_id),
                on_false_go_to_screen_id: rewrite_target(on_false_go_to_screen_id),
            },
            ScreenNode::End { message_text } => ScreenNode::End {
                message_text: message_text.clone(),
            },
        };
        screens.insert(format!("{prefix}_{id}"), rewritten);
    }

    FlowDocument {
        start_screen_id: rewrite_id(&document.start_screen_id),
        screens,
    }
}
