//! Common test utilities for building flow documents, sub-flows, and fixtures.
use kaiwa::document::{ApiCall, Button, DynamicButtons, ScreenNode};
use kaiwa::prelude::*;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// An authored balance-check flow exercising every screen kind, written with
/// the legacy API field spellings.
///
/// Path: start -> welcome menu -> fetch_balance (API) -> has_funds
/// (conditional) -> show_balance / empty_balance, or api_failed on error.
#[allow(dead_code)]
pub const BALANCE_CHECK_JSON: &str = r#"{
    "start_screen_id": "start",
    "screens": {
        "start": { "screen_id": "start", "type": "START", "go_to_screen_id": "welcome" },
        "welcome": {
            "screen_id": "welcome",
            "type": "MESSAGE_SCREEN",
            "message_text": "Hi! What would you like to do?",
            "buttons": [
                { "label": "Check my balance", "go_to_screen_id": "fetch_balance" },
                { "label": "Nothing, thanks", "go_to_screen_id": null }
            ]
        },
        "fetch_balance": {
            "screen_id": "fetch_balance",
            "type": "API_SCREEN",
            "api_call": {
                "url": "https://api.example.com/balance",
                "method": "GET",
                "save_response_to": "balance_data",
                "on_success": "has_funds",
                "on_error": "api_failed"
            }
        },
        "has_funds": {
            "screen_id": "has_funds",
            "type": "CONDITIONAL_SCREEN",
            "condition": {
                "variable": "balance_data.balance",
                "operator": "greater_than",
                "value": 0
            },
            "go_to_screen_id": "show_balance",
            "on_false_go_to_screen_id": "empty_balance"
        },
        "show_balance": {
            "screen_id": "show_balance",
            "type": "END_SCREEN",
            "message_text": "Balance: {{balance_data.balance}}"
        },
        "empty_balance": {
            "screen_id": "empty_balance",
            "type": "END_SCREEN",
            "message_text": "Your account is empty."
        },
        "api_failed": {
            "screen_id": "api_failed",
            "type": "END_SCREEN",
            "message_text": "Sorry, something went wrong."
        }
    }
}"#;

/// Parses [`BALANCE_CHECK_JSON`] into its canonical document.
#[allow(dead_code)]
pub fn balance_check_flow() -> FlowDocument {
    let (document, warnings) =
        FlowDocument::from_json(BALANCE_CHECK_JSON).expect("Failed to parse balance check flow");
    assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
    document
}

/// Canned responses answering the balance-check flow's API screen.
#[allow(dead_code)]
pub fn balance_fixtures() -> FixtureSet {
    FixtureSet::new().with_response("https://api.example.com/balance", json!({ "balance": 42 }))
}

/// A session over `document` with zero simulated latency.
#[allow(dead_code)]
pub fn offline_session(document: FlowDocument) -> ChatSession {
    ChatSession::builder(document)
        .with_api_latency(Duration::ZERO)
        .build()
}

/// A zero-latency session whose API screens are answered by `fixtures`.
#[allow(dead_code)]
pub fn session_with_fixtures(document: FlowDocument, fixtures: FixtureSet) -> ChatSession {
    ChatSession::builder(document)
        .with_fixtures(fixtures)
        .with_api_latency(Duration::ZERO)
        .build()
}

/// A minimal three-screen sub-flow: start redirect, one menu, one end screen.
#[allow(dead_code)]
pub fn create_sub_flow(namespace: &str, label: &str, category: &str) -> SubFlow {
    let mut document = FlowDocument::new("start");
    document.screens.insert(
        "start".to_string(),
        ScreenNode::Start {
            go_to_screen_id: "info".to_string(),
        },
    );
    document.screens.insert(
        "info".to_string(),
        ScreenNode::Menu {
            message_text: format!("Welcome to {}.", label),
            buttons: vec![Button::link("Continue", "all_done")],
            dynamic_buttons: None,
            go_to_screen_id: None,
        },
    );
    document.screens.insert(
        "all_done".to_string(),
        ScreenNode::End {
            message_text: "Request received. Thanks!".to_string(),
        },
    );
    SubFlow {
        namespace: namespace.to_string(),
        label: label.to_string(),
        category: category.to_string(),
        entry_screen: "start".to_string(),
        document,
    }
}

/// A sub-flow whose last interactive screen id reads like a terminus, so the
/// merge engine appends return-to-hub buttons to it.
#[allow(dead_code)]
pub fn create_success_sub_flow(namespace: &str, label: &str, category: &str) -> SubFlow {
    let mut document = FlowDocument::new("start");
    document.screens.insert(
        "start".to_string(),
        ScreenNode::Start {
            go_to_screen_id: "form".to_string(),
        },
    );
    document.screens.insert(
        "form".to_string(),
        ScreenNode::Menu {
            message_text: "Ready to submit your request?".to_string(),
            buttons: vec![Button::link("Submit", "submit_success")],
            dynamic_buttons: None,
            go_to_screen_id: None,
        },
    );
    document.screens.insert(
        "submit_success".to_string(),
        ScreenNode::Menu {
            message_text: "Your request went through.".to_string(),
            buttons: vec![Button::link("View receipt", "receipt")],
            dynamic_buttons: None,
            go_to_screen_id: None,
        },
    );
    document.screens.insert(
        "receipt".to_string(),
        ScreenNode::End {
            message_text: "Receipt #1042. Thanks!".to_string(),
        },
    );
    SubFlow {
        namespace: namespace.to_string(),
        label: label.to_string(),
        category: category.to_string(),
        entry_screen: "start".to_string(),
        document,
    }
}

/// A flow that fetches an account list, then expands one picker button per
/// element of the saved `accounts` array.
#[allow(dead_code)]
pub fn accounts_flow() -> FlowDocument {
    let mut document = FlowDocument::new("fetch_accounts");
    document.screens.insert(
        "fetch_accounts".to_string(),
        ScreenNode::ApiCall {
            api_call: ApiCall {
                url: "https://api.example.com/accounts".to_string(),
                method: "GET".to_string(),
                save_response_to_variable: "accounts".to_string(),
                on_success_go_to_screen_id: Some("pick_account".to_string()),
                on_error_go_to_screen_id: None,
                mock_response: None,
                mock_file: None,
            },
        },
    );
    document.screens.insert(
        "pick_account".to_string(),
        ScreenNode::Message {
            message_text: "Which account?".to_string(),
            buttons: Vec::new(),
            dynamic_buttons: Some(DynamicButtons {
                source_variable: "accounts".to_string(),
                label_template: "{{item.kind}} - x{{item.last4}}".to_string(),
                go_to_screen_id: Some("account_detail".to_string()),
                set_variable_on_click: Some(BTreeMap::from([(
                    "selected_last4".to_string(),
                    "{{item.last4}}".to_string(),
                )])),
                set_variable: Some("selected_account".to_string()),
            }),
            go_to_screen_id: None,
        },
    );
    document.screens.insert(
        "account_detail".to_string(),
        ScreenNode::End {
            message_text: "You picked {{selected_account.kind}} ending in {{selected_last4}}."
                .to_string(),
        },
    );
    document
}

/// Two accounts for the dynamic picker in [`accounts_flow`].
#[allow(dead_code)]
pub fn sample_accounts() -> serde_json::Value {
    json!([
        { "kind": "Checking", "last4": "8041" },
        { "kind": "Savings", "last4": "2210" }
    ])
}

/// Fixtures serving [`sample_accounts`] for the fetch in [`accounts_flow`].
#[allow(dead_code)]
pub fn accounts_fixtures() -> FixtureSet {
    FixtureSet::new().with_response("https://api.example.com/accounts", sample_accounts())
}

/// A scratch directory under the system temp dir for tests that touch disk.
#[allow(dead_code)]
pub fn setup_test_dir() -> PathBuf {
    std::env::temp_dir().join("kaiwa_tests")
}
