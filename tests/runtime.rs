//! Conversation runtime tests: walking flows, choices, variables, and
//! simulated API calls.

mod common;

use common::*;
use kaiwa::document::{ApiCall, Button, Condition, ConditionOperator, ScreenNode};
use kaiwa::prelude::*;
use kaiwa::runtime::{evaluate_condition, substitute, GOODBYE_MESSAGE, TranscriptEntry};
use serde_json::json;
use std::fs;

/// An API screen wired straight into an end screen that reads its response.
fn balance_call() -> ApiCall {
    ApiCall {
        url: "https://api.example.com/balance".to_string(),
        method: "GET".to_string(),
        save_response_to_variable: "data".to_string(),
        on_success_go_to_screen_id: Some("done".to_string()),
        on_error_go_to_screen_id: None,
        mock_response: None,
        mock_file: None,
    }
}

fn single_call_flow(api_call: ApiCall) -> FlowDocument {
    let mut document = FlowDocument::new("fetch");
    document
        .screens
        .insert("fetch".to_string(), ScreenNode::ApiCall { api_call });
    document.screens.insert(
        "done".to_string(),
        ScreenNode::End {
            message_text: "Balance: {{data.balance}}".to_string(),
        },
    );
    document
}

/// Three services across two categories, merged into one master document.
fn merged_master() -> FlowDocument {
    let flows = vec![
        create_sub_flow("balance_check", "Check Balance", "accounts"),
        create_sub_flow("transfer_funds", "Transfer Funds", "accounts"),
        create_sub_flow("card_block", "Block a Card", "cards"),
    ];
    Merger::new(BotConfig::default())
        .merge(&flows)
        .expect("Failed to merge sub-flows")
}

#[test]
fn test_variable_store_resolves_dotted_paths() {
    let mut store = VariableStore::new();
    store.set("acct", json!({ "balance": 42, "owner": { "name": "Mei" } }));
    store.set("accounts", sample_accounts());

    assert_eq!(store.resolve("acct.balance"), Some(&json!(42)));
    assert_eq!(store.resolve("acct.owner.name"), Some(&json!("Mei")));
    assert_eq!(store.resolve("accounts.1.last4"), Some(&json!("2210")));
    assert_eq!(store.resolve("acct.owner.missing"), None);
    assert_eq!(store.resolve("accounts.7"), None);
    assert_eq!(store.resolve("ghost"), None);
}

#[test]
fn test_substitution_renders_scalars_and_keeps_unresolved() {
    let mut store = VariableStore::new();
    store.set("name", json!("Mei"));
    store.set("balance", json!(42.0));
    store.set("ratio", json!(0.5));
    store.set("active", json!(true));

    let rendered = substitute(
        "Hi {{name}}: {{balance}} left, ratio {{ ratio }}, active {{active}}, {{ghost}}",
        &store,
    );
    assert_eq!(rendered, "Hi Mei: 42 left, ratio 0.5, active true, {{ghost}}");
    // Substituting the output again changes nothing.
    assert_eq!(substitute(&rendered, &store), rendered);
}

#[test]
fn test_condition_operators_compare_loosely() {
    let mut store = VariableStore::new();
    store.set("count", json!(15));
    store.set("status", json!("42"));
    store.set("active", json!(true));
    store.set("note", json!(null));
    store.set("acct", json!({ "balance": 42 }));

    let gt = |variable: &str, value: serde_json::Value| Condition {
        variable: variable.to_string(),
        operator: ConditionOperator::GreaterThan,
        value,
    };
    let eq = |variable: &str, value: serde_json::Value| Condition {
        variable: variable.to_string(),
        operator: ConditionOperator::Equals,
        value,
    };
    let exists = |variable: &str| Condition {
        variable: variable.to_string(),
        operator: ConditionOperator::Exists,
        value: json!(null),
    };

    assert!(evaluate_condition(&gt("count", json!("10")), &store));
    assert!(!evaluate_condition(&gt("count", json!(15)), &store));
    assert!(!evaluate_condition(&gt("count", json!("abc")), &store));
    assert!(evaluate_condition(&gt("acct.balance", json!(10)), &store));

    assert!(evaluate_condition(&eq("status", json!(42)), &store));
    assert!(!evaluate_condition(&eq("status", json!("41")), &store));
    assert!(evaluate_condition(&eq("active", json!(1)), &store));
    // A variable that was never set compares equal to null.
    assert!(evaluate_condition(&eq("ghost", json!(null)), &store));

    assert!(evaluate_condition(&exists("status"), &store));
    assert!(!evaluate_condition(&exists("note"), &store));
    assert!(!evaluate_condition(&exists("ghost"), &store));
}

#[test]
fn test_balance_flow_reaches_the_end_screen() {
    let mut session = session_with_fixtures(balance_check_flow(), balance_fixtures());

    let step = session.start();
    assert_eq!(step.state, SessionState::AwaitingChoice);
    assert_eq!(
        step.entries,
        vec![TranscriptEntry::bot("Hi! What would you like to do?")]
    );
    assert_eq!(step.choices.len(), 2);

    let step = session
        .choose(0)
        .expect("Failed to choose the balance check");
    let texts: Vec<&str> = step
        .entries
        .iter()
        .map(|entry| entry.text.as_str())
        .collect();
    assert_eq!(texts[0], "Check my balance");
    assert!(texts.contains(&"Balance: 42"));
    assert_eq!(session.current_screen_id(), Some("show_balance"));
    assert_eq!(
        session.variables().resolve("balance_data.balance"),
        Some(&json!(42))
    );
}

#[test]
fn test_standalone_end_offers_a_restart() {
    let mut session = session_with_fixtures(balance_check_flow(), balance_fixtures());
    session.start();

    let step = session.choose(0).expect("Failed to choose");
    assert_eq!(step.state, SessionState::AwaitingChoice);
    assert_eq!(
        step.entries.last().map(|entry| entry.text.as_str()),
        Some("Is there anything else I can help you with?")
    );
    // A standalone document offers the single restart choice, nothing else.
    let labels: Vec<&str> = step
        .choices
        .iter()
        .map(|choice| choice.label.as_str())
        .collect();
    assert_eq!(labels, vec!["Start Over"]);

    // Starting over walks back to the welcome menu.
    let step = session.choose(0).expect("Failed to start over");
    assert_eq!(step.state, SessionState::AwaitingChoice);
    assert!(step
        .entries
        .iter()
        .any(|entry| entry.text == "Hi! What would you like to do?"));
}

#[test]
fn test_declining_the_menu_says_goodbye() {
    let mut session = offline_session(balance_check_flow());
    session.start();

    let step = session.choose(1).expect("Failed to decline");
    assert_eq!(step.state, SessionState::Finished);
    assert_eq!(
        step.entries,
        vec![
            TranscriptEntry::user("Nothing, thanks"),
            TranscriptEntry::bot(GOODBYE_MESSAGE),
        ]
    );
    assert!(step.choices.is_empty());
    assert!(session.current_screen_id().is_none());
}

#[test]
fn test_finished_sessions_ignore_further_choices() {
    let mut session = offline_session(balance_check_flow());
    session.start();
    session.choose(1).expect("Failed to decline");

    let step = session
        .choose(0)
        .expect("choosing after the end should be harmless");
    assert!(step.entries.is_empty());
    assert!(step.choices.is_empty());
    assert_eq!(step.state, SessionState::Finished);
    assert_eq!(session.state(), SessionState::Finished);
}

#[test]
fn test_api_failure_takes_the_error_branch() {
    // No fixture answers the balance URL, so the simulated call fails.
    let mut session = offline_session(balance_check_flow());
    session.start();

    let step = session.choose(0).expect("Failed to choose");
    let texts: Vec<&str> = step
        .entries
        .iter()
        .map(|entry| entry.text.as_str())
        .collect();
    assert!(texts.contains(&"Sorry, something went wrong."));
    assert!(session.variables().get("balance_data").is_none());
}

#[test]
fn test_inline_mock_beats_the_url_fixture() {
    let mut api_call = balance_call();
    api_call.mock_response = Some(json!({ "balance": 7 }));
    let mut session = session_with_fixtures(single_call_flow(api_call), balance_fixtures());

    let step = session.start();
    assert!(step.entries.iter().any(|entry| entry.text == "Balance: 7"));
}

#[test]
fn test_unreadable_mock_file_falls_back_to_the_url() {
    let mut api_call = balance_call();
    api_call.mock_file = Some("no_such_fixture.json".to_string());
    let mut session = session_with_fixtures(single_call_flow(api_call), balance_fixtures());

    let step = session.start();
    assert!(step.entries.iter().any(|entry| entry.text == "Balance: 42"));
}

#[test]
fn test_mock_file_resolves_against_the_fixture_dir() {
    let dir = setup_test_dir().join("mock_files");
    fs::create_dir_all(&dir).expect("Failed to create test dir");
    fs::write(dir.join("balance.json"), r#"{ "balance": 9000 }"#)
        .expect("Failed to write fixture");

    let mut api_call = balance_call();
    api_call.mock_file = Some("balance.json".to_string());
    let fixtures = FixtureSet::new().with_base_dir(dir.to_str().expect("utf-8 path"));
    let mut session = session_with_fixtures(single_call_flow(api_call), fixtures);

    let step = session.start();
    assert!(step
        .entries
        .iter()
        .any(|entry| entry.text == "Balance: 9000"));

    fs::remove_dir_all(&dir).expect("Failed to clean up");
}

#[test]
fn test_fixture_files_map_urls_to_responses() {
    let dir = setup_test_dir().join("fixture_file");
    fs::create_dir_all(&dir).expect("Failed to create test dir");
    let path = dir.join("fixtures.json");
    fs::write(&path, r#"{ "https://api.example.com/balance": { "balance": 12 } }"#)
        .expect("Failed to write fixtures");

    let fixtures =
        FixtureSet::from_file(path.to_str().expect("utf-8 path")).expect("Failed to load fixtures");
    assert_eq!(fixtures.len(), 1);
    assert_eq!(
        fixtures.by_url("https://api.example.com/balance"),
        Some(json!({ "balance": 12 }))
    );
    assert_eq!(fixtures.by_url("https://api.example.com/other"), None);

    fs::remove_dir_all(&dir).expect("Failed to clean up");
}

#[test]
fn test_blank_save_variable_skips_the_write() {
    let mut api_call = balance_call();
    api_call.save_response_to_variable = String::new();
    api_call.mock_response = Some(json!({ "balance": 1 }));
    let mut session = offline_session(single_call_flow(api_call));

    let step = session.start();
    assert!(session.variables().is_empty());
    // The end screen cannot substitute what was never stored.
    assert!(step
        .entries
        .iter()
        .any(|entry| entry.text == "Balance: {{data.balance}}"));
}

#[test]
fn test_dynamic_buttons_expand_per_item() {
    let mut session = session_with_fixtures(accounts_flow(), accounts_fixtures());

    let step = session.start();
    assert_eq!(step.state, SessionState::AwaitingChoice);
    let labels: Vec<&str> = step
        .choices
        .iter()
        .map(|choice| choice.label.as_str())
        .collect();
    assert_eq!(labels, vec!["Checking - x8041", "Savings - x2210"]);
}

#[test]
fn test_dynamic_choices_capture_the_picked_item() {
    let mut session = session_with_fixtures(accounts_flow(), accounts_fixtures());
    session.start();

    let step = session.choose(0).expect("Failed to pick an account");
    assert!(step
        .entries
        .iter()
        .any(|entry| entry.text == "You picked Checking ending in 8041."));
    assert_eq!(
        session.variables().get("selected_last4"),
        Some(&json!("8041"))
    );
    assert_eq!(
        session.variables().resolve("selected_account.kind"),
        Some(&json!("Checking"))
    );
}

#[test]
fn test_empty_dynamic_source_offers_nothing_and_halts() {
    let fixtures = FixtureSet::new().with_response("https://api.example.com/accounts", json!([]));
    let mut session = session_with_fixtures(accounts_flow(), fixtures);

    let step = session.start();
    assert_eq!(step.state, SessionState::Idle);
    assert!(step.choices.is_empty());
    assert!(step
        .entries
        .iter()
        .any(|entry| entry.text == "Which account?"));
}

#[test]
fn test_static_buttons_write_their_variable() {
    let mut document = FlowDocument::new("plans");
    document.screens.insert(
        "plans".to_string(),
        ScreenNode::Menu {
            message_text: "Pick a plan.".to_string(),
            buttons: vec![Button {
                label: "Premium".to_string(),
                go_to_screen_id: Some("done".to_string()),
                set_variable: Some("tier".to_string()),
                set_value: Some(json!("premium")),
            }],
            dynamic_buttons: None,
            go_to_screen_id: None,
        },
    );
    document.screens.insert(
        "done".to_string(),
        ScreenNode::End {
            message_text: "You are on the {{tier}} plan.".to_string(),
        },
    );

    let mut session = offline_session(document);
    session.start();

    let step = session.choose(0).expect("Failed to choose");
    assert!(step
        .entries
        .iter()
        .any(|entry| entry.text == "You are on the premium plan."));
    assert_eq!(session.variables().get("tier"), Some(&json!("premium")));
}

#[test]
fn test_static_button_labels_are_shown_verbatim() {
    let mut document = single_call_flow(ApiCall {
        on_success_go_to_screen_id: Some("review".to_string()),
        ..balance_call()
    });
    document.screens.insert(
        "review".to_string(),
        ScreenNode::Menu {
            message_text: "Current balance: {{data.balance}}".to_string(),
            buttons: vec![Button::link("Spend {{data.balance}} credits", "done")],
            dynamic_buttons: None,
            go_to_screen_id: None,
        },
    );

    let mut session = session_with_fixtures(document, balance_fixtures());
    let step = session.start();

    // The message resolves its placeholder; the label keeps its braces.
    assert!(step
        .entries
        .iter()
        .any(|entry| entry.text == "Current balance: 42"));
    assert_eq!(step.choices[0].label, "Spend {{data.balance}} credits");

    // The transcript records the label exactly as it was displayed.
    let step = session.choose(0).expect("Failed to choose");
    assert_eq!(
        step.entries.first(),
        Some(&TranscriptEntry::user("Spend {{data.balance}} credits"))
    );
    assert!(step.entries.iter().any(|entry| entry.text == "Balance: 42"));
}

#[test]
fn test_choosing_outside_a_menu_is_rejected() {
    let mut session = offline_session(balance_check_flow());
    let err = session.choose(0).unwrap_err();
    assert!(matches!(err, SessionError::NotAwaitingChoice));

    session.start();
    let err = session.choose(5).unwrap_err();
    assert!(matches!(
        err,
        SessionError::InvalidChoice {
            index: 5,
            available: 2
        }
    ));
}

#[test]
fn test_broken_references_surface_in_the_transcript() {
    let mut document = FlowDocument::new("start");
    document.screens.insert(
        "start".to_string(),
        ScreenNode::Start {
            go_to_screen_id: "ghost".to_string(),
        },
    );

    let mut session = offline_session(document);
    let step = session.start();
    assert_eq!(step.state, SessionState::Idle);
    assert_eq!(
        step.entries,
        vec![TranscriptEntry::bot("Error: Screen not found - ghost")]
    );
}

#[test]
fn test_conditional_without_a_false_branch_halts() {
    let mut document = FlowDocument::new("gate");
    document.screens.insert(
        "gate".to_string(),
        ScreenNode::Conditional {
            condition: Condition {
                variable: "approved".to_string(),
                operator: ConditionOperator::Exists,
                value: json!(null),
            },
            go_to_screen_id: Some("unreached".to_string()),
            on_false_go_to_screen_id: None,
        },
    );

    let mut session = offline_session(document);
    let step = session.start();
    assert_eq!(step.state, SessionState::Idle);
    assert!(step.entries.is_empty());
}

#[test]
fn test_redirect_cycles_are_cut_off() {
    let mut document = FlowDocument::new("a");
    document.screens.insert(
        "a".to_string(),
        ScreenNode::Start {
            go_to_screen_id: "b".to_string(),
        },
    );
    document.screens.insert(
        "b".to_string(),
        ScreenNode::Start {
            go_to_screen_id: "a".to_string(),
        },
    );

    let mut session = offline_session(document);
    let step = session.start();
    assert_eq!(step.state, SessionState::Idle);
    assert!(step.entries.is_empty());
}

#[test]
fn test_merged_end_screens_offer_sibling_services() {
    let mut session = offline_session(merged_master());

    let step = session.start();
    assert_eq!(
        step.entries,
        vec![TranscriptEntry::bot("Welcome! How can I help you today?")]
    );

    let step = session.choose(0).expect("Failed to open Accounts");
    assert!(step
        .entries
        .iter()
        .any(|entry| entry.text == "Accounts - What would you like to do?"));
    let step = session.choose(0).expect("Failed to pick Check Balance");
    assert!(step
        .entries
        .iter()
        .any(|entry| entry.text == "Welcome to Check Balance."));
    let step = session.choose(0).expect("Failed to continue");

    // The end screen keeps the conversation going with nearby services.
    assert_eq!(step.state, SessionState::AwaitingChoice);
    assert!(step
        .entries
        .iter()
        .any(|entry| entry.text == "Request received. Thanks!"));
    assert!(step
        .entries
        .iter()
        .any(|entry| entry.text == "What else can I help you with?"));
    let labels: Vec<&str> = step
        .choices
        .iter()
        .map(|choice| choice.label.as_str())
        .collect();
    assert_eq!(
        labels,
        vec!["Transfer Funds", "Explore Other Services", "Done"]
    );

    // The sibling link drops straight into the other service.
    let step = session.choose(0).expect("Failed to jump to the sibling");
    assert!(step
        .entries
        .iter()
        .any(|entry| entry.text == "Welcome to Transfer Funds."));
}

#[test]
fn test_explore_other_services_returns_to_the_hub() {
    let mut session = offline_session(merged_master());
    session.start();
    session.choose(0).expect("Failed to open Accounts");
    session.choose(0).expect("Failed to pick Check Balance");
    let step = session.choose(0).expect("Failed to continue");
    let explore = step
        .choices
        .iter()
        .position(|choice| choice.label == "Explore Other Services")
        .expect("continuation should offer the main menu");

    let step = session.choose(explore).expect("Failed to head back");
    assert!(step
        .entries
        .iter()
        .any(|entry| entry.text == "Welcome! How can I help you today?"));
    assert_eq!(session.current_screen_id(), Some("main_menu"));
}

#[test]
fn test_transcript_formatting() {
    let entries = vec![TranscriptEntry::bot("Hello!"), TranscriptEntry::user("Hi.")];
    assert_eq!(
        TranscriptFormatter::format_conversation(&entries),
        "Bot: Hello!\nYou: Hi.\n"
    );

    let choices = vec![Choice::link("Check balance", "fetch"), Choice::terminal("Done")];
    assert_eq!(
        TranscriptFormatter::format_choices(&choices),
        "  [1] Check balance\n  [2] Done\n"
    );
}

#[test]
fn test_history_spans_every_step() {
    let mut session = session_with_fixtures(balance_check_flow(), balance_fixtures());
    let first = session.start();
    let second = session.choose(0).expect("Failed to choose");

    let expected: Vec<TranscriptEntry> = first
        .entries
        .iter()
        .chain(second.entries.iter())
        .cloned()
        .collect();
    assert_eq!(session.history(), expected.as_slice());
}

#[test]
fn test_reset_discards_the_conversation() {
    let mut session = session_with_fixtures(balance_check_flow(), balance_fixtures());
    session.start();
    session.choose(0).expect("Failed to choose");
    assert!(!session.history().is_empty());
    assert!(!session.variables().is_empty());

    session.reset();
    assert!(session.history().is_empty());
    assert!(session.variables().is_empty());
    assert!(session.choices().is_empty());
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.current_screen_id().is_none());
}
