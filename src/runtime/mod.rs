//! Conversation runtime.
//!
//! A [`ChatSession`] interprets a [`FlowDocument`] one screen at a time.
//! Screens that need no input (start redirects, API calls, conditionals) are
//! walked through automatically; the walk pauses whenever the document
//! presents choices, and [`ChatSession::choose`] resumes it.

pub mod fixtures;
pub mod template;
pub mod transcript;
pub mod vars;

pub use fixtures::{FixtureProvider, FixtureSet};
pub use template::{render_item_template, render_value, substitute};
pub use transcript::{Speaker, TranscriptEntry, TranscriptFormatter};
pub use vars::VariableStore;

use crate::document::{
    ApiCall, Button, Condition, ConditionOperator, DynamicButtons, FlowDocument, ScreenId,
    ScreenNode,
};
use crate::error::SessionError;
use log::{debug, warn};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Simulated network latency applied before an API screen resolves.
pub const DEFAULT_API_LATENCY: Duration = Duration::from_millis(800);

/// Closing line spoken when a choice with a `null` target ends the session.
pub const GOODBYE_MESSAGE: &str = "Thank you for chatting with us! Have a great day!";

/// Automatic transitions allowed in one step before the walk is halted.
const MAX_HOPS: usize = 64;

const MAIN_MENU_ID: &str = "main_menu";

/// Where the session currently stands between interaction steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Nothing in progress: not yet started, or halted on a dead end.
    #[default]
    Idle,
    /// Choices are on offer and [`ChatSession::choose`] is expected next.
    AwaitingChoice,
    /// The conversation ran to completion.
    Finished,
}

/// Variable writes carried by a choice expanded from a dynamic button list.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicCapture {
    /// The array element this choice was rendered from.
    pub item: Value,
    /// Variable names mapped to item templates, applied when chosen.
    pub writes: BTreeMap<String, String>,
    /// Variable that receives the whole element, if requested.
    pub store_as: Option<String>,
}

/// A single selectable option presented to the visitor.
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub label: String,
    /// Destination screen. `None` ends the conversation with a goodbye.
    pub go_to_screen_id: Option<ScreenId>,
    /// Literal variable write applied when the choice is taken.
    pub set_variable: Option<String>,
    pub set_value: Option<Value>,
    /// Writes carried over from a dynamic button expansion.
    pub capture: Option<DynamicCapture>,
}

impl Choice {
    /// A plain navigation choice.
    pub fn link(label: &str, target: &str) -> Self {
        Self {
            label: label.to_string(),
            go_to_screen_id: Some(target.to_string()),
            set_variable: None,
            set_value: None,
            capture: None,
        }
    }

    /// A choice that ends the conversation when taken.
    pub fn terminal(label: &str) -> Self {
        Self {
            label: label.to_string(),
            go_to_screen_id: None,
            set_variable: None,
            set_value: None,
            capture: None,
        }
    }

    fn from_button(button: &Button) -> Self {
        Self {
            label: button.label.clone(),
            go_to_screen_id: button.go_to_screen_id.clone(),
            set_variable: button.set_variable.clone(),
            set_value: button.set_value.clone(),
            capture: None,
        }
    }
}

/// What one interaction step produced.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// Transcript lines appended by this step, in order.
    pub entries: Vec<TranscriptEntry>,
    /// The options now on offer; empty unless a choice is awaited.
    pub choices: Vec<Choice>,
    /// The state the session landed in.
    pub state: SessionState,
}

/// Configures and constructs a [`ChatSession`].
pub struct SessionBuilder {
    document: FlowDocument,
    fixtures: Box<dyn FixtureProvider>,
    api_latency: Duration,
}

impl SessionBuilder {
    /// Replaces the fixture provider that answers simulated API calls.
    pub fn with_fixtures(mut self, fixtures: impl FixtureProvider + 'static) -> Self {
        self.fixtures = Box::new(fixtures);
        self
    }

    /// Overrides the simulated latency; `Duration::ZERO` disables the pause.
    pub fn with_api_latency(mut self, latency: Duration) -> Self {
        self.api_latency = latency;
        self
    }

    pub fn build(self) -> ChatSession {
        ChatSession {
            document: self.document,
            current_screen_id: None,
            variables: VariableStore::new(),
            history: Vec::new(),
            choices: Vec::new(),
            state: SessionState::Idle,
            fixtures: self.fixtures,
            api_latency: self.api_latency,
        }
    }
}

/// Interprets a [`FlowDocument`] as an interactive conversation.
///
/// A session owns its document and all mutable state: the variable store,
/// the transcript accumulated so far, and the choices currently on offer.
/// It is driven by exactly two calls, [`ChatSession::start`] and then
/// [`ChatSession::choose`] for every selection the visitor makes.
pub struct ChatSession {
    document: FlowDocument,
    current_screen_id: Option<ScreenId>,
    variables: VariableStore,
    history: Vec<TranscriptEntry>,
    choices: Vec<Choice>,
    state: SessionState,
    fixtures: Box<dyn FixtureProvider>,
    api_latency: Duration,
}

impl ChatSession {
    /// A session over `document` with default fixtures and latency.
    pub fn new(document: FlowDocument) -> Self {
        Self::builder(document).build()
    }

    pub fn builder(document: FlowDocument) -> SessionBuilder {
        SessionBuilder {
            document,
            fixtures: Box::new(FixtureSet::new()),
            api_latency: DEFAULT_API_LATENCY,
        }
    }

    /// Begins (or restarts) the conversation from the document's start screen.
    pub fn start(&mut self) -> StepOutcome {
        self.reset();
        let start = self.document.start_screen_id.clone();
        self.run_from(start)
    }

    /// Discards all conversation state without producing output.
    pub fn reset(&mut self) {
        self.variables.clear();
        self.history.clear();
        self.choices.clear();
        self.state = SessionState::Idle;
        self.current_screen_id = None;
    }

    /// Takes the choice at `index` (0-based) and walks the flow until it
    /// pauses again.
    ///
    /// Choosing on a finished session is a harmless no-op; choosing while
    /// nothing is awaited is an error.
    pub fn choose(&mut self, index: usize) -> Result<StepOutcome, SessionError> {
        if self.state == SessionState::Finished {
            return Ok(self.finish_step(Vec::new()));
        }
        if self.state != SessionState::AwaitingChoice {
            return Err(SessionError::NotAwaitingChoice);
        }
        if index >= self.choices.len() {
            return Err(SessionError::InvalidChoice {
                index,
                available: self.choices.len(),
            });
        }

        let choice = self.choices[index].clone();
        self.choices.clear();
        self.apply_choice_writes(&choice);

        let mut entries = vec![TranscriptEntry::user(choice.label.as_str())];
        match choice.go_to_screen_id {
            Some(target) => self.walk(target, &mut entries),
            None => {
                entries.push(TranscriptEntry::bot(GOODBYE_MESSAGE));
                self.state = SessionState::Finished;
                self.current_screen_id = None;
            }
        }
        Ok(self.finish_step(entries))
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The screen the session last rendered, if any.
    pub fn current_screen_id(&self) -> Option<&str> {
        self.current_screen_id.as_deref()
    }

    /// Every transcript line produced since the last [`ChatSession::start`].
    pub fn history(&self) -> &[TranscriptEntry] {
        &self.history
    }

    /// The choices currently awaiting a selection.
    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    /// Mutable access to the variable store, for seeding values up front.
    pub fn variables_mut(&mut self) -> &mut VariableStore {
        &mut self.variables
    }

    pub fn document(&self) -> &FlowDocument {
        &self.document
    }

    fn run_from(&mut self, screen_id: ScreenId) -> StepOutcome {
        let mut entries = Vec::new();
        self.walk(screen_id, &mut entries);
        self.finish_step(entries)
    }

    /// Walks screens starting at `screen_id`, appending transcript lines,
    /// until the document asks for input, finishes, or dead-ends.
    fn walk(&mut self, screen_id: ScreenId, entries: &mut Vec<TranscriptEntry>) {
        let mut next = Some(screen_id);
        let mut hops = 0usize;

        while let Some(id) = next.take() {
            hops += 1;
            if hops > MAX_HOPS {
                warn!("Walk exceeded {} transitions at '{}'; halting", MAX_HOPS, id);
                self.state = SessionState::Idle;
                break;
            }
            self.current_screen_id = Some(id.clone());

            let Some(node) = self.document.screen(&id).cloned() else {
                entries.push(TranscriptEntry::bot(format!(
                    "Error: Screen not found - {}",
                    id
                )));
                self.state = SessionState::Idle;
                break;
            };

            match node {
                ScreenNode::Start { go_to_screen_id } => {
                    next = Some(go_to_screen_id);
                }

                ScreenNode::Message {
                    message_text,
                    buttons,
                    dynamic_buttons,
                    ..
                }
                | ScreenNode::Menu {
                    message_text,
                    buttons,
                    dynamic_buttons,
                    ..
                } => {
                    entries.push(TranscriptEntry::bot(substitute(
                        &message_text,
                        &self.variables,
                    )));
                    // Labels are display text, never templates; only dynamic
                    // buttons render through a template.
                    let mut choices: Vec<Choice> =
                        buttons.iter().map(Choice::from_button).collect();
                    if let Some(config) = &dynamic_buttons {
                        choices.extend(self.expand_dynamic(config));
                    }
                    if choices.is_empty() {
                        warn!("Screen '{}' offers no choices; halting", id);
                        self.state = SessionState::Idle;
                    } else {
                        self.choices = choices;
                        self.state = SessionState::AwaitingChoice;
                    }
                    break;
                }

                ScreenNode::ApiCall { api_call } => {
                    if !self.api_latency.is_zero() {
                        std::thread::sleep(self.api_latency);
                    }
                    debug!("{} {} (simulated)", api_call.method, api_call.url);
                    match self.resolve_mock(&api_call) {
                        Some(response) => {
                            if !api_call.save_response_to_variable.is_empty() {
                                self.variables
                                    .set(&api_call.save_response_to_variable, response);
                            }
                            match api_call.on_success_go_to_screen_id {
                                Some(target) => next = Some(target),
                                None => {
                                    self.state = SessionState::Idle;
                                    break;
                                }
                            }
                        }
                        None => {
                            warn!("No fixture answers '{}'", api_call.url);
                            match api_call.on_error_go_to_screen_id {
                                Some(target) => next = Some(target),
                                None => {
                                    self.state = SessionState::Idle;
                                    break;
                                }
                            }
                        }
                    }
                }

                ScreenNode::Conditional {
                    condition,
                    go_to_screen_id,
                    on_false_go_to_screen_id,
                } => {
                    let taken = evaluate_condition(&condition, &self.variables);
                    debug!("Condition on '{}' evaluated {}", condition.variable, taken);
                    let target = if taken {
                        go_to_screen_id
                    } else {
                        on_false_go_to_screen_id
                    };
                    match target {
                        Some(t) => next = Some(t),
                        None => {
                            self.state = SessionState::Idle;
                            break;
                        }
                    }
                }

                ScreenNode::End { message_text } => {
                    entries.push(TranscriptEntry::bot(substitute(
                        &message_text,
                        &self.variables,
                    )));
                    self.offer_continuation(&id, entries);
                    break;
                }
            }
        }
    }

    /// Presents follow-up options after an end screen instead of going silent.
    ///
    /// In a merged document the options are sibling services from the same
    /// category menu plus the main menu; standalone documents get a plain
    /// restart offer.
    fn offer_continuation(&mut self, current: &str, entries: &mut Vec<TranscriptEntry>) {
        let mut choices = Vec::new();
        let prompt = if self.document.contains(MAIN_MENU_ID) {
            if let Some((menu_id, own_score)) = self.find_category_menu(current) {
                choices.extend(self.sibling_choices(current, &menu_id, own_score));
            }
            choices.push(Choice::link("Explore Other Services", MAIN_MENU_ID));
            choices.push(Choice::terminal("Done"));
            "What else can I help you with?"
        } else {
            let start = self.document.start_screen_id.clone();
            choices.push(Choice::link("Start Over", &start));
            "Is there anything else I can help you with?"
        };
        entries.push(TranscriptEntry::bot(prompt));
        self.choices = choices;
        self.state = SessionState::AwaitingChoice;
    }

    /// Locates the category menu that routes into the screen's own service,
    /// scored by how many id segments the menu's best button shares with it.
    fn find_category_menu(&self, current: &str) -> Option<(ScreenId, usize)> {
        let mut best: Option<(ScreenId, usize)> = None;
        for (id, node) in &self.document.screens {
            if !id.ends_with("_menu") || id == MAIN_MENU_ID {
                continue;
            }
            let Some(buttons) = node.buttons() else {
                continue;
            };
            let score = buttons
                .iter()
                .filter_map(|button| button.go_to_screen_id.as_deref())
                .map(|target| common_segments(current, target))
                .max()
                .unwrap_or(0);
            if score == 0 {
                continue;
            }
            // Id tie-break keeps the scan deterministic over the hash map.
            let better = match &best {
                None => true,
                Some((best_id, best_score)) => {
                    score > *best_score || (score == *best_score && *id < *best_id)
                }
            };
            if better {
                best = Some((id.clone(), score));
            }
        }
        best
    }

    /// Up to three entries from the category menu that lead somewhere other
    /// than the service just completed.
    fn sibling_choices(&self, current: &str, menu_id: &str, own_score: usize) -> Vec<Choice> {
        let Some(buttons) = self.document.screen(menu_id).and_then(ScreenNode::buttons) else {
            return Vec::new();
        };
        buttons
            .iter()
            .filter(|button| {
                let Some(target) = button.go_to_screen_id.as_deref() else {
                    return false;
                };
                if target == MAIN_MENU_ID || button.label.contains("Main Menu") {
                    return false;
                }
                common_segments(current, target) < own_score
            })
            .take(3)
            .map(Choice::from_button)
            .collect()
    }

    fn expand_dynamic(&self, config: &DynamicButtons) -> Vec<Choice> {
        let Some(value) = self.variables.resolve(&config.source_variable) else {
            debug!("Dynamic button source '{}' is not set", config.source_variable);
            return Vec::new();
        };
        let Some(items) = value.as_array() else {
            warn!(
                "Dynamic button source '{}' is not an array",
                config.source_variable
            );
            return Vec::new();
        };
        items
            .iter()
            .map(|item| Choice {
                label: render_item_template(&config.label_template, item),
                go_to_screen_id: config.go_to_screen_id.clone(),
                set_variable: None,
                set_value: None,
                capture: Some(DynamicCapture {
                    item: item.clone(),
                    writes: config.set_variable_on_click.clone().unwrap_or_default(),
                    store_as: config.set_variable.clone(),
                }),
            })
            .collect()
    }

    fn apply_choice_writes(&mut self, choice: &Choice) {
        if let (Some(name), Some(value)) = (&choice.set_variable, &choice.set_value) {
            if !name.is_empty() {
                self.variables.set(name, value.clone());
            }
        }
        if let Some(capture) = &choice.capture {
            for (name, item_template) in &capture.writes {
                let rendered = render_item_template(item_template, &capture.item);
                self.variables.set(name, Value::String(rendered));
            }
            if let Some(name) = &capture.store_as {
                if !name.is_empty() {
                    self.variables.set(name, capture.item.clone());
                }
            }
        }
    }

    /// Resolution order: inline response, then fixture file (a missing file
    /// falls through), then the provider's URL table.
    fn resolve_mock(&self, api: &ApiCall) -> Option<Value> {
        if let Some(inline) = &api.mock_response {
            return Some(inline.clone());
        }
        if let Some(name) = &api.mock_file {
            if let Some(response) = self.fixtures.by_file(name) {
                return Some(response);
            }
        }
        self.fixtures.by_url(&api.url)
    }

    fn finish_step(&mut self, entries: Vec<TranscriptEntry>) -> StepOutcome {
        self.history.extend(entries.iter().cloned());
        StepOutcome {
            entries,
            choices: self.choices.clone(),
            state: self.state,
        }
    }
}

/// Evaluates a conditional screen's test against the current variables.
///
/// Comparison is deliberately loose, matching how authored flows mix strings
/// and numbers: `"42"` equals `42`, booleans compare as `0`/`1`, and a
/// missing variable equals JSON `null`.
pub fn evaluate_condition(condition: &Condition, store: &VariableStore) -> bool {
    let resolved = store.resolve(&condition.variable);
    match condition.operator {
        ConditionOperator::Exists => resolved.is_some_and(|value| !value.is_null()),
        ConditionOperator::Equals => {
            loosely_equal(resolved.unwrap_or(&Value::Null), &condition.value)
        }
        ConditionOperator::GreaterThan => {
            match (resolved.and_then(coerce_number), coerce_number(&condition.value)) {
                (Some(left), Some(right)) => left > right,
                _ => false,
            }
        }
    }
}

fn loosely_equal(left: &Value, right: &Value) -> bool {
    if left == right {
        return true;
    }
    match (coerce_number(left), coerce_number(right)) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Leading `_`-separated segments two screen ids have in common.
fn common_segments(a: &str, b: &str) -> usize {
    a.split('_')
        .zip(b.split('_'))
        .take_while(|(left, right)| left == right)
        .count()
}
