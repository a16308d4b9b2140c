//! Composition of individually authored sub-flows into one master bot.
//!
//! Each sub-flow is namespaced through the reference rewriter, synthesized
//! navigation menus are laid over the top, and screens that end a sub-flow's
//! journey get return-to-hub buttons appended. The result is a single
//! self-contained document whose hub is the `main_menu` screen.

use crate::document::{Button, FlowDocument, ScreenId, ScreenKind, ScreenNode};
use crate::error::MergeError;
use crate::rewrite::rewrite_with_prefix;
use ahash::AHashSet;
use itertools::Itertools;
use log::{debug, info};

pub mod catalog;

pub use catalog::{CatalogEntry, TemplateCatalog};

/// How the synthesized main menu organizes merged sub-flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuStyle {
    /// A two-level hub: the main menu lists categories, each category menu
    /// lists its member sub-flows.
    #[default]
    Category,
    /// A single-level hub: the main menu lists every sub-flow directly.
    Flat,
}

/// Presentation settings for a composed master bot.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub name: String,
    pub welcome_message: String,
    pub menu_style: MenuStyle,
    pub include_support: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "Assistant".to_string(),
            welcome_message: "Welcome! How can I help you today?".to_string(),
            menu_style: MenuStyle::Category,
            include_support: true,
        }
    }
}

/// One sub-flow source handed to the merge engine, with its catalog metadata.
#[derive(Debug, Clone)]
pub struct SubFlow {
    pub namespace: String,
    pub label: String,
    pub category: String,
    pub entry_screen: ScreenId,
    pub document: FlowDocument,
}

impl SubFlow {
    /// The master-document id of this sub-flow's entry screen.
    pub fn entry_id(&self) -> ScreenId {
        format!("{}_{}", self.namespace, self.entry_screen)
    }
}

/// Judges whether a screen ends a sub-flow's journey and should link back to
/// the hub.
pub type TerminalPredicate = Box<dyn Fn(&ScreenNode, &str) -> bool + Send + Sync>;

/// Default terminus heuristic: End screens always qualify; Message and Menu
/// screens qualify when their original id reads like
/// success/complete/confirmation/end or their text mentions a completed
/// outcome. Fuzzy on purpose; swap it out through the builder when your
/// flows name things differently.
pub fn looks_terminal(node: &ScreenNode, original_id: &str) -> bool {
    const ID_HINTS: [&str; 4] = ["success", "complete", "confirmation", "end"];
    const TEXT_HINTS: [&str; 3] = ["success", "complete", "confirmed"];
    match node.kind() {
        ScreenKind::End => true,
        ScreenKind::Message | ScreenKind::Menu => {
            ID_HINTS.iter().any(|hint| original_id.contains(hint))
                || node.message_text().is_some_and(|text| {
                    let text = text.to_lowercase();
                    TEXT_HINTS.iter().any(|hint| text.contains(hint))
                })
        }
        _ => false,
    }
}

pub struct Merger {
    config: BotConfig,
    is_terminal: TerminalPredicate,
}

pub struct MergerBuilder {
    config: BotConfig,
    is_terminal: TerminalPredicate,
}

impl MergerBuilder {
    pub fn new(config: BotConfig) -> Self {
        Self {
            config,
            is_terminal: Box::new(looks_terminal),
        }
    }

    /// Replaces the terminus heuristic used for return-to-hub augmentation.
    pub fn with_terminal_predicate(
        mut self,
        predicate: impl Fn(&ScreenNode, &str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.is_terminal = Box::new(predicate);
        self
    }

    pub fn build(self) -> Merger {
        Merger {
            config: self.config,
            is_terminal: self.is_terminal,
        }
    }
}

impl Merger {
    pub fn builder(config: BotConfig) -> MergerBuilder {
        MergerBuilder::new(config)
    }

    /// A merger with the default terminus heuristic.
    pub fn new(config: BotConfig) -> Self {
        MergerBuilder::new(config).build()
    }

    /// Composes the given sub-flows into one master document.
    ///
    /// All-or-nothing: any failure leaves no partial output behind. The
    /// rewritten screen-id sets of distinct sub-flows never intersect, and a
    /// collision with a synthesized screen aborts the merge.
    pub fn merge(&self, sub_flows: &[SubFlow]) -> Result<FlowDocument, MergeError> {
        if sub_flows.is_empty() {
            return Err(MergeError::NoSubFlows);
        }
        let mut namespaces = AHashSet::with_capacity(sub_flows.len());
        for flow in sub_flows {
            if !namespaces.insert(flow.namespace.as_str()) {
                return Err(MergeError::DuplicateNamespace(flow.namespace.clone()));
            }
        }

        info!(
            "Composing master bot '{}' from {} sub-flows",
            self.config.name,
            sub_flows.len()
        );
        let mut master = FlowDocument::new("main_menu");
        insert_screen(&mut master, "main_menu".to_string(), self.main_menu(sub_flows))?;
        if self.config.menu_style == MenuStyle::Category {
            for (menu_id, menu) in self.category_menus(sub_flows) {
                insert_screen(&mut master, menu_id, menu)?;
            }
        }
        if self.config.include_support {
            insert_screen(&mut master, "support_screen".to_string(), support_screen())?;
        }

        for flow in sub_flows {
            debug!(
                "Merging sub-flow '{}' under namespace '{}'",
                flow.label, flow.namespace
            );
            let mut rewritten = rewrite_with_prefix(&flow.document, &flow.namespace);
            for original_id in flow.document.screens.keys() {
                let new_id = format!("{}_{}", flow.namespace, original_id);
                let Some(mut node) = rewritten.screens.remove(&new_id) else {
                    continue;
                };
                if original_id != "end_flow" && (self.is_terminal)(&node, original_id) {
                    self.augment_terminal(&mut node, &flow.category);
                }
                insert_screen(&mut master, new_id, node)?;
            }
        }

        info!("Master bot composed: {} screens", master.screens.len());
        Ok(master)
    }

    /// Loads a selection from a catalog and merges it. The first template
    /// that fails to load aborts the whole composition.
    pub fn merge_catalog(
        &self,
        catalog: &TemplateCatalog,
        selection: &[String],
    ) -> Result<FlowDocument, MergeError> {
        let sub_flows = catalog.load_sub_flows(selection)?;
        self.merge(&sub_flows)
    }

    fn main_menu(&self, sub_flows: &[SubFlow]) -> ScreenNode {
        let mut buttons: Vec<Button> = match self.config.menu_style {
            MenuStyle::Category => sub_flows
                .iter()
                .map(|flow| flow.category.as_str())
                .unique()
                .map(|category| Button::link(&humanize(category), &category_menu_id(category)))
                .collect(),
            MenuStyle::Flat => sub_flows
                .iter()
                .map(|flow| Button::link(&flow.label, &flow.entry_id()))
                .collect(),
        };
        if self.config.include_support {
            buttons.push(Button::link("Contact Support", "support_screen"));
        }
        ScreenNode::Menu {
            message_text: self.config.welcome_message.clone(),
            buttons,
            dynamic_buttons: None,
            go_to_screen_id: None,
        }
    }

    fn category_menus(&self, sub_flows: &[SubFlow]) -> Vec<(ScreenId, ScreenNode)> {
        sub_flows
            .iter()
            .map(|flow| flow.category.as_str())
            .unique()
            .map(|category| {
                let mut buttons: Vec<Button> = sub_flows
                    .iter()
                    .filter(|flow| flow.category == category)
                    .map(|flow| Button::link(&flow.label, &flow.entry_id()))
                    .collect();
                buttons.push(Button::link("Back to Main Menu", "main_menu"));
                let menu = ScreenNode::Menu {
                    message_text: format!("{} - What would you like to do?", humanize(category)),
                    buttons,
                    dynamic_buttons: None,
                    go_to_screen_id: None,
                };
                (category_menu_id(category), menu)
            })
            .collect()
    }

    // Screens that already link to the hub are left alone; End screens reach
    // it through the runtime's continuation synthesis instead.
    fn augment_terminal(&self, node: &mut ScreenNode, category: &str) {
        let Some(buttons) = node.buttons_mut() else {
            return;
        };
        let already_linked = buttons.iter().any(|button| {
            button.go_to_screen_id.as_deref() == Some("main_menu")
                || button.label.contains("Main Menu")
        });
        if already_linked {
            return;
        }
        if self.config.menu_style == MenuStyle::Category {
            buttons.push(Button::link("Back to Services", &category_menu_id(category)));
        }
        buttons.push(Button::link("Main Menu", "main_menu"));
        promote_to_menu(node);
    }
}

/// Screen id of the synthesized menu for a category.
pub fn category_menu_id(category: &str) -> ScreenId {
    format!("{category}_menu")
}

// A message screen that gained static buttons is a menu in canonical form;
// without the promotion it would re-classify on the next parse.
fn promote_to_menu(node: &mut ScreenNode) {
    if let ScreenNode::Message {
        message_text,
        buttons,
        dynamic_buttons,
        go_to_screen_id,
    } = node
    {
        if !buttons.is_empty() {
            *node = ScreenNode::Menu {
                message_text: std::mem::take(message_text),
                buttons: std::mem::take(buttons),
                dynamic_buttons: dynamic_buttons.take(),
                go_to_screen_id: go_to_screen_id.take(),
            };
        }
    }
}

fn insert_screen(
    master: &mut FlowDocument,
    id: ScreenId,
    node: ScreenNode,
) -> Result<(), MergeError> {
    if master.screens.contains_key(&id) {
        return Err(MergeError::ScreenIdCollision(id));
    }
    master.screens.insert(id, node);
    Ok(())
}

fn support_screen() -> ScreenNode {
    ScreenNode::Menu {
        message_text:
            "Our support team is here to help. Reach us any time at support@example.com."
                .to_string(),
        buttons: vec![Button::link("Back to Main Menu", "main_menu")],
        dynamic_buttons: None,
        go_to_screen_id: None,
    }
}

/// Turns a category id like `credit_cards` into a display label like
/// `Credit Cards`.
fn humanize(category: &str) -> String {
    category
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .join(" ")
}
