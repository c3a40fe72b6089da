//! Toolbar model. Items only describe what they run; whether an item is
//! enabled is asked of its command against the current state, without
//! building a transaction.

use crate::commands::{EditorAction, WrapInList};
use crate::lists::{ListAttrs, ListKind, ListStyle};
use crate::model::Schema;
use crate::state::{EditorState, Transaction};

#[derive(Debug, Clone)]
pub struct MenuItem {
    pub id: String,
    pub label: String,
    pub action: EditorAction,
}

impl MenuItem {
    pub fn new(id: impl Into<String>, label: impl Into<String>, action: EditorAction) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            action,
        }
    }

    pub fn enabled(&self, state: &EditorState) -> bool {
        self.action.can_execute(state)
    }

    pub fn run(&self, state: &EditorState, dispatch: &mut dyn FnMut(Transaction)) -> bool {
        self.action.execute(state, Some(dispatch))
    }
}

/// What a toolbar shows for one item in a given state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemView {
    pub id: String,
    pub label: String,
    pub enabled: bool,
}

/// Toolbar items in display order, grouped by the index of their group.
#[derive(Debug, Clone, Default)]
pub struct Menu {
    groups: Vec<Vec<MenuItem>>,
}

impl Menu {
    /// History items, then one group per list kind with an item per style.
    pub fn for_schema(schema: &Schema) -> Self {
        let mut groups = vec![vec![
            MenuItem::new("undo", "Undo", EditorAction::Undo),
            MenuItem::new("redo", "Redo", EditorAction::Redo),
        ]];
        for kind in [ListKind::Ordered, ListKind::Bullet] {
            let Some(list_type) = schema.node_type(kind.node_name()) else {
                continue;
            };
            let items = kind
                .styles()
                .iter()
                .map(|&style| {
                    let attrs = ListAttrs::new(kind, 1, style).to_attrs();
                    MenuItem::new(
                        format!("{}:{}", kind.node_name(), style.keyword()),
                        style_label(kind, style),
                        EditorAction::WrapInList(WrapInList::new(list_type.clone(), Some(attrs))),
                    )
                })
                .collect();
            groups.push(items);
        }
        Self { groups }
    }

    pub fn groups(&self) -> &[Vec<MenuItem>] {
        &self.groups
    }

    pub fn items(&self) -> impl Iterator<Item = &MenuItem> {
        self.groups.iter().flatten()
    }

    pub fn item(&self, id: &str) -> Option<&MenuItem> {
        self.items().find(|item| item.id == id)
    }

    /// Every item with its enabled flag for `state`.
    pub fn view(&self, state: &EditorState) -> Vec<ItemView> {
        self.items()
            .map(|item| ItemView {
                id: item.id.clone(),
                label: item.label.clone(),
                enabled: item.enabled(state),
            })
            .collect()
    }
}

fn style_label(kind: ListKind, style: ListStyle) -> String {
    let noun = match kind {
        ListKind::Ordered => "Numbered list",
        ListKind::Bullet => "Bullet list",
    };
    format!("{noun} ({} {})", style.marker(1), style.marker(2))
}
