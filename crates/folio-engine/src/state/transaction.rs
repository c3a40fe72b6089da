use std::ops::{Deref, DerefMut};

use super::{EditorState, TextSelection};
use crate::transform::Transform;

/// How a transaction relates to the undo history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    /// A regular edit, recorded as an undo step when it changes the document.
    Record,
    /// Not recorded; the redo stack is kept.
    Skip,
    Undo,
    Redo,
}

/// A [`Transform`] started from an editor state, plus the selection and view
/// hints that go with it.
#[derive(Debug, Clone)]
pub struct Transaction {
    transform: Transform,
    start_selection: TextSelection,
    selection: Option<TextSelection>,
    scroll_into_view: bool,
    history: HistoryAction,
}

impl Transaction {
    pub fn new(state: &EditorState) -> Self {
        Self {
            transform: Transform::new(state.doc().clone()),
            start_selection: state.selection(),
            selection: None,
            scroll_into_view: false,
            history: HistoryAction::Record,
        }
    }

    /// The explicitly set selection, or the starting one mapped through the steps.
    pub fn selection(&self) -> TextSelection {
        self.selection
            .unwrap_or_else(|| self.start_selection.map(self.doc(), self.mapping()))
    }

    pub fn selection_set(&self) -> bool {
        self.selection.is_some()
    }

    pub fn set_selection(&mut self, selection: TextSelection) -> &mut Self {
        self.selection = Some(selection);
        self
    }

    /// Ask the view to bring the selection into view once applied.
    pub fn scroll_into_view(&mut self) -> &mut Self {
        self.scroll_into_view = true;
        self
    }

    pub fn scrolled_into_view(&self) -> bool {
        self.scroll_into_view
    }

    pub fn history_action(&self) -> HistoryAction {
        self.history
    }

    pub fn set_history_action(&mut self, action: HistoryAction) -> &mut Self {
        self.history = action;
        self
    }
}

impl Deref for Transaction {
    type Target = Transform;

    fn deref(&self) -> &Transform {
        &self.transform
    }
}

impl DerefMut for Transaction {
    fn deref_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }
}
