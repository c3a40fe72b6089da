//! # Editor State
//!
//! An immutable snapshot of everything the editor knows: schema, document,
//! selection and undo history. Applying a [`Transaction`] yields the next
//! state and leaves the previous one intact.

pub mod history;
mod selection;
mod transaction;

pub use history::History;
pub use selection::TextSelection;
pub use transaction::{HistoryAction, Transaction};

use crate::model::{Node, Schema};

#[derive(Debug, Clone)]
pub struct EditorState {
    schema: Schema,
    doc: Node,
    selection: TextSelection,
    history: History,
}

impl EditorState {
    /// A state over `doc`. Without a selection the cursor goes to the start
    /// of the first textblock.
    pub fn new(schema: Schema, doc: Node, selection: Option<TextSelection>) -> Self {
        let selection = selection.unwrap_or_else(|| TextSelection::at_start(&doc));
        Self {
            schema,
            doc,
            selection,
            history: History::default(),
        }
    }

    pub fn with_history(mut self, history: History) -> Self {
        self.history = history;
        self
    }

    pub fn with_selection(mut self, selection: TextSelection) -> Self {
        self.selection = selection;
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn selection(&self) -> TextSelection {
        self.selection
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn apply(&self, tr: &Transaction) -> EditorState {
        EditorState {
            schema: self.schema.clone(),
            doc: tr.doc().clone(),
            selection: tr.selection(),
            history: self.history.apply(tr, &self.doc, self.selection),
        }
    }
}
