use log::{debug, error};

use super::{EditorState, HistoryAction, TextSelection, Transaction};
use crate::model::Node;

/// Undo steps kept before the oldest is dropped.
pub const DEFAULT_DEPTH: usize = 100;

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    doc: Node,
    selection: TextSelection,
}

/// Undo and redo stacks of earlier documents and their selections.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    done: Vec<Entry>,
    undone: Vec<Entry>,
    depth: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_depth(DEFAULT_DEPTH)
    }
}

impl History {
    pub fn with_depth(depth: usize) -> Self {
        Self {
            done: Vec::new(),
            undone: Vec::new(),
            depth: depth.max(1),
        }
    }

    pub fn undo_depth(&self) -> usize {
        self.done.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.undone.len()
    }

    /// History after `tr` was applied to the state holding `prev_doc` and `prev_selection`.
    pub(super) fn apply(
        &self,
        tr: &Transaction,
        prev_doc: &Node,
        prev_selection: TextSelection,
    ) -> History {
        let prev = Entry {
            doc: prev_doc.clone(),
            selection: prev_selection,
        };
        let mut next = self.clone();
        match tr.history_action() {
            HistoryAction::Undo => {
                next.done.pop();
                next.undone.push(prev);
            }
            HistoryAction::Redo => {
                next.undone.pop();
                next.done.push(prev);
            }
            HistoryAction::Record if tr.doc_changed() => {
                next.done.push(prev);
                if next.done.len() > next.depth {
                    next.done.remove(0);
                }
                next.undone.clear();
            }
            HistoryAction::Record | HistoryAction::Skip => {}
        }
        next
    }
}

/// Transaction restoring the document before the last recorded edit.
pub fn undo(state: &EditorState) -> Option<Transaction> {
    let entry = state.history().done.last()?;
    restore(state, entry, HistoryAction::Undo)
}

/// Transaction re-applying the last undone edit.
pub fn redo(state: &EditorState) -> Option<Transaction> {
    let entry = state.history().undone.last()?;
    restore(state, entry, HistoryAction::Redo)
}

fn restore(state: &EditorState, entry: &Entry, action: HistoryAction) -> Option<Transaction> {
    let mut tr = Transaction::new(state);
    let size = state.doc().content_size();
    if let Err(err) = tr.replace_with(0, size, entry.doc.content().clone()) {
        error!("Failed to restore document from history: {err}");
        return None;
    }
    debug!("History {action:?}: restoring {} top-level nodes", entry.doc.child_count());
    tr.set_selection(entry.selection)
        .set_history_action(action)
        .scroll_into_view();
    Some(tr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{doc, p, schema};
    use pretty_assertions::assert_eq;

    fn typed(state: &EditorState, text: &str, at: usize) -> EditorState {
        let mut tr = Transaction::new(state);
        tr.insert_text(text, at, at).unwrap();
        state.apply(&tr)
    }

    #[test]
    fn test_undo_then_redo_restores_both_documents() {
        let schema = schema();
        let start = EditorState::new(schema, doc(&[p(&["a"])]), None);
        let edited = typed(&start, "b", 2);

        let undone = edited.apply(&undo(&edited).unwrap());
        assert_eq!(undone.doc(), start.doc());
        assert_eq!(undone.history().redo_depth(), 1);

        let redone = undone.apply(&redo(&undone).unwrap());
        assert_eq!(redone.doc(), edited.doc());
        assert_eq!(redone.history().redo_depth(), 0);
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let schema = schema();
        let start = EditorState::new(schema, doc(&[p(&["a"])]), None);
        let edited = typed(&start, "b", 2);
        let undone = edited.apply(&undo(&edited).unwrap());

        let branched = typed(&undone, "c", 2);

        assert_eq!(branched.history().redo_depth(), 0);
        assert!(redo(&branched).is_none());
    }

    #[test]
    fn test_nothing_to_undo_in_a_fresh_state() {
        let schema = schema();
        let state = EditorState::new(schema, doc(&[p(&["a"])]), None);
        assert!(undo(&state).is_none());
    }

    #[test]
    fn test_depth_limit_drops_oldest() {
        let schema = schema();
        let mut state =
            EditorState::new(schema, doc(&[p(&["a"])]), None).with_history(History::with_depth(2));
        for _ in 0..3 {
            state = typed(&state, "x", 2);
        }
        assert_eq!(state.history().undo_depth(), 2);
    }
}
