//! # Commands
//!
//! Every editor command is split into a pure planning phase and an apply
//! phase. Planning answers "can this run here?" without building any
//! document, which is what menus and keymaps use to enable controls.
//!
//! ## Modules
//!
//! - **`wrap_list`**: wrapping the selection in an ordered or bullet list
//!
//! ## Usage
//!
//! ```rust,ignore
//! let action = EditorAction::WrapInList(WrapInList::new(ordered_list, None));
//! if action.can_execute(&state) {
//!     let next = action.run(&state);
//! }
//! ```

pub mod wrap_list;

pub use wrap_list::{ListWrapPlan, WrapInList, WrapRange, plan_wrappers, resolve_wrap_range};

use crate::state::{EditorState, Transaction, history};

/// A two-phase editor command.
pub trait Command {
    /// What planning found; enough to build the transaction without re-checking.
    type Plan;

    /// Decide whether the command applies to `state`. Never edits anything.
    fn plan(&self, state: &EditorState) -> Option<Self::Plan>;

    /// Build the transaction for a plan made against the same `state`.
    fn apply(&self, state: &EditorState, plan: Self::Plan) -> Option<Transaction>;

    fn can_execute(&self, state: &EditorState) -> bool {
        self.plan(state).is_some()
    }

    /// Run the command. Without `dispatch` this only probes; with it the
    /// built transaction is handed over. Returns whether the command applied.
    fn execute(&self, state: &EditorState, dispatch: Option<&mut dyn FnMut(Transaction)>) -> bool {
        let Some(plan) = self.plan(state) else {
            return false;
        };
        let Some(dispatch) = dispatch else {
            return true;
        };
        match self.apply(state, plan) {
            Some(tr) => {
                dispatch(tr);
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Undo;

impl Command for Undo {
    type Plan = Transaction;

    fn plan(&self, state: &EditorState) -> Option<Transaction> {
        history::undo(state)
    }

    fn apply(&self, _state: &EditorState, plan: Transaction) -> Option<Transaction> {
        Some(plan)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Redo;

impl Command for Redo {
    type Plan = Transaction;

    fn plan(&self, state: &EditorState) -> Option<Transaction> {
        history::redo(state)
    }

    fn apply(&self, _state: &EditorState, plan: Transaction) -> Option<Transaction> {
        Some(plan)
    }
}

/// The commands menus and keymaps bind to.
#[derive(Debug, Clone)]
pub enum EditorAction {
    Undo,
    Redo,
    WrapInList(WrapInList),
}

impl EditorAction {
    pub fn can_execute(&self, state: &EditorState) -> bool {
        match self {
            EditorAction::Undo => Undo.can_execute(state),
            EditorAction::Redo => Redo.can_execute(state),
            EditorAction::WrapInList(command) => command.can_execute(state),
        }
    }

    pub fn execute(
        &self,
        state: &EditorState,
        dispatch: Option<&mut dyn FnMut(Transaction)>,
    ) -> bool {
        match self {
            EditorAction::Undo => Undo.execute(state, dispatch),
            EditorAction::Redo => Redo.execute(state, dispatch),
            EditorAction::WrapInList(command) => command.execute(state, dispatch),
        }
    }

    /// Execute and apply in one go: the next state, or `None` when not applicable.
    pub fn run(&self, state: &EditorState) -> Option<EditorState> {
        let mut next = None;
        self.execute(state, Some(&mut |tr: Transaction| next = Some(state.apply(&tr))));
        next
    }
}
