//! # folio-engine
//!
//! A rich-text editor core: a schema-checked document tree, steps and
//! transactions over it, and the editing features built on top. The
//! central feature is wrapping a selection in an ordered or bullet list.
//!
//! ## Modules
//!
//! - **`model`**: schemas, content grammars, nodes, positions and slices
//! - **`transform`**: steps, position mapping and structural helpers
//! - **`state`**: editor state, transactions and undo history
//! - **`commands`**: two-phase commands, including wrap-in-list
//! - **`lists`**: list node types and their start/style attributes
//! - **`marks`**: strong, emphasis, font size and font family
//! - **`mentions`**: `@` mentions, `#` tags and suggestions
//! - **`input_rules`**: typing shortcuts such as `1. ` and smart quotes
//! - **`keymap`**: platform-aware key bindings
//! - **`menu`**: toolbar items enabled by probing their commands
//! - **`dom`**: the element tree documents are rendered to and parsed from
//! - **`setup`**: the folio schema and the [`Editor`] tying it all together

pub mod commands;
pub mod dom;
pub mod input_rules;
pub mod keymap;
pub mod lists;
pub mod marks;
pub mod mentions;
pub mod menu;
pub mod model;
pub mod setup;
pub mod state;
pub mod transform;

#[cfg(test)]
mod test_support;

// Re-export key types for easier usage
pub use commands::{Command, EditorAction, ListWrapPlan, WrapInList};
pub use dom::{DomElement, DomNode, document_to_html, parse_document, serialize_html};
pub use keymap::{KeyPress, Keymap, Platform};
pub use lists::{ListAttrs, ListKind, ListStyle};
pub use mentions::{MemberId, MentionMember};
pub use model::{Fragment, Node, NodeType, Schema};
pub use setup::{Editor, EditorOptions, SetupError, build_schema, folio_schema};
pub use state::{EditorState, TextSelection, Transaction};
