//! # Document Model
//!
//! Immutable document trees checked against a schema.
//!
//! ## Modules
//!
//! - **`schema`**: `Schema`, `NodeType`, `MarkType`, `ContentMatch` and their specs
//! - **`content`**: content expression parser and its NFA/DFA compilation
//! - **`node`** / **`fragment`** / **`mark`**: the tree values themselves
//! - **`resolved`**: `ResolvedPos` and `NodeRange`, positions mapped onto the tree
//! - **`replace`**: `Slice` and the structural replace every edit goes through
//! - **`json`**: JSON document format
//!
//! ## Key Invariants
//!
//! - Nodes never change after creation; an edit yields a new root sharing the
//!   untouched subtrees with the old one
//! - Every node produced by `replace` matches its type's content grammar
//! - Position resolution is total for `0..=doc.content_size()`

pub mod attrs;
pub mod content;
pub mod fragment;
pub mod json;
pub mod mark;
pub mod node;
pub mod replace;
pub mod resolved;
pub mod schema;

pub use attrs::{AttrValue, Attrs};
pub use content::ContentExprError;
pub use fragment::Fragment;
pub use json::{JsonError, MarkJson, NodeJson};
pub use mark::Mark;
pub use node::Node;
pub use replace::{ReplaceError, Slice};
pub use resolved::{NodeRange, PositionError, ResolvedPos};
pub use schema::{
    AttrSpec, ContentMatch, GetAttrs, MarkSpec, MarkToDom, MarkType, NodeSpec, NodeToDom, NodeType,
    ParseRule, Schema, SchemaBuilder, SchemaError,
};
