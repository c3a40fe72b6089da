//! # Transform Layer
//!
//! Edits expressed as steps over the document model.
//!
//! ## Modules
//!
//! - **`step`**: `Step::Replace` and `Step::ReplaceAround`, the two atomic edits
//! - **`map`**: `StepMap` and `Mapping` for carrying positions across edits
//! - **`structure`**: wrapping, split and join queries asked before editing
//! - **`edit`**: `Transform`, which accumulates steps and the documents between them
//!
//! ## Key Invariants
//!
//! - A step either yields a document that satisfies every content grammar or
//!   fails without side effects
//! - `structure` steps only move node boundaries; they never drop content

mod edit;
mod map;
mod step;
mod structure;

pub use edit::Transform;
pub use map::{MapResult, Mapping, StepMap};
pub use step::{Step, StepError};
pub use structure::{Wrapper, can_join, can_split, find_wrapping, joinable};
