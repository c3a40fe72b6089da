//! # Wrap in List
//!
//! Wraps the blocks around the selection in a list, one list item per
//! selected block, merging into a preceding list item when the selection
//! starts a nested item.
//!
//! The work happens in three stages, each usable on its own:
//!
//! 1. [`resolve_wrap_range`] finds the block range and detects the merge case
//! 2. [`plan_wrappers`] finds the wrapper levels the content grammars require
//! 3. [`ListWrapPlan::build`] emits the wrapping step and the item splits
//!
//! Stages 1 and 2 never touch the document, so planning doubles as the
//! applicability probe used by menus.

use log::{debug, error};

use super::Command;
use crate::lists::{ListAttrs, ListKind};
use crate::model::{Attrs, Fragment, Node, NodeRange, NodeType, Slice};
use crate::state::{EditorState, Transaction};
use crate::transform::{Step, StepError, Transform, Wrapper, can_split, find_wrapping};

/// Where the list goes and what it wraps.
#[derive(Debug, Clone)]
pub struct WrapRange {
    /// The blocks that end up inside the list.
    pub range: NodeRange,
    /// The range the outermost wrapper replaces. Differs from `range` only
    /// when joining the previous list item.
    pub outer: NodeRange,
    /// The list is inserted at the end of the preceding list item.
    pub join_with_previous: bool,
}

/// Resolve the selection `from..to` into the range to wrap in a `list_type` list.
///
/// `None` when the selection has no common block range, or when it starts
/// the first item of a list that already matches, which has no preceding
/// item to nest into.
pub fn resolve_wrap_range(
    doc: &Node,
    from: usize,
    to: usize,
    list_type: &NodeType,
) -> Option<WrapRange> {
    let from_pos = doc.resolve(from).ok()?;
    let to_pos = doc.resolve(to).ok()?;
    let mut range = from_pos.block_range(&to_pos)?;
    let mut outer = range.clone();
    let mut join_with_previous = false;

    let depth = range.depth();
    if depth >= 2
        && range.from().node(depth - 1).node_type().compatible_content(list_type)
        && range.start_index() == 0
    {
        // The selection starts an item of an existing list.
        if range.from().index(depth - 1) == 0 {
            return None;
        }
        let insert = doc.resolve(range.start() - 2).ok()?;
        outer = NodeRange::new(insert.clone(), insert, depth);
        if range.end_index() < range.parent().child_count() {
            let end = doc.resolve(range.to().end(depth)).ok()?;
            range = NodeRange::new(range.from().clone(), end, depth);
        }
        join_with_previous = true;
    }

    Some(WrapRange {
        range,
        outer,
        join_with_previous,
    })
}

/// Wrapper levels, outermost first, with exactly one `list_type` level carrying `attrs`.
pub fn plan_wrappers(
    target: &WrapRange,
    list_type: &NodeType,
    attrs: Option<&Attrs>,
) -> Option<Vec<Wrapper>> {
    find_wrapping(&target.outer, list_type, attrs, &target.range)
}

/// Everything needed to emit a list wrap, computed without editing.
#[derive(Debug, Clone)]
pub struct ListWrapPlan {
    pub target: WrapRange,
    pub wrappers: Vec<Wrapper>,
    pub list_type: NodeType,
}

impl ListWrapPlan {
    pub fn new(
        doc: &Node,
        from: usize,
        to: usize,
        list_type: &NodeType,
        attrs: Option<&Attrs>,
    ) -> Option<Self> {
        let target = resolve_wrap_range(doc, from, to, list_type)?;
        let wrappers = plan_wrappers(&target, list_type, attrs)?;
        Some(Self {
            target,
            wrappers,
            list_type: list_type.clone(),
        })
    }

    /// Levels between the list node and the wrapped blocks. Splitting at this
    /// depth separates list items without crossing the list itself.
    pub fn split_depth(&self) -> usize {
        let found = self
            .wrappers
            .iter()
            .rposition(|wrapper| wrapper.node_type == self.list_type)
            .map_or(0, |index| index + 1);
        self.wrappers.len() - found
    }

    /// Emit the wrapping step, then split so every wrapped block gets its own item.
    pub fn build(&self, tr: &mut Transform) -> Result<(), StepError> {
        let range = &self.target.range;
        let join_offset = if self.target.join_with_previous { 2 } else { 0 };

        let shell = self.wrappers.iter().rev().fold(Fragment::empty(), |content, wrapper| {
            Fragment::from_node(wrapper.create(content))
        });
        tr.step(Step::ReplaceAround {
            from: range.start() - join_offset,
            to: range.end(),
            gap_from: range.start(),
            gap_to: range.end(),
            slice: Slice::new(shell, 0, 0),
            insert: self.wrappers.len(),
            structure: true,
        })?;

        let split_depth = self.split_depth();
        let parent = range.parent();
        let mut split_pos = range.start() + self.wrappers.len() - join_offset;
        for index in range.start_index()..range.end_index() {
            if index > range.start_index() && can_split(tr.doc(), split_pos, split_depth) {
                tr.split(split_pos, split_depth)?;
                split_pos += 2 * split_depth;
            }
            split_pos += parent.child(index).node_size();
        }
        Ok(())
    }
}

/// Wrap the selection in a list of `list_type`.
#[derive(Debug, Clone)]
pub struct WrapInList {
    list_type: NodeType,
    attrs: Option<Attrs>,
}

impl WrapInList {
    /// Attrs for a known list kind are corrected to a valid start and style.
    pub fn new(list_type: NodeType, attrs: Option<Attrs>) -> Self {
        let attrs = match ListKind::of_node_type(&list_type) {
            Some(kind) => attrs.map(|attrs| ListAttrs::from_attrs(kind, &attrs).to_attrs()),
            None => attrs,
        };
        Self { list_type, attrs }
    }

    pub fn list_type(&self) -> &NodeType {
        &self.list_type
    }

    pub fn attrs(&self) -> Option<&Attrs> {
        self.attrs.as_ref()
    }
}

impl Command for WrapInList {
    type Plan = ListWrapPlan;

    fn plan(&self, state: &EditorState) -> Option<ListWrapPlan> {
        let selection = state.selection();
        ListWrapPlan::new(
            state.doc(),
            selection.from(),
            selection.to(),
            &self.list_type,
            self.attrs.as_ref(),
        )
    }

    fn apply(&self, state: &EditorState, plan: ListWrapPlan) -> Option<Transaction> {
        debug!(
            "Wrapping {} block(s) in {} (join: {})",
            plan.target.range.end_index() - plan.target.range.start_index(),
            self.list_type.name(),
            plan.target.join_with_previous
        );
        let mut tr = Transaction::new(state);
        if let Err(err) = plan.build(&mut tr) {
            error!("List wrap produced an invalid step: {err}");
            debug_assert!(false, "list wrap produced an invalid step: {err}");
            return None;
        }
        tr.scroll_into_view();
        Some(tr)
    }
}
