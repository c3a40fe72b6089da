//! # Structural Replace
//!
//! Replacing a range of a document with a [`Slice`] whose boundary nodes may be
//! "open": cut through, so that their content is joined with the nodes found at
//! the edges of the replaced range.
//!
//! ## Key Invariants
//!
//! - Open depths must line up: `from.depth() - open_start == to.depth() - open_end`
//! - Only nodes with compatible content are joined
//! - Every node that receives new content is checked against its grammar before
//!   it is created, so a failed replace never yields an invalid tree

use std::fmt;

use thiserror::Error;

use super::{Fragment, Node, PositionError, ResolvedPos};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReplaceError {
    #[error("inserted content deeper than insertion position")]
    TooDeep,
    #[error("inconsistent open depths")]
    InconsistentOpenDepths,
    #[error("cannot join {sub} onto {main}")]
    CannotJoin { main: String, sub: String },
    #[error("invalid content for node {node_type}: {content}")]
    InvalidContent { node_type: String, content: String },
    #[error(transparent)]
    Position(#[from] PositionError),
}

/// A piece of document: a fragment plus how many levels are open at each side.
#[derive(Clone, Default, PartialEq)]
pub struct Slice {
    content: Fragment,
    open_start: usize,
    open_end: usize,
}

impl fmt::Debug for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({},{})", self.content, self.open_start, self.open_end)
    }
}

impl Slice {
    pub fn new(content: Fragment, open_start: usize, open_end: usize) -> Self {
        Self {
            content,
            open_start,
            open_end,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &Fragment {
        &self.content
    }

    pub fn open_start(&self) -> usize {
        self.open_start
    }

    pub fn open_end(&self) -> usize {
        self.open_end
    }

    /// Token size of the slice once inserted.
    pub fn size(&self) -> usize {
        self.content.size() - self.open_start - self.open_end
    }

    /// Insert `fragment` at `pos` inside the slice. `None` when the node that
    /// would receive it does not accept the fragment there.
    pub fn insert_at(&self, pos: usize, fragment: &Fragment) -> Option<Slice> {
        let content = insert_into(&self.content, pos + self.open_start, fragment, None)?;
        Some(Slice::new(content, self.open_start, self.open_end))
    }
}

fn insert_into(
    content: &Fragment,
    dist: usize,
    insert: &Fragment,
    parent: Option<&Node>,
) -> Option<Fragment> {
    let (index, offset) = content.find_index(dist);
    let child = content.maybe_child(index);
    if offset == dist || child.is_some_and(Node::is_text) {
        if let Some(parent) = parent
            && !parent.can_replace(index, index, insert)
        {
            return None;
        }
        return Some(
            content
                .cut(0, dist)
                .append(insert)
                .append(&content.cut(dist, content.size())),
        );
    }
    let child = child?;
    let inner = insert_into(child.content(), dist - offset - 1, insert, Some(child))?;
    Some(content.replace_child(index, child.copy(inner)))
}

/// Replace the range between two resolved positions of the same document.
pub(crate) fn replace(
    from: &ResolvedPos,
    to: &ResolvedPos,
    slice: &Slice,
) -> Result<Node, ReplaceError> {
    if slice.open_start > from.depth() {
        return Err(ReplaceError::TooDeep);
    }
    if slice.open_end > to.depth()
        || from.depth() - slice.open_start != to.depth() - slice.open_end
    {
        return Err(ReplaceError::InconsistentOpenDepths);
    }
    replace_outer(from, to, slice, 0)
}

fn replace_outer(
    from: &ResolvedPos,
    to: &ResolvedPos,
    slice: &Slice,
    depth: usize,
) -> Result<Node, ReplaceError> {
    let index = from.index(depth);
    let node = from.node(depth);
    if index == to.index(depth) && depth < from.depth() - slice.open_start {
        let inner = replace_outer(from, to, slice, depth + 1)?;
        Ok(node.copy(node.content().replace_child(index, inner)))
    } else if slice.content.size() == 0 {
        close(node, replace_two_way(from, to, depth)?)
    } else if slice.open_start == 0
        && slice.open_end == 0
        && from.depth() == depth
        && to.depth() == depth
    {
        let parent = from.parent();
        let content = parent.content();
        close(
            parent,
            content
                .cut(0, from.parent_offset())
                .append(&slice.content)
                .append(&content.cut(to.parent_offset(), content.size())),
        )
    } else {
        let (start, end) = prepare_slice_for_replace(slice, from)?;
        close(node, replace_three_way(from, &start, &end, to, depth)?)
    }
}

fn check_join(main: &Node, sub: &Node) -> Result<(), ReplaceError> {
    if sub.node_type().compatible_content(main.node_type()) {
        Ok(())
    } else {
        Err(ReplaceError::CannotJoin {
            main: main.node_type().name().to_string(),
            sub: sub.node_type().name().to_string(),
        })
    }
}

fn joinable(before: &ResolvedPos, after: &ResolvedPos, depth: usize) -> Result<Node, ReplaceError> {
    let node = before.node(depth);
    check_join(node, after.node(depth))?;
    Ok(node.clone())
}

fn add_node(child: Node, target: &mut Vec<Node>) {
    if let Some(last) = target.last_mut()
        && let (Some(prev), Some(next)) = (last.text(), child.text())
        && child.same_markup(last)
    {
        let joined = format!("{prev}{next}");
        *last = last.with_text(joined);
        return;
    }
    target.push(child);
}

fn add_range(
    start: Option<&ResolvedPos>,
    end: Option<&ResolvedPos>,
    depth: usize,
    target: &mut Vec<Node>,
) {
    let Some(node) = end.or(start).map(|pos| pos.node(depth)) else {
        return;
    };
    let mut start_index = 0;
    let end_index = end.map_or(node.child_count(), |end| end.index(depth));
    if let Some(start) = start {
        start_index = start.index(depth);
        if start.depth() > depth {
            start_index += 1;
        } else if start.text_offset() > 0 {
            if let Some(after) = start.node_after() {
                add_node(after, target);
            }
            start_index += 1;
        }
    }
    for i in start_index..end_index {
        add_node(node.child(i).clone(), target);
    }
    if let Some(end) = end
        && end.depth() == depth
        && end.text_offset() > 0
        && let Some(before) = end.node_before()
    {
        add_node(before, target);
    }
}

fn close(node: &Node, content: Fragment) -> Result<Node, ReplaceError> {
    node.node_type().check_content(&content)?;
    Ok(node.copy(content))
}

fn replace_three_way(
    from: &ResolvedPos,
    start: &ResolvedPos,
    end: &ResolvedPos,
    to: &ResolvedPos,
    depth: usize,
) -> Result<Fragment, ReplaceError> {
    let open_start = if from.depth() > depth {
        Some(joinable(from, start, depth + 1)?)
    } else {
        None
    };
    let open_end = if to.depth() > depth {
        Some(joinable(end, to, depth + 1)?)
    } else {
        None
    };

    let mut content = Vec::new();
    add_range(None, Some(from), depth, &mut content);
    match (&open_start, &open_end) {
        (Some(open_start), Some(open_end)) if start.index(depth) == end.index(depth) => {
            check_join(open_start, open_end)?;
            let inner = replace_three_way(from, start, end, to, depth + 1)?;
            add_node(close(open_start, inner)?, &mut content);
        }
        _ => {
            if let Some(open_start) = &open_start {
                let inner = replace_two_way(from, start, depth + 1)?;
                add_node(close(open_start, inner)?, &mut content);
            }
            add_range(Some(start), Some(end), depth, &mut content);
            if let Some(open_end) = &open_end {
                let inner = replace_two_way(end, to, depth + 1)?;
                add_node(close(open_end, inner)?, &mut content);
            }
        }
    }
    add_range(Some(to), None, depth, &mut content);
    Ok(Fragment::from_nodes(content))
}

fn replace_two_way(
    from: &ResolvedPos,
    to: &ResolvedPos,
    depth: usize,
) -> Result<Fragment, ReplaceError> {
    let mut content = Vec::new();
    add_range(None, Some(from), depth, &mut content);
    if from.depth() > depth {
        let node = joinable(from, to, depth + 1)?;
        let inner = replace_two_way(from, to, depth + 1)?;
        add_node(close(&node, inner)?, &mut content);
    }
    add_range(Some(to), None, depth, &mut content);
    Ok(Fragment::from_nodes(content))
}

/// Wrap the slice content in copies of the ancestors of `along` so it can be
/// walked with resolved positions, returning its inner start and end.
fn prepare_slice_for_replace(
    slice: &Slice,
    along: &ResolvedPos,
) -> Result<(ResolvedPos, ResolvedPos), ReplaceError> {
    let extra = along.depth() - slice.open_start;
    let parent = along.node(extra);
    let mut node = parent.copy(slice.content.clone());
    for depth in (0..extra).rev() {
        node = along.node(depth).copy(Fragment::from_node(node));
    }
    let start = node.resolve(slice.open_start + extra)?;
    let end = node.resolve(node.content_size() - slice.open_end - extra)?;
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{doc, li, ol, p, schema};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_flat_replace_inserts_text() {
        let schema = schema();
        let before = doc(&[p(&["ab"])]);
        let slice = Slice::new(Fragment::from_node(schema.text("X", vec![])), 0, 0);
        let after = before.replace(2, 2, &slice).unwrap();
        assert_eq!(after, doc(&[p(&["aXb"])]));
    }

    #[test]
    fn test_delete_across_paragraphs_joins_them() {
        let before = doc(&[p(&["ab"]), p(&["cd"])]);
        let after = before.replace(2, 6, &Slice::empty()).unwrap();
        assert_eq!(after, doc(&[p(&["ad"])]));
    }

    #[test]
    fn test_open_slice_splits_a_list_item() {
        let before = doc(&[ol(&[li(&[p(&["a"]), p(&["b"])])])]);
        let item = before.child(0).child(0).clone();
        let split = Fragment::from_nodes(vec![
            item.copy(Fragment::empty()),
            item.copy(Fragment::empty()),
        ]);
        let after = before.replace(5, 5, &Slice::new(split, 1, 1)).unwrap();
        assert_eq!(after, doc(&[ol(&[li(&[p(&["a"])]), li(&[p(&["b"])])])]));
    }

    #[test]
    fn test_rejects_content_that_breaks_grammar() {
        let before = doc(&[ol(&[li(&[p(&["a"])])])]);
        // Removing the only paragraph would leave an empty list item.
        let result = before.replace(2, 5, &Slice::empty());
        assert!(matches!(result, Err(ReplaceError::InvalidContent { .. })));
    }

    #[test]
    fn test_insert_at_respects_receiving_grammar() {
        let schema = schema();
        let shell = Slice::new(
            Fragment::from_node(ol(&[schema
                .node_type("list_item")
                .unwrap()
                .create(None, Fragment::empty(), vec![])])),
            0,
            0,
        );
        let paragraph = Fragment::from_node(p(&["a"]));
        let filled = shell.insert_at(2, &paragraph).unwrap();
        assert_eq!(filled.content().child(0), &ol(&[li(&[p(&["a"])])]));

        let text = Fragment::from_node(schema.text("loose", vec![]));
        assert!(shell.insert_at(2, &text).is_none());
    }
}
