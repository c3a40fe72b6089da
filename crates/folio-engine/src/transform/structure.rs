//! Structural queries answered before an edit is made: where wrappers are
//! needed, where nodes may be split or joined.

use crate::model::{Attrs, Fragment, Node, NodeRange, NodeType};

/// One planned wrapper level: a node type and the attributes to create it with.
#[derive(Debug, Clone, PartialEq)]
pub struct Wrapper {
    pub node_type: NodeType,
    pub attrs: Option<Attrs>,
}

impl Wrapper {
    pub fn new(node_type: NodeType, attrs: Option<Attrs>) -> Self {
        Self { node_type, attrs }
    }

    pub fn plain(node_type: NodeType) -> Self {
        Self { node_type, attrs: None }
    }

    pub fn create(&self, content: Fragment) -> Node {
        self.node_type.create(self.attrs.as_ref(), content, Vec::new())
    }
}

/// Wrappers, outermost first, that put the content of `inner` inside a node of
/// `node_type` placed where `range` is. `range` and `inner` are the same range
/// unless the wrapper goes somewhere other than around the content it holds.
///
/// Exactly one level has `node_type`; the others are filled in from the
/// content grammars on either side of it.
pub fn find_wrapping(
    range: &NodeRange,
    node_type: &NodeType,
    attrs: Option<&Attrs>,
    inner: &NodeRange,
) -> Option<Vec<Wrapper>> {
    let around = find_wrapping_outside(range, node_type)?;
    let inside = find_wrapping_inside(inner, node_type)?;
    let mut wrappers: Vec<Wrapper> = around.into_iter().map(Wrapper::plain).collect();
    wrappers.push(Wrapper::new(node_type.clone(), attrs.cloned()));
    wrappers.extend(inside.into_iter().map(Wrapper::plain));
    Some(wrappers)
}

fn find_wrapping_outside(range: &NodeRange, node_type: &NodeType) -> Option<Vec<NodeType>> {
    let parent = range.parent();
    let around = parent.content_match_at(range.start_index())?.find_wrapping(node_type)?;
    let outer = around.first().unwrap_or(node_type);
    parent
        .can_replace_with(range.start_index(), range.end_index(), outer)
        .then_some(around)
}

fn find_wrapping_inside(range: &NodeRange, node_type: &NodeType) -> Option<Vec<NodeType>> {
    let parent = range.parent();
    let first = parent.maybe_child(range.start_index())?;
    let inside = node_type.content_match().find_wrapping(first.node_type())?;
    let last = inside.last().unwrap_or(node_type);
    let matched = last
        .content_match()
        .match_fragment_range(parent.content(), range.start_index(), range.end_index())?;
    matched.valid_end().then_some(inside)
}

/// Whether splitting the document at `pos`, through `depth` levels of nesting,
/// leaves every node on both sides valid.
pub fn can_split(doc: &Node, pos: usize, depth: usize) -> bool {
    let Ok(resolved) = doc.resolve(pos) else {
        return false;
    };
    let Some(base) = resolved.depth().checked_sub(depth) else {
        return false;
    };
    let parent = resolved.parent();
    let index = resolved.index(resolved.depth());
    if !parent.can_replace(index, parent.child_count(), &Fragment::empty())
        || !parent
            .node_type()
            .valid_content(&parent.content().cut_by_index(index, parent.child_count()))
    {
        return false;
    }
    for d in (base + 1..resolved.depth()).rev() {
        let node = resolved.node(d);
        let index = resolved.index(d);
        let rest = node.content().cut_by_index(index, node.child_count());
        if !node.can_replace(index + 1, node.child_count(), &Fragment::empty())
            || !node.node_type().valid_content(&rest)
        {
            return false;
        }
    }
    let index = resolved.index_after(base);
    resolved
        .node(base)
        .can_replace_with(index, index, resolved.node(base + 1).node_type())
}

/// Whether the nodes directly before and after `pos` can be joined into one.
pub fn can_join(doc: &Node, pos: usize) -> bool {
    let Ok(resolved) = doc.resolve(pos) else {
        return false;
    };
    let index = resolved.index(resolved.depth());
    joinable(resolved.node_before().as_ref(), resolved.node_after().as_ref())
        && resolved.parent().can_replace(index, index + 1, &Fragment::empty())
}

pub fn joinable(before: Option<&Node>, after: Option<&Node>) -> bool {
    match (before, after) {
        (Some(before), Some(after)) => !before.is_leaf() && before.can_append(after),
        _ => false,
    }
}
