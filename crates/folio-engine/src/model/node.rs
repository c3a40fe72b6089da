use std::fmt;
use std::sync::Arc;

use super::{
    AttrValue, Attrs, ContentMatch, Fragment, Mark, NodeType, PositionError, ReplaceError,
    ResolvedPos, Slice, replace::replace,
};

/// Immutable document node.
///
/// A node is a handle to shared data: cloning is cheap and edits build new
/// nodes that reference the unchanged children of the old ones.
///
/// ## Token space
///
/// Positions count tokens: a text node contributes one token per character,
/// a leaf node one token, and any other node one token for its opening
/// boundary, its content, and one token for its closing boundary.
#[derive(Clone)]
pub struct Node(Arc<NodeData>);

struct NodeData {
    node_type: NodeType,
    attrs: Attrs,
    content: Fragment,
    marks: Vec<Mark>,
    text: Option<String>,
    size: usize,
}

impl Node {
    pub(crate) fn new(
        node_type: NodeType,
        attrs: Attrs,
        content: Fragment,
        marks: Vec<Mark>,
    ) -> Self {
        let size = if node_type.is_leaf() {
            1
        } else {
            content.size() + 2
        };
        Self(Arc::new(NodeData {
            node_type,
            attrs,
            content,
            marks,
            text: None,
            size,
        }))
    }

    pub(crate) fn new_text(node_type: NodeType, text: String, marks: Vec<Mark>) -> Self {
        let size = text.chars().count();
        Self(Arc::new(NodeData {
            node_type,
            attrs: Attrs::new(),
            content: Fragment::empty(),
            marks,
            text: Some(text),
            size,
        }))
    }

    pub fn node_type(&self) -> &NodeType {
        &self.0.node_type
    }

    pub fn attrs(&self) -> &Attrs {
        &self.0.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.0.attrs.get(name)
    }

    pub fn content(&self) -> &Fragment {
        &self.0.content
    }

    pub fn marks(&self) -> &[Mark] {
        &self.0.marks
    }

    pub fn text(&self) -> Option<&str> {
        self.0.text.as_deref()
    }

    pub fn is_text(&self) -> bool {
        self.0.text.is_some()
    }

    pub fn is_leaf(&self) -> bool {
        self.is_text() || self.node_type().is_leaf()
    }

    pub fn is_inline(&self) -> bool {
        self.node_type().is_inline()
    }

    pub fn is_block(&self) -> bool {
        self.node_type().is_block()
    }

    pub fn is_textblock(&self) -> bool {
        self.node_type().is_textblock()
    }

    pub fn inline_content(&self) -> bool {
        self.node_type().inline_content()
    }

    pub fn is_atom(&self) -> bool {
        self.node_type().is_atom()
    }

    pub fn node_size(&self) -> usize {
        self.0.size
    }

    pub fn content_size(&self) -> usize {
        self.0.content.size()
    }

    pub fn child_count(&self) -> usize {
        self.0.content.child_count()
    }

    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn child(&self, index: usize) -> &Node {
        self.0.content.child(index)
    }

    pub fn maybe_child(&self, index: usize) -> Option<&Node> {
        self.0.content.maybe_child(index)
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.0.content.first_child()
    }

    pub fn last_child(&self) -> Option<&Node> {
        self.0.content.last_child()
    }

    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Same type, attributes and marks.
    pub fn same_markup(&self, other: &Node) -> bool {
        self.has_markup(other.node_type(), other.attrs(), other.marks())
    }

    pub fn has_markup(&self, node_type: &NodeType, attrs: &Attrs, marks: &[Mark]) -> bool {
        self.node_type() == node_type
            && self.attrs() == attrs
            && Mark::same_set(self.marks(), marks)
    }

    /// A node with the same markup holding `content`.
    pub fn copy(&self, content: Fragment) -> Node {
        Node::new(self.0.node_type.clone(), self.0.attrs.clone(), content, self.0.marks.clone())
    }

    pub fn with_text(&self, text: String) -> Node {
        Node::new_text(self.0.node_type.clone(), text, self.0.marks.clone())
    }

    pub fn mark(&self, marks: Vec<Mark>) -> Node {
        match self.text() {
            Some(text) => Node::new_text(self.0.node_type.clone(), text.to_string(), marks),
            None => Node::new(
                self.0.node_type.clone(),
                self.0.attrs.clone(),
                self.0.content.clone(),
                marks,
            ),
        }
    }

    /// For text, the characters `from..to`; otherwise the node with its content
    /// cut to `from..to`.
    pub fn cut(&self, from: usize, to: usize) -> Node {
        match self.text() {
            Some(text) => {
                if from == 0 && to == self.0.size {
                    return self.clone();
                }
                self.with_text(text.chars().skip(from).take(to.saturating_sub(from)).collect())
            }
            None => {
                if from == 0 && to == self.content_size() {
                    return self.clone();
                }
                self.copy(self.0.content.cut(from, to))
            }
        }
    }

    pub fn resolve(&self, pos: usize) -> Result<ResolvedPos, PositionError> {
        ResolvedPos::resolve(self, pos)
    }

    pub fn slice(&self, from: usize, to: usize) -> Result<Slice, PositionError> {
        if from == to {
            return Ok(Slice::empty());
        }
        let from = self.resolve(from)?;
        let to = self.resolve(to)?;
        let depth = from.shared_depth(to.pos());
        let start = from.start(depth);
        let node = from.node(depth);
        let content = node.content().cut(from.pos() - start, to.pos() - start);
        Ok(Slice::new(content, from.depth() - depth, to.depth() - depth))
    }

    /// Replace `from..to` with `slice`, checking every touched node's content.
    pub fn replace(&self, from: usize, to: usize, slice: &Slice) -> Result<Node, ReplaceError> {
        let from = self.resolve(from)?;
        let to = self.resolve(to)?;
        replace(&from, &to, slice)
    }

    pub fn content_match_at(&self, index: usize) -> Option<ContentMatch> {
        self.node_type()
            .content_match()
            .match_fragment_range(self.content(), 0, index)
    }

    /// Whether replacing the children `from..to` with `replacement` leaves valid content.
    pub fn can_replace(&self, from: usize, to: usize, replacement: &Fragment) -> bool {
        self.content_match_at(from)
            .and_then(|one| one.match_fragment(replacement))
            .and_then(|two| two.match_fragment_range(self.content(), to, self.child_count()))
            .is_some_and(|end| end.valid_end())
    }

    /// Whether replacing the children `from..to` with one node of `node_type` is valid.
    pub fn can_replace_with(&self, from: usize, to: usize, node_type: &NodeType) -> bool {
        self.content_match_at(from)
            .and_then(|start| start.match_type(node_type))
            .and_then(|end| end.match_fragment_range(self.content(), to, self.child_count()))
            .is_some_and(|end| end.valid_end())
    }

    /// Whether `other`'s content could be appended to this node's content.
    pub fn can_append(&self, other: &Node) -> bool {
        if other.content_size() > 0 {
            self.can_replace(self.child_count(), self.child_count(), other.content())
        } else {
            self.node_type().compatible_content(other.node_type())
        }
    }

    /// Validate this node and all descendants against their content grammars.
    pub fn check(&self) -> Result<(), ReplaceError> {
        self.node_type().check_content(self.content())?;
        for child in self.content() {
            child.check()?;
        }
        Ok(())
    }

    pub fn text_content(&self) -> String {
        match self.text() {
            Some(text) => text.to_string(),
            None => self.content().text_between(0, self.content_size(), Some(""), None),
        }
    }

    pub fn text_between(
        &self,
        from: usize,
        to: usize,
        block_separator: Option<&str>,
        leaf_text: Option<&str>,
    ) -> String {
        self.content().text_between(from, to, block_separator, leaf_text)
    }

    /// Visit descendants overlapping `from..to`; see [`Fragment::nodes_between`].
    pub fn nodes_between<F>(&self, from: usize, to: usize, f: &mut F)
    where
        F: FnMut(&Node, usize, Option<&Node>, usize) -> bool,
    {
        self.content().nodes_between(from, to, f, 0, Some(self));
    }

    pub fn descendants<F>(&self, f: &mut F)
    where
        F: FnMut(&Node, usize, Option<&Node>, usize) -> bool,
    {
        self.nodes_between(0, self.content_size(), f);
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.same_markup(other)
                && self.0.text == other.0.text
                && self.0.content == other.0.content)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut inner = match self.text() {
            Some(text) => format!("{text:?}"),
            None => {
                let mut out = self.node_type().name().to_string();
                if !self.content().is_empty() {
                    out.push('(');
                    for (i, child) in self.content().iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        out.push_str(&child.to_string());
                    }
                    out.push(')');
                }
                out
            }
        };
        for mark in self.marks().iter().rev() {
            inner = format!("{}({inner})", mark.mark_type().name());
        }
        f.write_str(&inner)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
