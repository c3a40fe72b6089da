use thiserror::Error;

use super::{Mark, Node};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("position {pos} out of range (document content size is {size})")]
pub struct PositionError {
    pub pos: usize,
    pub size: usize,
}

#[derive(Debug, Clone)]
struct PathEntry {
    node: Node,
    index: usize,
    /// Absolute position of the start of the child at `index`.
    offset: usize,
}

/// A document position resolved into the chain of ancestors that contain it.
///
/// Depth 0 is the document itself; `depth()` is the depth of the innermost
/// node whose content holds the position.
#[derive(Debug, Clone)]
pub struct ResolvedPos {
    pos: usize,
    path: Vec<PathEntry>,
    parent_offset: usize,
}

impl ResolvedPos {
    pub(crate) fn resolve(doc: &Node, pos: usize) -> Result<Self, PositionError> {
        if pos > doc.content_size() {
            return Err(PositionError {
                pos,
                size: doc.content_size(),
            });
        }

        let mut path = Vec::new();
        let mut start = 0;
        let mut parent_offset = pos;
        let mut node = doc.clone();
        loop {
            let (index, offset) = node.content().find_index(parent_offset);
            let rem = parent_offset - offset;
            path.push(PathEntry {
                node: node.clone(),
                index,
                offset: start + offset,
            });
            if rem == 0 {
                break;
            }
            let child = node.child(index).clone();
            if child.is_text() {
                break;
            }
            parent_offset = rem - 1;
            start += offset + 1;
            node = child;
        }

        Ok(Self {
            pos,
            path,
            parent_offset,
        })
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn depth(&self) -> usize {
        self.path.len() - 1
    }

    /// Offset of the position inside its parent's content.
    pub fn parent_offset(&self) -> usize {
        self.parent_offset
    }

    pub fn node(&self, depth: usize) -> &Node {
        &self.path[depth].node
    }

    pub fn parent(&self) -> &Node {
        self.node(self.depth())
    }

    pub fn doc(&self) -> &Node {
        self.node(0)
    }

    /// Index into the ancestor at `depth` of the child the position points into.
    pub fn index(&self, depth: usize) -> usize {
        self.path[depth].index
    }

    /// Index of the child after the position in the ancestor at `depth`.
    pub fn index_after(&self, depth: usize) -> usize {
        self.index(depth) + usize::from(!(depth == self.depth() && self.text_offset() == 0))
    }

    /// Start of the content of the ancestor at `depth`.
    pub fn start(&self, depth: usize) -> usize {
        if depth == 0 {
            0
        } else {
            self.path[depth - 1].offset + 1
        }
    }

    /// End of the content of the ancestor at `depth`.
    pub fn end(&self, depth: usize) -> usize {
        self.start(depth) + self.node(depth).content_size()
    }

    /// Position just before the ancestor at `depth` (`depth() + 1` means the
    /// position itself).
    ///
    /// # Panics
    ///
    /// Panics for depth 0: there is no position before the top-level node.
    pub fn before(&self, depth: usize) -> usize {
        assert!(depth > 0, "there is no position before the top-level node");
        if depth == self.depth() + 1 {
            self.pos
        } else {
            self.path[depth - 1].offset
        }
    }

    /// Position just after the ancestor at `depth`.
    ///
    /// # Panics
    ///
    /// Panics for depth 0: there is no position after the top-level node.
    pub fn after(&self, depth: usize) -> usize {
        assert!(depth > 0, "there is no position after the top-level node");
        if depth == self.depth() + 1 {
            self.pos
        } else {
            self.path[depth - 1].offset + self.path[depth].node.node_size()
        }
    }

    /// Distance into a text node when the position falls inside one.
    pub fn text_offset(&self) -> usize {
        self.pos - self.path[self.depth()].offset
    }

    pub fn node_after(&self) -> Option<Node> {
        let parent = self.parent();
        let index = self.index(self.depth());
        let child = parent.maybe_child(index)?;
        let offset = self.text_offset();
        if offset > 0 {
            Some(child.cut(offset, child.node_size()))
        } else {
            Some(child.clone())
        }
    }

    pub fn node_before(&self) -> Option<Node> {
        let parent = self.parent();
        let index = self.index(self.depth());
        let offset = self.text_offset();
        if offset > 0 {
            return Some(parent.child(index).cut(0, offset));
        }
        if index == 0 {
            None
        } else {
            Some(parent.child(index - 1).clone())
        }
    }

    /// Marks that text inserted here would get.
    pub fn marks(&self) -> Vec<Mark> {
        let parent = self.parent();
        if parent.content().is_empty() {
            return Vec::new();
        }
        let index = self.index(self.depth());
        if self.text_offset() > 0 {
            return parent.child(index).marks().to_vec();
        }
        match index.checked_sub(1).and_then(|i| parent.maybe_child(i)) {
            Some(before) => before.marks().to_vec(),
            None => parent
                .maybe_child(index)
                .map(|after| after.marks().to_vec())
                .unwrap_or_default(),
        }
    }

    /// Deepest depth whose node contains both this position and `pos`.
    pub fn shared_depth(&self, pos: usize) -> usize {
        (1..=self.depth())
            .rev()
            .find(|&depth| self.start(depth) <= pos && self.end(depth) >= pos)
            .unwrap_or(0)
    }

    /// Position of the child at `index` of the ancestor at `depth`.
    pub fn pos_at_index(&self, index: usize, depth: usize) -> usize {
        let node = self.node(depth);
        let mut pos = self.start(depth);
        for child in &node.content().children()[..index] {
            pos += child.node_size();
        }
        pos
    }

    /// The smallest block-level range around this position and `other`: the
    /// deepest ancestor that holds both, spanning whole children.
    pub fn block_range(&self, other: &ResolvedPos) -> Option<NodeRange> {
        if other.pos < self.pos {
            return other.block_range(self);
        }
        let skip = usize::from(self.parent().inline_content() || self.pos == other.pos);
        let top = self.depth().checked_sub(skip)?;
        (0..=top)
            .rev()
            .find(|&depth| other.pos <= self.end(depth))
            .map(|depth| NodeRange::new(self.clone(), other.clone(), depth))
    }
}

/// A run of sibling children of the ancestor at `depth`, spanning whole nodes.
#[derive(Debug, Clone)]
pub struct NodeRange {
    from: ResolvedPos,
    to: ResolvedPos,
    depth: usize,
}

impl NodeRange {
    pub fn new(from: ResolvedPos, to: ResolvedPos, depth: usize) -> Self {
        Self { from, to, depth }
    }

    pub fn from(&self) -> &ResolvedPos {
        &self.from
    }

    pub fn to(&self) -> &ResolvedPos {
        &self.to
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn start(&self) -> usize {
        self.from.before(self.depth + 1)
    }

    pub fn end(&self) -> usize {
        self.to.after(self.depth + 1)
    }

    pub fn parent(&self) -> &Node {
        self.from.node(self.depth)
    }

    pub fn start_index(&self) -> usize {
        self.from.index(self.depth)
    }

    pub fn end_index(&self) -> usize {
        self.to.index_after(self.depth)
    }
}
