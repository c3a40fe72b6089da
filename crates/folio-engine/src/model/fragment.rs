use std::fmt;

use super::Node;

/// Immutable sequence of sibling nodes with a cached token size.
///
/// Children are reference-counted, so cutting and appending fragments shares
/// every untouched subtree with the source.
#[derive(Clone, Default, PartialEq)]
pub struct Fragment {
    children: Vec<Node>,
    size: usize,
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<")?;
        for (i, child) in self.children.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{child}")?;
        }
        write!(f, ">")
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Fragment {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a fragment, joining adjacent text nodes with the same marks.
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        let mut children: Vec<Node> = Vec::with_capacity(nodes.len());
        for node in nodes {
            push_joined(&mut children, node);
        }
        let size = children.iter().map(Node::node_size).sum();
        Self { children, size }
    }

    pub fn from_node(node: Node) -> Self {
        let size = node.node_size();
        Self {
            children: vec![node],
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.children.iter()
    }

    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn child(&self, index: usize) -> &Node {
        &self.children[index]
    }

    pub fn maybe_child(&self, index: usize) -> Option<&Node> {
        self.children.get(index)
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.children.first()
    }

    pub fn last_child(&self) -> Option<&Node> {
        self.children.last()
    }

    pub fn append(&self, other: &Fragment) -> Fragment {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut children = self.children.clone();
        for child in &other.children {
            push_joined(&mut children, child.clone());
        }
        let size = children.iter().map(Node::node_size).sum();
        Fragment { children, size }
    }

    /// Content between two offsets, cutting into the boundary nodes.
    pub fn cut(&self, from: usize, to: usize) -> Fragment {
        if from == 0 && to == self.size {
            return self.clone();
        }
        let mut result = Vec::new();
        let mut size = 0;
        if to > from {
            let mut pos = 0;
            for child in &self.children {
                if pos >= to {
                    break;
                }
                let end = pos + child.node_size();
                if end > from {
                    let child = if pos < from || end > to {
                        if child.is_text() {
                            child.cut(from.saturating_sub(pos), (to - pos).min(child.node_size()))
                        } else {
                            child.cut(
                                from.saturating_sub(pos + 1),
                                to.saturating_sub(pos + 1).min(child.content_size()),
                            )
                        }
                    } else {
                        child.clone()
                    };
                    size += child.node_size();
                    result.push(child);
                }
                pos = end;
            }
        }
        Fragment {
            children: result,
            size,
        }
    }

    pub fn cut_by_index(&self, from: usize, to: usize) -> Fragment {
        if from == to {
            return Fragment::empty();
        }
        if from == 0 && to == self.children.len() {
            return self.clone();
        }
        let children = self.children[from..to].to_vec();
        let size = children.iter().map(Node::node_size).sum();
        Fragment { children, size }
    }

    pub fn replace_child(&self, index: usize, node: Node) -> Fragment {
        let mut children = self.children.clone();
        let size = self.size - children[index].node_size() + node.node_size();
        children[index] = node;
        Fragment { children, size }
    }

    pub fn add_to_start(&self, node: Node) -> Fragment {
        let size = self.size + node.node_size();
        let mut children = Vec::with_capacity(self.children.len() + 1);
        children.push(node);
        children.extend(self.children.iter().cloned());
        Fragment { children, size }
    }

    pub fn add_to_end(&self, node: Node) -> Fragment {
        let size = self.size + node.node_size();
        let mut children = self.children.clone();
        children.push(node);
        Fragment { children, size }
    }

    /// Child index and start offset of the child containing `pos`. A position on
    /// a child boundary resolves to the child after it.
    pub fn find_index(&self, pos: usize) -> (usize, usize) {
        if pos == 0 {
            return (0, 0);
        }
        if pos >= self.size {
            return (self.children.len(), self.size);
        }
        let mut cur = 0;
        for (i, child) in self.children.iter().enumerate() {
            let end = cur + child.node_size();
            if end >= pos {
                if end == pos {
                    return (i + 1, end);
                }
                return (i, cur);
            }
            cur = end;
        }
        (self.children.len(), self.size)
    }

    /// Visit every descendant overlapping `from..to`. `f` receives the node, its
    /// absolute start position, its parent and its index, and returns whether to
    /// descend into it.
    pub fn nodes_between<F>(
        &self,
        from: usize,
        to: usize,
        f: &mut F,
        node_start: usize,
        parent: Option<&Node>,
    ) where
        F: FnMut(&Node, usize, Option<&Node>, usize) -> bool,
    {
        let mut pos = 0;
        for (i, child) in self.children.iter().enumerate() {
            if pos >= to {
                break;
            }
            let end = pos + child.node_size();
            if end > from && f(child, node_start + pos, parent, i) && child.content_size() > 0 {
                let start = pos + 1;
                child.content().nodes_between(
                    from.saturating_sub(start),
                    (to - start).min(child.content_size()),
                    f,
                    node_start + start,
                    Some(child),
                );
            }
            pos = end;
        }
    }

    /// Text in `from..to`, with `block_separator` between textblocks and
    /// `leaf_text` standing in for leaf nodes.
    pub fn text_between(
        &self,
        from: usize,
        to: usize,
        block_separator: Option<&str>,
        leaf_text: Option<&str>,
    ) -> String {
        let mut text = String::new();
        let mut first = true;
        self.nodes_between(
            from,
            to,
            &mut |node: &Node, pos: usize, _parent: Option<&Node>, _index: usize| {
                let node_text = if let Some(value) = node.text() {
                    let start = from.saturating_sub(pos);
                    let end = to.saturating_sub(pos).min(node.node_size());
                    value.chars().skip(start).take(end.saturating_sub(start)).collect()
                } else if !node.is_leaf() {
                    String::new()
                } else if let Some(leaf) = leaf_text {
                    leaf.to_string()
                } else if let Some(leaf) = node.node_type().spec().leaf_text {
                    leaf(node)
                } else {
                    String::new()
                };

                if let Some(separator) = block_separator
                    && ((node.is_block() && node.is_leaf() && !node_text.is_empty())
                        || node.is_textblock())
                {
                    if first {
                        first = false;
                    } else {
                        text.push_str(separator);
                    }
                }
                text.push_str(&node_text);
                true
            },
            0,
            None,
        );
        text
    }
}

fn push_joined(children: &mut Vec<Node>, node: Node) {
    if let Some(last) = children.last_mut()
        && let (Some(prev), Some(next)) = (last.text(), node.text())
        && last.same_markup(&node)
    {
        let joined = format!("{prev}{next}");
        *last = last.with_text(joined);
        return;
    }
    children.push(node);
}

impl<'a> IntoIterator for &'a Fragment {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.children.iter()
    }
}
