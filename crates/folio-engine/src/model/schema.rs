use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::content::{Automaton, ContentExprError, DfaState};
use super::{AttrValue, Attrs, Fragment, Mark, Node, ReplaceError};
use crate::dom::{DomElement, DomOutput};

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error(transparent)]
    ContentExpr(#[from] ContentExprError),
    #[error("schema is missing its top node type '{0}'")]
    MissingTopNode(String),
    #[error("every schema needs a 'text' node type")]
    MissingText,
    #[error("unknown node type '{0}'")]
    UnknownNodeType(String),
    #[error("unknown mark type '{0}'")]
    UnknownMarkType(String),
    #[error(transparent)]
    InvalidContent(#[from] ReplaceError),
}

/// Serializes a node into its external representation.
pub type NodeToDom = fn(&Node) -> DomOutput;
/// Serializes a mark into the wrapper element around marked text.
pub type MarkToDom = fn(&Mark) -> DomOutput;
/// Reads attributes from a matching element; `None` rejects the match.
pub type GetAttrs = fn(&DomElement) -> Option<Attrs>;

/// Attribute declaration. An attribute without default is required.
#[derive(Debug, Clone, Default)]
pub struct AttrSpec {
    pub default: Option<AttrValue>,
}

/// Recognizes an element of the external representation as a node or mark.
#[derive(Debug, Clone)]
pub struct ParseRule {
    pub tag: &'static str,
    pub get_attrs: Option<GetAttrs>,
}

#[derive(Debug, Clone, Default)]
pub struct NodeSpec {
    pub content: Option<String>,
    /// Space-separated group names.
    pub group: Option<String>,
    pub inline: bool,
    pub atom: bool,
    /// Textblock holding code; input rules do not fire inside it.
    pub code: bool,
    pub attrs: Vec<(String, AttrSpec)>,
    pub to_dom: Option<NodeToDom>,
    pub parse_dom: Vec<ParseRule>,
    /// Text used for this leaf node by `text_between`.
    pub leaf_text: Option<fn(&Node) -> String>,
}

impl NodeSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, expr: impl Into<String>) -> Self {
        self.content = Some(expr.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn inline(mut self) -> Self {
        self.inline = true;
        self
    }

    pub fn atom(mut self) -> Self {
        self.atom = true;
        self
    }

    pub fn code(mut self) -> Self {
        self.code = true;
        self
    }

    pub fn attr(mut self, name: impl Into<String>, default: impl Into<AttrValue>) -> Self {
        self.attrs.push((
            name.into(),
            AttrSpec {
                default: Some(default.into()),
            },
        ));
        self
    }

    pub fn required_attr(mut self, name: impl Into<String>) -> Self {
        self.attrs.push((name.into(), AttrSpec::default()));
        self
    }

    pub fn to_dom(mut self, to_dom: NodeToDom) -> Self {
        self.to_dom = Some(to_dom);
        self
    }

    pub fn parse(mut self, tag: &'static str, get_attrs: Option<GetAttrs>) -> Self {
        self.parse_dom.push(ParseRule { tag, get_attrs });
        self
    }

    pub fn leaf_text(mut self, leaf_text: fn(&Node) -> String) -> Self {
        self.leaf_text = Some(leaf_text);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct MarkSpec {
    pub attrs: Vec<(String, AttrSpec)>,
    pub to_dom: Option<MarkToDom>,
    pub parse_dom: Vec<ParseRule>,
}

impl MarkSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attr(mut self, name: impl Into<String>, default: impl Into<AttrValue>) -> Self {
        self.attrs.push((
            name.into(),
            AttrSpec {
                default: Some(default.into()),
            },
        ));
        self
    }

    pub fn required_attr(mut self, name: impl Into<String>) -> Self {
        self.attrs.push((name.into(), AttrSpec::default()));
        self
    }

    pub fn to_dom(mut self, to_dom: MarkToDom) -> Self {
        self.to_dom = Some(to_dom);
        self
    }

    pub fn parse(mut self, tag: &'static str, get_attrs: Option<GetAttrs>) -> Self {
        self.parse_dom.push(ParseRule { tag, get_attrs });
        self
    }
}

/// Ordered collection of node and mark specs, turned into a [`Schema`] by `build`.
///
/// Adding a spec under an existing name replaces it in place, so helpers can
/// override the defaults they extend.
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    nodes: Vec<(String, NodeSpec)>,
    marks: Vec<(String, MarkSpec)>,
    top_node: String,
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            marks: Vec::new(),
            top_node: "doc".to_string(),
        }
    }
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(mut self, name: impl Into<String>, spec: NodeSpec) -> Self {
        let name = name.into();
        match self.nodes.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = spec,
            None => self.nodes.push((name, spec)),
        }
        self
    }

    pub fn mark(mut self, name: impl Into<String>, spec: MarkSpec) -> Self {
        let name = name.into();
        match self.marks.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = spec,
            None => self.marks.push((name, spec)),
        }
        self
    }

    pub fn top_node(mut self, name: impl Into<String>) -> Self {
        self.top_node = name.into();
        self
    }

    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|(name, _)| name.as_str())
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        let declared: Vec<(String, Vec<String>)> = self
            .nodes
            .iter()
            .map(|(name, spec)| {
                let groups = spec
                    .group
                    .as_deref()
                    .unwrap_or_default()
                    .split_whitespace()
                    .map(str::to_string)
                    .collect();
                (name.clone(), groups)
            })
            .collect();

        let top = declared
            .iter()
            .position(|(name, _)| *name == self.top_node)
            .ok_or_else(|| SchemaError::MissingTopNode(self.top_node.clone()))?;
        let text = declared
            .iter()
            .position(|(name, _)| name == "text")
            .ok_or(SchemaError::MissingText)?;

        let mut nodes = Vec::with_capacity(self.nodes.len());
        for ((name, spec), (_, groups)) in self.nodes.into_iter().zip(declared.iter()) {
            let automaton = match spec.content.as_deref() {
                Some(expr) => Automaton::compile(expr, &declared)?,
                None => Automaton::empty(),
            };
            nodes.push(NodeTypeData {
                is_leaf: automaton.is_empty(),
                block: !(spec.inline || name == "text"),
                inline_content: false,
                groups: groups.clone(),
                name,
                spec,
                automaton,
            });
        }

        for id in 0..nodes.len() {
            let first_edge = nodes[id].automaton.states[0].next.first().map(|(t, _)| *t);
            nodes[id].inline_content = first_edge.is_some_and(|t| !nodes[t].block);
        }

        let marks = self
            .marks
            .into_iter()
            .map(|(name, spec)| MarkTypeData { name, spec })
            .collect();

        Ok(Schema {
            inner: Arc::new(SchemaInner {
                nodes,
                marks,
                top,
                text,
            }),
        })
    }
}

#[derive(Debug)]
pub(crate) struct SchemaInner {
    nodes: Vec<NodeTypeData>,
    marks: Vec<MarkTypeData>,
    top: usize,
    text: usize,
}

#[derive(Debug)]
struct NodeTypeData {
    name: String,
    spec: NodeSpec,
    groups: Vec<String>,
    automaton: Automaton,
    is_leaf: bool,
    block: bool,
    inline_content: bool,
}

#[derive(Debug)]
struct MarkTypeData {
    name: String,
    spec: MarkSpec,
}

/// Document schema: the node and mark types a document may contain and the
/// content grammar of each node type. Cheap to clone.
#[derive(Clone)]
pub struct Schema {
    inner: Arc<SchemaInner>,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("nodes", &self.inner.nodes.iter().map(|n| &n.name).collect::<Vec<_>>())
            .field("marks", &self.inner.marks.iter().map(|m| &m.name).collect::<Vec<_>>())
            .finish()
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    pub fn node_type(&self, name: &str) -> Option<NodeType> {
        self.inner
            .nodes
            .iter()
            .position(|data| data.name == name)
            .map(|id| NodeType {
                schema: self.inner.clone(),
                id,
            })
    }

    pub fn mark_type(&self, name: &str) -> Option<MarkType> {
        self.inner
            .marks
            .iter()
            .position(|data| data.name == name)
            .map(|id| MarkType {
                schema: self.inner.clone(),
                id,
            })
    }

    pub fn node_types(&self) -> impl Iterator<Item = NodeType> + '_ {
        (0..self.inner.nodes.len()).map(|id| NodeType {
            schema: self.inner.clone(),
            id,
        })
    }

    pub fn mark_types(&self) -> impl Iterator<Item = MarkType> + '_ {
        (0..self.inner.marks.len()).map(|id| MarkType {
            schema: self.inner.clone(),
            id,
        })
    }

    pub fn top_node_type(&self) -> NodeType {
        NodeType {
            schema: self.inner.clone(),
            id: self.inner.top,
        }
    }

    pub fn text_type(&self) -> NodeType {
        NodeType {
            schema: self.inner.clone(),
            id: self.inner.text,
        }
    }

    /// Create a text node. Empty text is not a valid node.
    pub fn text(&self, text: impl Into<String>, marks: Vec<Mark>) -> Node {
        Node::new_text(self.text_type(), text.into(), marks)
    }

    /// Create a node by type name, checking its content against the grammar.
    pub fn node(
        &self,
        name: &str,
        attrs: Option<&Attrs>,
        content: Vec<Node>,
    ) -> Result<Node, SchemaError> {
        let node_type = self
            .node_type(name)
            .ok_or_else(|| SchemaError::UnknownNodeType(name.to_string()))?;
        Ok(node_type.create_checked(attrs, Fragment::from_nodes(content), Vec::new())?)
    }

    pub fn mark(&self, name: &str, attrs: Option<&Attrs>) -> Result<Mark, SchemaError> {
        let mark_type = self
            .mark_type(name)
            .ok_or_else(|| SchemaError::UnknownMarkType(name.to_string()))?;
        Ok(mark_type.create(attrs))
    }
}

fn compute_attrs(specs: &[(String, AttrSpec)], given: Option<&Attrs>) -> Attrs {
    specs
        .iter()
        .map(|(name, spec)| {
            let value = given
                .and_then(|given| given.get(name))
                .cloned()
                .or_else(|| spec.default.clone())
                .unwrap_or(AttrValue::Null);
            (name.clone(), value)
        })
        .collect()
}

/// Handle to a node type of a [`Schema`].
#[derive(Clone)]
pub struct NodeType {
    schema: Arc<SchemaInner>,
    id: usize,
}

impl PartialEq for NodeType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Arc::ptr_eq(&self.schema, &other.schema)
    }
}

impl Eq for NodeType {}

impl fmt::Debug for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeType({})", self.name())
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl NodeType {
    fn data(&self) -> &NodeTypeData {
        &self.schema.nodes[self.id]
    }

    pub fn schema(&self) -> Schema {
        Schema {
            inner: self.schema.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.data().name
    }

    pub fn spec(&self) -> &NodeSpec {
        &self.data().spec
    }

    pub fn is_in_group(&self, group: &str) -> bool {
        self.data().groups.iter().any(|g| g == group)
    }

    pub fn is_text(&self) -> bool {
        self.id == self.schema.text
    }

    pub fn is_block(&self) -> bool {
        self.data().block
    }

    pub fn is_inline(&self) -> bool {
        !self.data().block
    }

    pub fn is_leaf(&self) -> bool {
        self.data().is_leaf
    }

    pub fn is_atom(&self) -> bool {
        self.is_leaf() || self.spec().atom
    }

    pub fn inline_content(&self) -> bool {
        self.data().inline_content
    }

    pub fn is_textblock(&self) -> bool {
        self.is_block() && self.inline_content()
    }

    pub fn has_required_attrs(&self) -> bool {
        self.spec().attrs.iter().any(|(_, spec)| spec.default.is_none())
    }

    pub fn content_match(&self) -> ContentMatch {
        ContentMatch {
            schema: self.schema.clone(),
            owner: self.id,
            state: 0,
        }
    }

    pub fn compute_attrs(&self, given: Option<&Attrs>) -> Attrs {
        compute_attrs(&self.spec().attrs, given)
    }

    /// Create a node of this type without checking its content.
    pub fn create(&self, attrs: Option<&Attrs>, content: Fragment, marks: Vec<Mark>) -> Node {
        Node::new(self.clone(), self.compute_attrs(attrs), content, marks)
    }

    pub fn create_checked(
        &self,
        attrs: Option<&Attrs>,
        content: Fragment,
        marks: Vec<Mark>,
    ) -> Result<Node, ReplaceError> {
        self.check_content(&content)?;
        Ok(self.create(attrs, content, marks))
    }

    pub fn valid_content(&self, content: &Fragment) -> bool {
        self.content_match()
            .match_fragment(content)
            .is_some_and(|end| end.valid_end())
    }

    pub fn check_content(&self, content: &Fragment) -> Result<(), ReplaceError> {
        if self.valid_content(content) {
            Ok(())
        } else {
            Err(ReplaceError::InvalidContent {
                node_type: self.name().to_string(),
                content: content.to_string(),
            })
        }
    }

    /// Whether nodes of `other` could have their content joined onto a node of this type.
    pub fn compatible_content(&self, other: &NodeType) -> bool {
        self == other || self.content_match().compatible(&other.content_match())
    }
}

/// Handle to a mark type of a [`Schema`].
#[derive(Clone)]
pub struct MarkType {
    schema: Arc<SchemaInner>,
    id: usize,
}

impl PartialEq for MarkType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Arc::ptr_eq(&self.schema, &other.schema)
    }
}

impl Eq for MarkType {}

impl fmt::Debug for MarkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MarkType({})", self.name())
    }
}

impl MarkType {
    pub fn name(&self) -> &str {
        &self.schema.marks[self.id].name
    }

    pub fn spec(&self) -> &MarkSpec {
        &self.schema.marks[self.id].spec
    }

    /// Position of the type in the schema; mark sets are kept sorted by rank.
    pub fn rank(&self) -> usize {
        self.id
    }

    pub fn create(&self, attrs: Option<&Attrs>) -> Mark {
        Mark::new(self.clone(), compute_attrs(&self.spec().attrs, attrs))
    }
}

/// A state in the content automaton of a node type.
#[derive(Clone)]
pub struct ContentMatch {
    schema: Arc<SchemaInner>,
    owner: usize,
    state: usize,
}

impl fmt::Debug for ContentMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ContentMatch({}#{}{})",
            self.schema.nodes[self.owner].name,
            self.state,
            if self.valid_end() { ", end" } else { "" }
        )
    }
}

impl ContentMatch {
    fn dfa_state(&self) -> &DfaState {
        &self.schema.nodes[self.owner].automaton.states[self.state]
    }

    fn at(&self, state: usize) -> ContentMatch {
        ContentMatch {
            schema: self.schema.clone(),
            owner: self.owner,
            state,
        }
    }

    fn node_type(&self, id: usize) -> NodeType {
        NodeType {
            schema: self.schema.clone(),
            id,
        }
    }

    /// True when the children matched so far form a complete, valid sequence.
    pub fn valid_end(&self) -> bool {
        self.dfa_state().valid_end
    }

    pub fn edge_count(&self) -> usize {
        self.dfa_state().next.len()
    }

    pub fn edge(&self, index: usize) -> Option<(NodeType, ContentMatch)> {
        self.dfa_state()
            .next
            .get(index)
            .map(|&(t, next)| (self.node_type(t), self.at(next)))
    }

    pub fn edges(&self) -> impl Iterator<Item = (NodeType, ContentMatch)> + '_ {
        self.dfa_state()
            .next
            .iter()
            .map(|&(t, next)| (self.node_type(t), self.at(next)))
    }

    pub fn match_type(&self, node_type: &NodeType) -> Option<ContentMatch> {
        if !Arc::ptr_eq(&self.schema, &node_type.schema) {
            return None;
        }
        self.dfa_state()
            .next
            .iter()
            .find(|(t, _)| *t == node_type.id)
            .map(|&(_, next)| self.at(next))
    }

    pub fn match_fragment(&self, fragment: &Fragment) -> Option<ContentMatch> {
        self.match_fragment_range(fragment, 0, fragment.child_count())
    }

    /// Match the children `start..end` of `fragment`.
    pub fn match_fragment_range(
        &self,
        fragment: &Fragment,
        start: usize,
        end: usize,
    ) -> Option<ContentMatch> {
        let mut current = self.clone();
        for child in &fragment.children()[start..end] {
            current = current.match_type(child.node_type())?;
        }
        Some(current)
    }

    pub fn inline_content(&self) -> bool {
        self.dfa_state()
            .next
            .first()
            .is_some_and(|&(t, _)| !self.schema.nodes[t].block)
    }

    /// First type that can be created here without required attributes.
    pub fn default_type(&self) -> Option<NodeType> {
        self.edges()
            .map(|(node_type, _)| node_type)
            .find(|node_type| !node_type.is_text() && !node_type.has_required_attrs())
    }

    /// Whether both states accept at least one common child type.
    pub fn compatible(&self, other: &ContentMatch) -> bool {
        self.edges()
            .any(|(mine, _)| other.edges().any(|(theirs, _)| mine == theirs))
    }

    /// Shortest sequence of wrapper types, outermost first, that makes a node of
    /// `target` acceptable at this point. Empty when `target` fits directly.
    pub fn find_wrapping(&self, target: &NodeType) -> Option<Vec<NodeType>> {
        struct Active {
            matched: ContentMatch,
            via: Option<(NodeType, usize)>,
        }

        let mut seen = vec![false; self.schema.nodes.len()];
        let mut visited: Vec<Active> = Vec::new();
        let mut queue = VecDeque::from([Active {
            matched: self.clone(),
            via: None,
        }]);

        while let Some(current) = queue.pop_front() {
            if current.matched.match_type(target).is_some() {
                let mut result = Vec::new();
                let mut link = current.via.clone();
                while let Some((node_type, parent)) = link {
                    result.push(node_type);
                    link = visited[parent].via.clone();
                }
                result.reverse();
                return Some(result);
            }

            let index = visited.len();
            for (node_type, next) in current.matched.edges() {
                if !node_type.is_leaf()
                    && !node_type.has_required_attrs()
                    && !seen[node_type.id]
                    && (current.via.is_none() || next.valid_end())
                {
                    seen[node_type.id] = true;
                    queue.push_back(Active {
                        matched: node_type.content_match(),
                        via: Some((node_type, index)),
                    });
                }
            }
            visited.push(current);
        }
        None
    }
}
