//! # External Representation
//!
//! Documents leave and enter the editor as a small element tree, [`DomNode`],
//! which renders to HTML. Each node and mark type maps itself through the
//! `to_dom` / `parse_dom` entries of its spec.

use html_escape::{encode_double_quoted_attribute, encode_text};
use thiserror::Error;

use crate::model::{Fragment, Mark, Node, NodeType, ReplaceError, Schema};

#[derive(Debug, Error)]
pub enum DomParseError {
    #[error("no node type for element <{0}>")]
    UnknownElement(String),
    #[error(transparent)]
    InvalidContent(#[from] ReplaceError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomNode {
    Element(DomElement),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomElement {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<DomNode>,
}

impl DomElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: DomNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_child(DomNode::Text(text.into()))
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Value of one declaration in the inline `style` attribute.
    pub fn style_property(&self, property: &str) -> Option<String> {
        self.attr("style")?.split(';').find_map(|declaration| {
            let (name, value) = declaration.split_once(':')?;
            (name.trim().eq_ignore_ascii_case(property)).then(|| value.trim().to_string())
        })
    }
}

/// Where a node's content goes inside the element its `to_dom` produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomContent {
    /// The node's children are rendered inside the element.
    Hole,
    /// Fixed text, used by atom nodes.
    Text(String),
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomOutput {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub content: DomContent,
}

impl DomOutput {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            content: DomContent::Hole,
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.content = DomContent::Text(text.into());
        self
    }

    pub fn empty(mut self) -> Self {
        self.content = DomContent::Empty;
        self
    }
}

/// Serialize a node into its external representation.
pub fn node_to_dom(node: &Node) -> DomNode {
    if let Some(text) = node.text() {
        return wrap_in_marks(DomNode::Text(text.to_string()), node.marks());
    }

    let children = fragment_to_dom(node.content());
    let Some(to_dom) = node.node_type().spec().to_dom else {
        // Types without an external form (e.g. the document) render as a fragment container.
        let mut element = DomElement::new("div");
        element.children = children;
        return DomNode::Element(element);
    };

    let output = to_dom(node);
    let mut element = DomElement::new(output.tag);
    element.attrs = output.attrs;
    match output.content {
        DomContent::Hole => element.children = children,
        DomContent::Text(text) => element.children.push(DomNode::Text(text)),
        DomContent::Empty => {}
    }
    wrap_in_marks(DomNode::Element(element), node.marks())
}

pub fn fragment_to_dom(fragment: &Fragment) -> Vec<DomNode> {
    fragment.iter().map(node_to_dom).collect()
}

fn wrap_in_marks(mut inner: DomNode, marks: &[Mark]) -> DomNode {
    for mark in marks.iter().rev() {
        let Some(to_dom) = mark.mark_type().spec().to_dom else {
            continue;
        };
        let output = to_dom(mark);
        let mut element = DomElement::new(output.tag);
        element.attrs = output.attrs;
        element.children.push(inner);
        inner = DomNode::Element(element);
    }
    inner
}

/// Render DOM nodes as HTML.
pub fn serialize_html(nodes: &[DomNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_html(node, &mut out);
    }
    out
}

fn write_html(node: &DomNode, out: &mut String) {
    match node {
        DomNode::Text(text) => out.push_str(&encode_text(text)),
        DomNode::Element(element) => {
            out.push('<');
            out.push_str(&element.tag);
            for (name, value) in &element.attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&encode_double_quoted_attribute(value));
                out.push('"');
            }
            if is_void_element(&element.tag) {
                out.push('>');
                return;
            }
            out.push('>');
            for child in &element.children {
                write_html(child, out);
            }
            out.push_str("</");
            out.push_str(&element.tag);
            out.push('>');
        }
    }
}

fn is_void_element(tag: &str) -> bool {
    matches!(tag, "br" | "hr" | "img")
}

/// Serialize a whole document's content as HTML.
pub fn document_to_html(doc: &Node) -> String {
    serialize_html(&fragment_to_dom(doc.content()))
}

/// Parse an element tree into a document whose content is `nodes`.
pub fn parse_document(schema: &Schema, nodes: &[DomNode]) -> Result<Node, DomParseError> {
    let top = schema.top_node_type();
    let content = parse_children(schema, &top, nodes, &[])?;
    Ok(top.create_checked(None, content, Vec::new())?)
}

fn parse_children(
    schema: &Schema,
    parent: &NodeType,
    nodes: &[DomNode],
    marks: &[Mark],
) -> Result<Fragment, DomParseError> {
    let mut parsed = Vec::new();
    collect_nodes(schema, nodes, marks, &mut parsed)?;

    if parent.inline_content() {
        return Ok(Fragment::from_nodes(parsed));
    }

    // Inline runs inside block containers go into the default textblock.
    let mut blocks = Vec::new();
    let mut run: Vec<Node> = Vec::new();
    for node in parsed {
        if node.is_inline() {
            run.push(node);
            continue;
        }
        if let Some(block) = flush_inline_run(parent, &blocks, &mut run)? {
            blocks.push(block);
        }
        blocks.push(node);
    }
    if let Some(block) = flush_inline_run(parent, &blocks, &mut run)? {
        blocks.push(block);
    }
    Ok(Fragment::from_nodes(blocks))
}

fn flush_inline_run(
    parent: &NodeType,
    blocks: &[Node],
    run: &mut Vec<Node>,
) -> Result<Option<Node>, DomParseError> {
    // Whitespace between block elements carries no content.
    run.retain(|node| node.text().is_none_or(|text| !text.trim().is_empty()));
    if run.is_empty() {
        return Ok(None);
    }
    let fragment = Fragment::from_nodes(blocks.to_vec());
    let wrapper = parent
        .content_match()
        .match_fragment(&fragment)
        .and_then(|matched| matched.default_type())
        .ok_or_else(|| DomParseError::UnknownElement("#text".to_string()))?;
    let content = Fragment::from_nodes(std::mem::take(run));
    Ok(Some(wrapper.create_checked(None, content, Vec::new())?))
}

fn collect_nodes(
    schema: &Schema,
    nodes: &[DomNode],
    marks: &[Mark],
    out: &mut Vec<Node>,
) -> Result<(), DomParseError> {
    for dom in nodes {
        match dom {
            DomNode::Text(text) => {
                if !text.is_empty() {
                    out.push(schema.text(text.clone(), marks.to_vec()));
                }
            }
            DomNode::Element(element) => {
                if let Some((node_type, attrs)) = match_node_rule(schema, element) {
                    let content = if node_type.is_leaf() {
                        Fragment::empty()
                    } else {
                        parse_children(schema, &node_type, &element.children, &[])?
                    };
                    let node_marks = if node_type.is_inline() {
                        marks.to_vec()
                    } else {
                        Vec::new()
                    };
                    out.push(node_type.create_checked(attrs.as_ref(), content, node_marks)?);
                } else {
                    // Mark elements add their marks; unknown wrappers are transparent.
                    let marks = match_mark_rules(schema, element)
                        .iter()
                        .fold(marks.to_vec(), |set, mark| mark.add_to_set(&set));
                    collect_nodes(schema, &element.children, &marks, out)?;
                }
            }
        }
    }
    Ok(())
}

fn match_node_rule(
    schema: &Schema,
    element: &DomElement,
) -> Option<(NodeType, Option<crate::model::Attrs>)> {
    schema.node_types().find_map(|node_type| {
        node_type.spec().parse_dom.iter().find_map(|rule| {
            if !rule.tag.eq_ignore_ascii_case(&element.tag) {
                return None;
            }
            match rule.get_attrs {
                Some(get_attrs) => get_attrs(element).map(|attrs| (node_type.clone(), Some(attrs))),
                None => Some((node_type.clone(), None)),
            }
        })
    })
}

/// Every mark whose rule matches; one styled span may carry several.
fn match_mark_rules(schema: &Schema, element: &DomElement) -> Vec<Mark> {
    schema
        .mark_types()
        .filter_map(|mark_type| {
            mark_type.spec().parse_dom.iter().find_map(|rule| {
                if !rule.tag.eq_ignore_ascii_case(&element.tag) {
                    return None;
                }
                match rule.get_attrs {
                    Some(get_attrs) => {
                        get_attrs(element).map(|attrs| mark_type.create(Some(&attrs)))
                    }
                    None => Some(mark_type.create(None)),
                }
            })
        })
        .collect()
}
