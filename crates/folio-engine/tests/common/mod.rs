#![allow(dead_code)]

use std::sync::OnceLock;

use folio_engine::model::{Fragment, Node, Schema};
use folio_engine::{EditorState, TextSelection, folio_schema};

pub fn schema() -> Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| folio_schema().unwrap()).clone()
}

pub fn node(name: &str, children: Vec<Node>) -> Node {
    schema()
        .node_type(name)
        .unwrap()
        .create(None, Fragment::from_nodes(children), Vec::new())
}

pub fn doc(children: Vec<Node>) -> Node {
    node("doc", children)
}

pub fn ol(items: Vec<Node>) -> Node {
    node("ordered_list", items)
}

pub fn ul(items: Vec<Node>) -> Node {
    node("bullet_list", items)
}

pub fn li(blocks: Vec<Node>) -> Node {
    node("list_item", blocks)
}

pub fn p(text: &str) -> Node {
    let schema = schema();
    let content = if text.is_empty() {
        Vec::new()
    } else {
        vec![schema.text(text, Vec::new())]
    };
    node("paragraph", content)
}

pub fn state(doc: Node, from: usize, to: usize) -> EditorState {
    EditorState::new(schema(), doc, Some(TextSelection::new(from, to)))
}

/// Every position inside a textblock, the places a cursor can be.
pub fn text_positions(doc: &Node) -> Vec<usize> {
    let mut positions = Vec::new();
    doc.descendants(&mut |node: &Node, pos: usize, _parent: Option<&Node>, _index: usize| {
        if node.is_textblock() {
            positions.extend(pos + 1..=pos + 1 + node.content_size());
            return false;
        }
        true
    });
    positions
}
