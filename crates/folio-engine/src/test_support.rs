//! Document builders shared by the unit tests. Every test uses the same
//! schema instance, since node types from separately built schemas never
//! compare equal.

use std::sync::OnceLock;

use crate::model::{Fragment, Node, Schema};
use crate::setup::folio_schema;

pub(crate) fn schema() -> Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA
        .get_or_init(|| folio_schema().expect("folio schema builds"))
        .clone()
}

fn node(name: &str, children: &[Node]) -> Node {
    schema()
        .node_type(name)
        .unwrap_or_else(|| panic!("no node type {name}"))
        .create(None, Fragment::from_nodes(children.to_vec()), Vec::new())
}

pub(crate) fn doc(children: &[Node]) -> Node {
    node("doc", children)
}

pub(crate) fn ol(items: &[Node]) -> Node {
    node("ordered_list", items)
}

pub(crate) fn li(blocks: &[Node]) -> Node {
    node("list_item", blocks)
}

/// A paragraph of plain text runs; empty strings are skipped.
pub(crate) fn p(texts: &[&str]) -> Node {
    let schema = schema();
    let children: Vec<Node> = texts
        .iter()
        .filter(|text| !text.is_empty())
        .map(|text| schema.text(*text, Vec::new()))
        .collect();
    node("paragraph", &children)
}
