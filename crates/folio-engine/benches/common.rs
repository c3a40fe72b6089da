// Benchmark helpers; each bench file pulls in only what it needs.
#![allow(dead_code)]

use folio_engine::model::{Fragment, Node, Schema};

/// A document of `count` paragraphs followed by an ordered list of `count` items.
pub fn generate_document(schema: &Schema, count: usize) -> Node {
    let node = |name: &str, children: Vec<Node>| {
        schema
            .node_type(name)
            .expect("benchmark schema has the node type")
            .create(None, Fragment::from_nodes(children), Vec::new())
    };
    let paragraph = |i: usize| {
        let text = schema.text(format!("Paragraph {i} with some text"), Vec::new());
        node("paragraph", vec![text])
    };

    let mut blocks: Vec<Node> = (0..count).map(paragraph).collect();
    let items = (0..count).map(|i| node("list_item", vec![paragraph(i)])).collect();
    blocks.push(node("ordered_list", items));
    node("doc", blocks)
}
