use folio_engine::dom::{DomElement, DomNode, fragment_to_dom};
use folio_engine::model::Attrs;
use folio_engine::{ListAttrs, ListKind, ListStyle, document_to_html, parse_document};
use pretty_assertions::assert_eq;
use rstest::rstest;

mod common;
use common::{doc, li, node, ol, p, schema, ul};

fn list_with(
    kind: ListKind,
    attrs: ListAttrs,
    items: Vec<folio_engine::Node>,
) -> folio_engine::Node {
    let attrs: Attrs = attrs.to_attrs();
    schema()
        .node_type(kind.node_name())
        .unwrap()
        .create(Some(&attrs), folio_engine::Fragment::from_nodes(items), Vec::new())
}

#[test]
fn default_list_attributes_are_not_exported() {
    let html = document_to_html(&doc(vec![ol(vec![li(vec![p("a")])]), ul(vec![li(vec![p("b")])])]));
    insta::assert_snapshot!(html, @"<ol><li><p>a</p></li></ol><ul><li><p>b</p></li></ul>");
}

#[test]
fn start_and_type_are_exported_when_not_default() {
    let list = list_with(
        ListKind::Ordered,
        ListAttrs::new(ListKind::Ordered, 5, ListStyle::UpperRoman),
        vec![li(vec![p("five")])],
    );
    insta::assert_snapshot!(
        document_to_html(&doc(vec![list])),
        @r#"<ol start="5" type="I"><li><p>five</p></li></ol>"#
    );
}

#[rstest]
#[case(ListKind::Ordered, 5, ListStyle::UpperRoman)]
#[case(ListKind::Ordered, 1, ListStyle::LowerAlpha)]
#[case(ListKind::Ordered, 12, ListStyle::Decimal)]
#[case(ListKind::Bullet, 1, ListStyle::Square)]
fn list_attributes_survive_export_and_import(
    #[case] kind: ListKind,
    #[case] order: u32,
    #[case] style: ListStyle,
) {
    let original = doc(vec![list_with(
        kind,
        ListAttrs::new(kind, order, style),
        vec![li(vec![p("x")])],
    )]);

    let dom = fragment_to_dom(original.content());
    let parsed = parse_document(&schema(), &dom).unwrap();

    let attrs = ListAttrs::of_node(parsed.child(0)).unwrap();
    assert_eq!((attrs.order, attrs.style), (order, style));
    assert_eq!(parsed, original);
}

#[rstest]
#[case(Some("abc"), None, 1, ListStyle::Decimal)]
#[case(Some("0"), Some("i"), 1, ListStyle::LowerRoman)]
#[case(Some("3"), Some("disc"), 3, ListStyle::Decimal)]
#[case(None, Some("upper-alpha"), 1, ListStyle::UpperAlpha)]
#[case(None, Some("7"), 1, ListStyle::Decimal)]
fn malformed_import_falls_back_to_defaults(
    #[case] start: Option<&str>,
    #[case] code: Option<&str>,
    #[case] order: u32,
    #[case] style: ListStyle,
) {
    let mut element = DomElement::new("ol");
    if let Some(start) = start {
        element = element.with_attr("start", start);
    }
    if let Some(code) = code {
        element = element.with_attr("type", code);
    }
    let element = element.with_child(DomNode::Element(DomElement::new("li").with_text("item")));

    let parsed = parse_document(&schema(), &[DomNode::Element(element)]).unwrap();

    let attrs = ListAttrs::of_node(parsed.child(0)).unwrap();
    assert_eq!((attrs.order, attrs.style), (order, style));
}

#[test]
fn mixed_document_renders() {
    let schema = schema();
    let heading = schema
        .node(
            "heading",
            Some(&folio_engine::attrs! { "level" => 2i64 }),
            vec![schema.text("Notes", Vec::new())],
        )
        .unwrap();
    let rule = node("horizontal_rule", Vec::new());
    let html = document_to_html(&doc(vec![heading, p("1 < 2"), rule]));
    insta::assert_snapshot!(html, @"<h2>Notes</h2><p>1 &lt; 2</p><hr>");
}
