use folio_engine::commands::{Command, WrapInList};
use folio_engine::model::NodeType;
use folio_engine::{EditorAction, ListAttrs, ListStyle, Transaction};
use pretty_assertions::assert_eq;
use rstest::rstest;

mod common;
use common::{doc, li, ol, p, schema, state, text_positions, ul};

fn list_type(name: &str) -> NodeType {
    schema().node_type(name).unwrap()
}

fn wrap(name: &str) -> WrapInList {
    WrapInList::new(list_type(name), None)
}

fn sample_documents() -> Vec<folio_engine::Node> {
    vec![
        doc(vec![p("one")]),
        doc(vec![p("a"), p("b"), p("c")]),
        doc(vec![ol(vec![li(vec![p("a")]), li(vec![p("b")])])]),
        doc(vec![ol(vec![li(vec![p("a")]), li(vec![p("b"), p("c")])]), p("d")]),
        doc(vec![ul(vec![li(vec![p("x")])]), p(""), ol(vec![li(vec![p("y")])])]),
    ]
}

#[rstest]
fn probing_never_changes_the_document(#[values("ordered_list", "bullet_list")] name: &str) {
    let command = wrap(name);
    for document in sample_documents() {
        let positions = text_positions(&document);
        for &from in &positions {
            for &to in positions.iter().filter(|&&to| to >= from) {
                let state = state(document.clone(), from, to);
                command.execute(&state, None);
                assert_eq!(state.doc(), &document);
            }
        }
    }
}

#[rstest]
fn probe_and_apply_agree(#[values("ordered_list", "bullet_list")] name: &str) {
    let command = wrap(name);
    for document in sample_documents() {
        let positions = text_positions(&document);
        for &from in &positions {
            for &to in positions.iter().filter(|&&to| to >= from) {
                let state = state(document.clone(), from, to);
                let probed = command.can_execute(&state);
                assert_eq!(probed, command.can_execute(&state), "probe is repeatable");

                let mut built: Option<Transaction> = None;
                let applied =
                    command.execute(&state, Some(&mut |tr: Transaction| built = Some(tr)));
                assert_eq!(applied, probed, "selection {from}..{to} in {document}");

                let mut rebuilt: Option<Transaction> = None;
                command.execute(&state, Some(&mut |tr: Transaction| rebuilt = Some(tr)));
                if let (Some(tr), Some(again)) = (built, rebuilt) {
                    tr.doc().check().unwrap();
                    assert!(tr.scrolled_into_view());
                    assert_eq!(tr.doc(), again.doc(), "same tree for {from}..{to} in {document}");
                }
            }
        }
    }
}

#[test]
fn single_paragraph_becomes_one_item() {
    let state = state(doc(vec![p("hello")]), 3, 3);
    let next = EditorAction::WrapInList(wrap("ordered_list")).run(&state).unwrap();

    assert_eq!(next.doc(), &doc(vec![ol(vec![li(vec![p("hello")])])]));
    let attrs = ListAttrs::of_node(next.doc().child(0)).unwrap();
    assert_eq!((attrs.order, attrs.style), (1, ListStyle::Decimal));
}

#[test]
fn each_selected_paragraph_gets_its_own_item() {
    // Positions: p(a) 0..3, p(b) 3..6, p(c) 6..9.
    let state = state(doc(vec![p("a"), p("b"), p("c")]), 1, 8);
    let next = EditorAction::WrapInList(wrap("bullet_list")).run(&state).unwrap();

    assert_eq!(
        next.doc(),
        &doc(vec![ul(vec![li(vec![p("a")]), li(vec![p("b")]), li(vec![p("c")])])])
    );
}

#[test]
fn partial_selection_leaves_other_paragraphs_alone() {
    let state = state(doc(vec![p("a"), p("b"), p("c")]), 4, 4);
    let next = EditorAction::WrapInList(wrap("ordered_list")).run(&state).unwrap();

    assert_eq!(next.doc(), &doc(vec![p("a"), ol(vec![li(vec![p("b")])]), p("c")]));
}

#[test]
fn second_item_nests_into_the_first() {
    // Cursor at the start of the second item's paragraph.
    let state = state(doc(vec![ol(vec![li(vec![p("a")]), li(vec![p("b")])])]), 8, 8);
    let next = EditorAction::WrapInList(wrap("ordered_list")).run(&state).unwrap();

    assert_eq!(next.doc().child_count(), 1, "no second top-level list");
    assert_eq!(
        next.doc(),
        &doc(vec![ol(vec![li(vec![p("a"), ol(vec![li(vec![p("b")])])])])])
    );
}

#[test]
fn first_item_is_not_applicable() {
    let document = doc(vec![ol(vec![li(vec![p("a")]), li(vec![p("b")])])]);
    let state = state(document.clone(), 3, 3);
    let command = wrap("ordered_list");

    assert!(!command.can_execute(&state));
    assert!(!command.execute(&state, Some(&mut |_tr: Transaction| panic!("nothing to dispatch"))));
    assert_eq!(state.doc(), &document);
}

#[test]
fn attrs_are_carried_onto_the_new_list() {
    let attrs =
        ListAttrs::new(folio_engine::ListKind::Ordered, 5, ListStyle::UpperRoman).to_attrs();
    let command = WrapInList::new(list_type("ordered_list"), Some(attrs));
    let next = EditorAction::WrapInList(command).run(&state(doc(vec![p("x")]), 1, 1)).unwrap();

    let list = ListAttrs::of_node(next.doc().child(0)).unwrap();
    assert_eq!((list.order, list.style), (5, ListStyle::UpperRoman));
}

#[test]
fn plan_is_reused_by_apply() {
    let state = state(doc(vec![p("a"), p("b")]), 1, 5);
    let command = wrap("ordered_list");
    let plan = command.plan(&state).unwrap();

    assert_eq!(plan.wrappers.len(), 2);
    assert_eq!(plan.split_depth(), 1);
    let tr = command.apply(&state, plan).unwrap();
    assert_eq!(tr.steps().len(), 2, "one wrap plus one split");
}
