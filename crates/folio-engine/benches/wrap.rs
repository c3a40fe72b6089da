use criterion::{Criterion, criterion_group, criterion_main};
use folio_engine::commands::{Command, WrapInList};
use folio_engine::{EditorState, TextSelection, Transaction, folio_schema};
mod common;

fn bench_wrap_in_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("wrap_in_list");
    group.sample_size(10);

    let schema = folio_schema().unwrap();
    let doc = common::generate_document(&schema, 1000);
    let list = WrapInList::new(schema.node_type("ordered_list").unwrap(), None);
    let paragraphs_end: usize = (0..1000).map(|i| doc.child(i).node_size()).sum();

    let all_paragraphs = EditorState::new(
        schema.clone(),
        doc.clone(),
        Some(TextSelection::new(1, paragraphs_end - 1)),
    );
    group.bench_function("probe_all_paragraphs", |b| {
        b.iter(|| std::hint::black_box(list.can_execute(std::hint::black_box(&all_paragraphs))));
    });

    group.bench_function("apply_all_paragraphs", |b| {
        b.iter(|| {
            let mut applied = false;
            let mut dispatch =
                |tr: Transaction| applied = std::hint::black_box(tr).doc_changed();
            list.execute(&all_paragraphs, Some(&mut dispatch));
            applied
        });
    });

    // Cursor in the second item of the trailing list: the merge case.
    let second_item = paragraphs_end + 1 + doc.child(1000).child(0).node_size() + 2;
    let merge = EditorState::new(schema, doc, Some(TextSelection::cursor(second_item)));
    group.bench_function("probe_merge", |b| {
        b.iter(|| std::hint::black_box(list.can_execute(std::hint::black_box(&merge))));
    });

    group.finish();
}

criterion_group!(benches, bench_wrap_in_list);
criterion_main!(benches);
