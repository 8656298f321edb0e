mod common;

use common::*;
use oldfiles_cleaner::{filter, Predicate, PredicateSet, RecordReader};
use proptest::prelude::*;
use rand::Rng;

/// (kind, file index) pairs; kind 4 means an unrelated entry.
fn stream_layout() -> impl Strategy<Value = Vec<(u64, usize)>> {
    prop::collection::vec(
        (prop::sample::select(vec![4u64, 5, 7, 8, 10, 11]), 0usize..6),
        0..40,
    )
}

fn file(i: usize) -> String {
    format!("/proj/file{i}.rs")
}

fn build(layout: &[(u64, usize)]) -> Vec<Vec<u8>> {
    layout.iter()
        .enumerate()
        .map(|(ts, &(kind, i))| match kind {
            7 | 8 | 10 | 11 => file_entry(kind, ts as u64, &file(i)),
            k => entry(k, ts as u64, &rmpv::Value::from(file(i).as_str())),
        })
        .collect()
}

fn preds_for(picks: &[usize]) -> PredicateSet {
    picks
        .iter()
        .map(|i| Predicate::pattern(&format!("file{i}\\.rs$")).unwrap())
        .collect()
}

proptest! {
    #[test]
    fn kept_records_in_order_and_identical(layout in stream_layout(), picks in prop::collection::vec(0usize..6, 0..4)) {
        let records = build(&layout);
        let input = records.concat();
        let mut out = Vec::new();
        let removed = filter(&input[..], &mut out, &preds_for(&picks)).unwrap();

        let expected: Vec<u8> = layout
            .iter()
            .zip(&records)
            .filter(|((kind, i), _)| !([7, 8, 10, 11].contains(kind) && picks.contains(i)))
            .flat_map(|(_, bytes)| bytes.clone())
            .collect();
        prop_assert_eq!(&out, &expected);

        for name in &removed {
            let name = String::from_utf8(name.clone()).unwrap();
            prop_assert!(picks.iter().any(|i| file(*i) == name));
        }
    }

    #[test]
    fn refiltering_removes_nothing(layout in stream_layout(), picks in prop::collection::vec(0usize..6, 0..4)) {
        let input = build(&layout).concat();
        let preds = preds_for(&picks);
        let mut first = Vec::new();
        filter(&input[..], &mut first, &preds).unwrap();
        let mut second = Vec::new();
        let removed = filter(&first[..], &mut second, &preds).unwrap();
        prop_assert!(removed.is_empty());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn adding_predicates_never_shrinks_removed(layout in stream_layout(), a in prop::collection::vec(0usize..6, 0..3), b in prop::collection::vec(0usize..6, 0..3)) {
        let input = build(&layout).concat();
        let mut sink = Vec::new();
        let small = filter(&input[..], &mut sink, &preds_for(&a)).unwrap();
        let both: Vec<usize> = a.iter().chain(&b).copied().collect();
        sink.clear();
        let large = filter(&input[..], &mut sink, &preds_for(&both)).unwrap();
        prop_assert!(small.is_subset(&large));
    }
}

#[test]
fn random_truncation_keeps_complete_prefix() {
    let layout: Vec<(u64, usize)> = (0..30).map(|i| ([4, 7, 8, 10, 11][i % 5], i % 6)).collect();
    let records = build(&layout);
    let input = records.concat();
    let mut boundaries = vec![0usize];
    for r in &records {
        boundaries.push(boundaries.last().unwrap() + r.len());
    }

    let mut rng = rand::thread_rng();
    for _ in 0..200 {
        let cut = rng.gen_range(0..=input.len());
        let truncated = &input[..cut];
        let complete = boundaries.iter().filter(|&&b| b <= cut).count() - 1;

        let decoded: Vec<_> = RecordReader::new(truncated).collect();
        assert_eq!(decoded.len(), complete, "cut at {cut}");
        assert!(decoded.iter().all(|r| r.is_ok()));

        let mut out = Vec::new();
        filter(truncated, &mut out, &PredicateSet::new()).unwrap();
        assert_eq!(out, &input[..boundaries[complete]]);
    }
}
