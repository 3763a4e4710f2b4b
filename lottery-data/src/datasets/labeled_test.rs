// lottery-data/src/datasets/labeled_test.rs

use super::*;
use std::collections::HashSet;

fn numbered(n: usize) -> LabeledDataset<usize> {
    let examples: Vec<usize> = (0..n).collect();
    let labels: Vec<usize> = (0..n).map(|i| i % 10).collect();
    LabeledDataset::new(examples, labels).unwrap()
}

fn assert_paired(ds: &LabeledDataset<usize>) {
    assert_eq!(ds.examples().len(), ds.labels().len());
    for (example, label) in ds.examples().iter().zip(ds.labels()) {
        assert_eq!(example % 10, *label, "example {} lost its label", example);
    }
}

#[test]
fn test_new_rejects_length_mismatch() {
    match LabeledDataset::new(vec![1, 2, 3], vec![0, 1]) {
        Err(LotteryError::LengthMismatch { examples, labels }) => {
            assert_eq!(examples, 3);
            assert_eq!(labels, 2);
        }
        other => panic!("Expected LengthMismatch, got {:?}", other),
    }
}

#[test]
fn test_example_access() {
    let ds = numbered(12);
    assert_eq!(ds.example(11).unwrap(), (&11, 1));
    assert_eq!(
        ds.example(12),
        Err(LotteryError::IndexOutOfBounds { index: 12, len: 12 })
    );
}

#[test]
fn test_count_for_fraction_rounds_up() {
    assert_eq!(count_for_fraction(10, 0.25), 3);
    assert_eq!(count_for_fraction(10, 1.0), 10);
    assert_eq!(count_for_fraction(0, 0.5), 0);
}

#[test]
fn test_permutation_is_seeded() {
    let a = permutation(50, 3);
    let b = permutation(50, 3);
    let c = permutation(50, 4);
    assert_eq!(a, b);
    assert_ne!(a, c);
    let unique: HashSet<usize> = a.into_iter().collect();
    assert_eq!(unique.len(), 50);
}

#[test]
fn test_subsample_keeps_pairs_and_order() {
    let mut ds = numbered(100);
    ds.subsample(0, 0.3, false).unwrap();
    assert_eq!(ds.len(), 30);
    assert_paired(&ds);
    assert!(ds.examples().windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_subsample_inverse_partitions() {
    for &(n, fraction) in &[(100usize, 0.5f64), (101, 0.3), (7, 0.9)] {
        let mut kept = numbered(n);
        let mut complement = numbered(n);
        kept.subsample(11, fraction, false).unwrap();
        complement.subsample(11, fraction, true).unwrap();

        assert_eq!(kept.len() + complement.len(), n);
        let a: HashSet<usize> = kept.examples().iter().copied().collect();
        let b: HashSet<usize> = complement.examples().iter().copied().collect();
        assert!(a.is_disjoint(&b));
        assert_paired(&kept);
        assert_paired(&complement);
    }
}

#[test]
fn test_subsample_is_deterministic() {
    let mut a = numbered(64);
    let mut b = numbered(64);
    a.subsample(5, 0.5, false).unwrap();
    b.subsample(5, 0.5, false).unwrap();
    assert_eq!(a.examples(), b.examples());
}

#[test]
fn test_subsample_only_once() {
    let mut ds = numbered(10);
    ds.subsample(0, 0.5, false).unwrap();
    assert_eq!(ds.subsample(0, 0.5, false), Err(LotteryError::AlreadySubsampled));
}

#[test]
fn test_subsample_rejects_bad_fraction() {
    let mut ds = numbered(10);
    assert!(ds.subsample(0, 0.0, false).is_err());
    assert!(ds.subsample(0, 1.5, false).is_err());
    assert_eq!(ds.len(), 10);
}

#[test]
fn test_randomize_labels_changes_only_labels() {
    let mut ds = numbered(200);
    ds.randomize_labels(1, 0.5, 3).unwrap();
    assert_eq!(ds.len(), 200);
    assert_eq!(ds.examples(), (0..200).collect::<Vec<_>>().as_slice());
    assert!(ds.labels().iter().all(|&l| l < 10));

    let changed = ds
        .examples()
        .iter()
        .zip(ds.labels())
        .filter(|(e, l)| **e % 10 != **l)
        .count();
    assert!(changed <= 100);
    assert!(changed > 0);
}

#[test]
fn test_randomize_labels_full_fraction_stays_in_class_range() {
    let mut ds = numbered(50);
    ds.randomize_labels(9, 1.0, 2).unwrap();
    assert!(ds.labels().iter().all(|&l| l < 2));
}

#[test]
fn test_randomize_labels_is_deterministic() {
    let mut a = numbered(80);
    let mut b = numbered(80);
    a.randomize_labels(4, 0.25, 10).unwrap();
    b.randomize_labels(4, 0.25, 10).unwrap();
    assert_eq!(a.labels(), b.labels());
}

#[test]
fn test_randomize_labels_zero_fraction_is_noop() {
    let mut ds = numbered(20);
    let before = ds.clone();
    ds.randomize_labels(0, 0.0, 10).unwrap();
    assert_eq!(ds, before);
}

#[test]
fn test_retain_is_idempotent() {
    let mut once = numbered(40);
    once.retain(|e| e % 3 == 0);
    let mut twice = once.clone();
    twice.retain(|e| e % 3 == 0);
    assert_eq!(once, twice);
    assert_paired(&once);
    assert_eq!(once.len(), 14);
}

#[test]
fn test_retain_nothing_gives_empty_dataset() {
    let mut ds = numbered(5);
    ds.retain(|_| false);
    assert!(ds.is_empty());
    assert_eq!(ds.labels().len(), 0);
}

#[test]
fn test_set_labels_checks_length() {
    let mut ds = numbered(3);
    assert!(ds.set_labels(vec![0, 1]).is_err());
    ds.set_labels(vec![2, 2, 2]).unwrap();
    assert_eq!(ds.labels(), &[2, 2, 2]);
    assert_eq!(ds.examples(), &[0, 1, 2]);
}
