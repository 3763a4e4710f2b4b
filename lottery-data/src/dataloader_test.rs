// lottery-data/src/dataloader_test.rs

use super::*;
use crate::samplers::{RandomSampler, SequentialSampler};

fn sample(label: usize, shape: [usize; 3]) -> Sample {
    Sample {
        pixels: vec![label as f32; shape.iter().product()],
        shape,
        label,
    }
}

/// Pre-decoded 1x1 samples whose label equals their index.
struct Decoded(Vec<Sample>);

impl Decoded {
    fn labelled(n: usize) -> Self {
        Decoded((0..n).map(|i| sample(i, [1, 1, 1])).collect())
    }
}

impl Dataset for Decoded {
    type Item = Sample;

    fn get(&self, index: usize) -> Result<Sample> {
        self.0
            .get(index)
            .cloned()
            .ok_or(LotteryError::IndexOutOfBounds {
                index,
                len: self.0.len(),
            })
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

fn labels(batches: impl Iterator<Item = Result<Vec<Sample>>>) -> Vec<Vec<usize>> {
    batches
        .map(|b| b.unwrap().into_iter().map(|s| s.label).collect())
        .collect()
}

#[test]
fn test_dataloader_sequential() {
    let loader = DataLoader::new(Decoded::labelled(6), 2, SequentialSampler::new(), false);
    assert_eq!(labels(loader.iter()), vec![vec![0, 1], vec![2, 3], vec![4, 5]]);
    assert_eq!(loader.num_batches(), 3);
}

#[test]
fn test_dataloader_drop_last() {
    let loader = DataLoader::new(Decoded::labelled(5), 2, SequentialSampler::new(), true);
    assert_eq!(labels(loader.iter()), vec![vec![0, 1], vec![2, 3]]);
    assert_eq!(loader.num_batches(), 2);
}

#[test]
fn test_dataloader_keeps_partial_last_batch() {
    let loader = DataLoader::new(Decoded::labelled(5), 2, SequentialSampler::new(), false);
    let batches = labels((&loader).into_iter());
    assert_eq!(batches.last().unwrap(), &vec![4]);
    assert_eq!(loader.num_batches(), 3);
}

#[test]
fn test_dataloader_is_restartable() {
    let loader = DataLoader::new(Decoded::labelled(10), 3, SequentialSampler::new(), false);
    let first = labels(loader.iter());
    let second = labels(loader.iter());
    assert_eq!(first, second);
    assert_eq!(first.len(), 4);
}

#[test]
fn test_dataloader_shuffle_reseeds() {
    let sampler = RandomSampler::new(false, None).with_seed(0);
    let mut loader = DataLoader::new(Decoded::labelled(64), 64, sampler, false);
    let epoch0 = labels(loader.iter());
    assert_eq!(labels(loader.iter()), epoch0);

    loader.shuffle(1);
    let epoch1 = labels(loader.iter());
    assert_ne!(epoch0, epoch1);
    let mut sorted = epoch1[0].clone();
    sorted.sort_unstable();
    assert_eq!(sorted, (0..64).collect::<Vec<usize>>());
}

#[test]
fn test_dataloader_parallel_matches_sequential() {
    let sequential = DataLoader::new(Decoded::labelled(37), 8, SequentialSampler::new(), false);
    let parallel = DataLoader::new(Decoded::labelled(37), 8, SequentialSampler::new(), false)
        .with_workers(3)
        .unwrap();
    assert_eq!(parallel.num_workers(), 3);
    assert_eq!(labels(sequential.iter()), labels(parallel.iter()));
}

#[test]
fn test_dataloader_propagates_item_errors() {
    struct Failing;
    impl Dataset for Failing {
        type Item = usize;
        fn get(&self, index: usize) -> Result<usize> {
            if index == 3 {
                Err(LotteryError::IndexOutOfBounds { index, len: 3 })
            } else {
                Ok(index)
            }
        }
        fn len(&self) -> usize {
            4
        }
    }
    let loader = DataLoader::new(Failing, 2, SequentialSampler::new(), false)
        .with_workers(2)
        .unwrap();
    let results: Vec<_> = loader.iter().collect();
    assert_eq!(results[0], Ok(vec![0, 1]));
    assert!(results[1].is_err());
}

#[test]
fn test_batch_collate() {
    let batch = Batch::collate(vec![sample(1, [1, 2, 2]), sample(2, [1, 2, 2])]).unwrap();
    assert_eq!(batch.shape, [2, 1, 2, 2]);
    assert_eq!(batch.labels, vec![1, 2]);
    assert_eq!(batch.images.len(), 8);
    assert_eq!(batch.images[4], 2.0);
    assert_eq!(batch.len(), 2);
}

#[test]
fn test_batch_collate_shape_mismatch() {
    let err = Batch::collate(vec![sample(0, [1, 2, 2]), sample(0, [3, 2, 2])]).unwrap_err();
    assert_eq!(
        err,
        LotteryError::ShapeMismatch {
            expected: vec![1, 2, 2],
            actual: vec![3, 2, 2],
        }
    );
}

#[test]
fn test_loader_batches_collates() {
    let loader = DataLoader::new(Decoded::labelled(5), 2, SequentialSampler::new(), false);
    let batches: Vec<Batch> = loader.batches().map(|b| b.unwrap()).collect();
    assert_eq!(batches.len(), 3);
    assert_eq!(batches[2].shape, [1, 1, 1, 1]);
    assert_eq!(batches[1].labels, vec![2, 3]);
}
