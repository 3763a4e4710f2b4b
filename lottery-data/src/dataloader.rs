//! # DataLoader
//!
//! Batches the items of a [`Dataset`] in the order given by a [`Sampler`].
//!
//! ```rust
//! use image::{DynamicImage, GrayImage, Luma};
//! use lottery_data::dataloader::DataLoader;
//! use lottery_data::datasets::{ImageDataset, ImageExample, LabeledDataset};
//! use lottery_data::samplers::SequentialSampler;
//! use lottery_data::transforms::Normalize;
//!
//! let examples = (0..6u8)
//!     .map(|i| ImageExample::memory(DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([i])))))
//!     .collect();
//! let data = LabeledDataset::new(examples, vec![0, 1, 0, 1, 0, 1]).unwrap();
//! let dataset = ImageDataset::new("toy", data, 2, Normalize::new(vec![0.0], vec![1.0]));
//! let loader = DataLoader::new(dataset, 2, SequentialSampler::new(), false);
//! for batch in loader.batches() {
//!     let batch = batch.unwrap();
//!     assert_eq!(batch.shape, [2, 1, 4, 4]);
//!     assert_eq!(batch.labels, vec![0, 1]);
//! }
//! ```
//!
//! `iter()` borrows the loader, so the same loader yields a fresh pass over
//! the data for every epoch. With `with_workers(n)` and `n > 0` the items of
//! each batch are fetched in parallel on a dedicated rayon pool.

use std::sync::Arc;

use lottery_core::{LotteryError, Result};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::datasets::{Dataset, Sample};
use crate::samplers::Sampler;

/// A collated batch of image samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Pixel values in `[B, C, H, W]` layout.
    pub images: Vec<f32>,
    pub shape: [usize; 4],
    pub labels: Vec<usize>,
}

impl Batch {
    /// Stacks samples of identical shape into one batch.
    ///
    /// # Errors
    ///
    /// `ShapeMismatch` if a sample's shape differs from the first one's.
    pub fn collate(samples: Vec<Sample>) -> Result<Batch> {
        let [c, h, w] = samples.first().map(|s| s.shape).unwrap_or([0, 0, 0]);
        let mut images = Vec::with_capacity(samples.len() * c * h * w);
        let mut labels = Vec::with_capacity(samples.len());
        for sample in samples {
            if sample.shape != [c, h, w] {
                return Err(LotteryError::ShapeMismatch {
                    expected: vec![c, h, w],
                    actual: sample.shape.to_vec(),
                });
            }
            images.extend_from_slice(&sample.pixels);
            labels.push(sample.label);
        }
        Ok(Batch {
            images,
            shape: [labels.len(), c, h, w],
            labels,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Generic batching loader.
///
/// # Type Parameters
/// - `D`: the source dataset.
/// - `S`: the sampler producing the visiting order.
pub struct DataLoader<D: Dataset, S: Sampler> {
    dataset: D,
    batch_size: usize,
    sampler: S,
    drop_last: bool,
    num_workers: usize,
    pool: Option<Arc<ThreadPool>>,
}

impl<D: Dataset, S: Sampler> DataLoader<D, S> {
    /// Creates a loader that fetches items on the calling thread.
    ///
    /// # Arguments
    /// - `batch_size`: items per batch.
    /// - `drop_last`: skip the last batch when it is incomplete.
    pub fn new(dataset: D, batch_size: usize, sampler: S, drop_last: bool) -> Self {
        Self {
            dataset,
            batch_size,
            sampler,
            drop_last,
            num_workers: 0,
            pool: None,
        }
    }

    /// Fetches the items of each batch on a pool of `num_workers` threads.
    /// Zero keeps fetching on the calling thread.
    pub fn with_workers(mut self, num_workers: usize) -> Result<Self> {
        self.pool = if num_workers > 0 {
            let pool = ThreadPoolBuilder::new()
                .num_threads(num_workers)
                .build()
                .map_err(|e| LotteryError::InvalidConfig {
                    name: "num_workers".to_string(),
                    reason: e.to_string(),
                })?;
            Some(Arc::new(pool))
        } else {
            None
        };
        self.num_workers = num_workers;
        Ok(self)
    }

    pub fn dataset(&self) -> &D {
        &self.dataset
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    pub fn drop_last(&self) -> bool {
        self.drop_last
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Number of batches one pass yields.
    pub fn num_batches(&self) -> usize {
        let n = self.sampler.len(self.dataset.len());
        if self.batch_size == 0 {
            0
        } else if self.drop_last {
            n / self.batch_size
        } else {
            n.div_ceil(self.batch_size)
        }
    }

    /// Reseeds the sampler; call at the start of an epoch to reshuffle.
    pub fn shuffle(&mut self, seed: u64) {
        self.sampler.set_seed(seed);
    }

    /// One pass over the dataset in sampler order.
    pub fn iter(&self) -> BatchIter<'_, D> {
        BatchIter {
            dataset: &self.dataset,
            indices: self.sampler.iter(self.dataset.len()).collect(),
            position: 0,
            batch_size: self.batch_size,
            drop_last: self.drop_last,
            pool: self.pool.as_deref(),
        }
    }
}

impl<D, S> DataLoader<D, S>
where
    D: Dataset<Item = Sample> + Sync,
    S: Sampler,
{
    /// One pass over the dataset, collating each batch into a [`Batch`].
    pub fn batches(&self) -> impl Iterator<Item = Result<Batch>> + '_ {
        self.iter().map(|samples| samples.and_then(Batch::collate))
    }
}

/// Iterator over the batches of one pass. Created by [`DataLoader::iter`].
pub struct BatchIter<'a, D: Dataset> {
    dataset: &'a D,
    indices: Vec<usize>,
    position: usize,
    batch_size: usize,
    drop_last: bool,
    pool: Option<&'a ThreadPool>,
}

impl<'a, D: Dataset + Sync> BatchIter<'a, D> {
    fn fetch(&self, indices: &[usize]) -> Result<Vec<D::Item>> {
        match self.pool {
            Some(pool) if indices.len() > 1 => pool.install(|| {
                indices
                    .par_iter()
                    .map(|&i| self.dataset.get(i))
                    .collect::<Result<Vec<_>>>()
            }),
            _ => indices.iter().map(|&i| self.dataset.get(i)).collect(),
        }
    }
}

impl<'a, D: Dataset + Sync> Iterator for BatchIter<'a, D> {
    type Item = Result<Vec<D::Item>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.batch_size == 0 {
            return None;
        }
        let start = self.position;
        let end = (start + self.batch_size).min(self.indices.len());
        if start >= end || (self.drop_last && end - start < self.batch_size) {
            return None;
        }
        self.position = end;
        Some(self.fetch(&self.indices[start..end]))
    }
}

impl<'a, D: Dataset + Sync, S: Sampler> IntoIterator for &'a DataLoader<D, S> {
    type Item = Result<Vec<D::Item>>;
    type IntoIter = BatchIter<'a, D>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
#[path = "dataloader_test.rs"]
mod tests;
