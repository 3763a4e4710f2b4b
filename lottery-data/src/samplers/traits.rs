// lottery-data/src/samplers/traits.rs

use std::fmt::Debug;

/// Defines the order in which a `DataLoader` visits the indices of a dataset.
pub trait Sampler: Debug + Send + Sync {
    /// Returns an iterator over the indices of a dataset.
    ///
    /// # Arguments
    ///
    /// * `dataset_len` - The total number of items in the dataset.
    fn iter(&self, dataset_len: usize) -> Box<dyn Iterator<Item = usize> + Send + Sync>;

    /// Returns the total number of samples that will be yielded by the iterator.
    ///
    /// This might be different from `dataset_len` for samplers that draw a
    /// fixed number of samples.
    fn len(&self, dataset_len: usize) -> usize;

    /// Reseeds the sampler, typically once per epoch. Deterministic samplers
    /// ignore it.
    fn set_seed(&mut self, _seed: u64) {}
}

impl<S: Sampler + ?Sized> Sampler for Box<S> {
    fn iter(&self, dataset_len: usize) -> Box<dyn Iterator<Item = usize> + Send + Sync> {
        (**self).iter(dataset_len)
    }

    fn len(&self, dataset_len: usize) -> usize {
        (**self).len(dataset_len)
    }

    fn set_seed(&mut self, seed: u64) {
        (**self).set_seed(seed)
    }
}
