use lottery_core::Result;

use super::image::Sample;

/// Represents a dataset that can be accessed by index.
///
/// A dataset is a collection of items, where each item can be a decoded image
/// sample, a tuple of values, or any other custom type that implements
/// `Send + 'static`.
pub trait Dataset {
    /// The type of a single item returned by the dataset.
    ///
    /// This type must be `Send` and `'static` so the `DataLoader` can fetch
    /// items on its worker threads.
    type Item: Send + 'static;

    /// Returns the item at the given index.
    ///
    /// # Errors
    ///
    /// Returns `LotteryError` if the index is out of bounds or if there's
    /// an issue retrieving the item (unreadable or undecodable file).
    fn get(&self, index: usize) -> Result<Self::Item>;

    /// Returns the total number of items in the dataset.
    fn len(&self) -> usize;

    /// Checks if the dataset is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<D: Dataset + ?Sized> Dataset for Box<D> {
    type Item = D::Item;

    fn get(&self, index: usize) -> Result<Self::Item> {
        (**self).get(index)
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}

/// Datasets made of several named domains sharing one label space.
pub trait SupportsDomains {
    /// Keeps only the examples whose path contains at least one of `names`.
    ///
    /// Relative order and example/label pairing are preserved. A name that
    /// matches nothing simply contributes no examples.
    fn domains(&mut self, names: &[String]);
}

/// Image datasets whose pixels can be blurred and rotated before loading.
pub trait SupportsPixelTransforms {
    /// Blurs the selected examples by downsampling them by `blur_factor` and
    /// resizing back. `subsample_blur` selects a fraction of the examples
    /// (all of them when `None`).
    fn blur(&mut self, blur_factor: f32, subsample_blur: Option<f64>, seed: u64) -> Result<()>;

    /// Like [`blur`](Self::blur), with a per-example factor drawn uniformly
    /// from `[1, blur_factor]`.
    fn random_blur(&mut self, blur_factor: f32, subsample_blur: Option<f64>, seed: u64)
        -> Result<()>;

    /// Rotates example `i` by `angles[i % angles.len()]` degrees.
    fn rotate(&mut self, angles: &[f32]) -> Result<()>;

    /// Rotates every example by an angle drawn from `angles`.
    fn random_rotate(&mut self, angles: &[f32], seed: u64) -> Result<()>;

    /// Replaces the labels by a random rotation index in `0..4` and rotates
    /// each image by `90 * label` degrees.
    fn unsupervised_rotation(&mut self, seed: u64) -> Result<()>;
}

/// A dataset the registry can build, transform and hand to a loader.
///
/// Capabilities that only some datasets have are exposed through the
/// `as_*` accessors, which return `None` when the dataset lacks them.
pub trait RegistryDataset: Dataset<Item = Sample> + Send + Sync {
    /// Registered name, used in error messages.
    fn name(&self) -> &str;

    /// Number of classes of the current labels.
    fn num_classes(&self) -> usize;

    fn labels(&self) -> &[usize];

    /// Replaces `fraction` of the labels with uniformly random classes.
    fn randomize_labels(&mut self, seed: u64, fraction: f64) -> Result<()>;

    /// Keeps `fraction` of the examples (or the complement if `inverse`).
    fn subsample(&mut self, seed: u64, fraction: f64, inverse: bool) -> Result<()>;

    fn as_domains(&mut self) -> Option<&mut dyn SupportsDomains> {
        None
    }

    fn as_pixel_transforms(&mut self) -> Option<&mut dyn SupportsPixelTransforms> {
        None
    }
}
