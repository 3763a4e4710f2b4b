//! Datasets, transforms and batched loading for lottery experiments.
//!
//! The [`registry`] is the entry point: it turns a
//! [`DatasetHparams`](lottery_core::DatasetHparams) into a loader over the
//! transformed train or test split.

pub mod dataloader;
pub mod datasets;
pub mod registry;
pub mod samplers;
pub mod transforms;

pub use dataloader::{Batch, DataLoader};
pub use datasets::{Dataset, RegistryDataset, Sample};
pub use registry::{get, DatasetKind, DatasetModule, ExampleCount, Loader};
