//! The dataset registry: the single entry point the training harness uses to
//! obtain a loader and dataset metadata from a [`DatasetHparams`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use log::{debug, info};
use lottery_core::{DatasetHparams, LotteryError, Platform, Result};

use crate::dataloader::DataLoader;
use crate::datasets::{Cifar10, Dataset, DomainNet, Imagenet, Mnist, RegistryDataset};
use crate::samplers::{RandomSampler, Sampler, SequentialSampler};

/// Example counts of a split: one number, or one per domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExampleCount {
    Single(usize),
    PerDomain(BTreeMap<&'static str, usize>),
}

impl ExampleCount {
    pub fn total(&self) -> usize {
        match self {
            ExampleCount::Single(n) => *n,
            ExampleCount::PerDomain(counts) => counts.values().sum(),
        }
    }

    /// Number of examples in the selected domains, or in all of them when
    /// `domains` is `None`. Single counts have no domains and ignore the
    /// selection.
    pub fn for_domains(&self, domains: Option<&[String]>) -> Result<usize> {
        match (self, domains) {
            (ExampleCount::PerDomain(counts), Some(domains)) => domains
                .iter()
                .map(|d| {
                    counts
                        .get(d.as_str())
                        .copied()
                        .ok_or_else(|| LotteryError::UnknownDomain(d.clone()))
                })
                .sum(),
            _ => Ok(self.total()),
        }
    }
}

/// A dataset the registry knows how to build.
pub trait DatasetModule {
    type Dataset: RegistryDataset + 'static;

    /// Registry key.
    const NAME: &'static str;

    /// Training split; randomized augmentation only if `use_augmentation`.
    fn get_train_set(platform: &Platform, use_augmentation: bool) -> Result<Self::Dataset>;

    /// Evaluation split, deterministic transforms only.
    fn get_test_set(platform: &Platform) -> Result<Self::Dataset>;

    fn num_train_examples() -> ExampleCount;

    fn num_test_examples() -> ExampleCount;

    fn num_classes() -> usize;
}

/// The registered datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    Cifar10,
    Mnist,
    Imagenet,
    Domainnet,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 4] = [
        DatasetKind::Cifar10,
        DatasetKind::Mnist,
        DatasetKind::Imagenet,
        DatasetKind::Domainnet,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DatasetKind::Cifar10 => Cifar10::NAME,
            DatasetKind::Mnist => Mnist::NAME,
            DatasetKind::Imagenet => Imagenet::NAME,
            DatasetKind::Domainnet => DomainNet::NAME,
        }
    }

    pub fn num_train_examples(&self) -> ExampleCount {
        match self {
            DatasetKind::Cifar10 => Cifar10::num_train_examples(),
            DatasetKind::Mnist => Mnist::num_train_examples(),
            DatasetKind::Imagenet => Imagenet::num_train_examples(),
            DatasetKind::Domainnet => DomainNet::num_train_examples(),
        }
    }

    pub fn num_test_examples(&self) -> ExampleCount {
        match self {
            DatasetKind::Cifar10 => Cifar10::num_test_examples(),
            DatasetKind::Mnist => Mnist::num_test_examples(),
            DatasetKind::Imagenet => Imagenet::num_test_examples(),
            DatasetKind::Domainnet => DomainNet::num_test_examples(),
        }
    }

    pub fn num_classes(&self) -> usize {
        match self {
            DatasetKind::Cifar10 => Cifar10::num_classes(),
            DatasetKind::Mnist => Mnist::num_classes(),
            DatasetKind::Imagenet => Imagenet::num_classes(),
            DatasetKind::Domainnet => DomainNet::num_classes(),
        }
    }
}

impl FromStr for DatasetKind {
    type Err = LotteryError;

    fn from_str(name: &str) -> Result<Self> {
        DatasetKind::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| LotteryError::UnknownDataset(name.to_string()))
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The loader type returned by [`get`].
pub type Loader = DataLoader<Box<dyn RegistryDataset>, Box<dyn Sampler>>;

/// Builds the train or test split named by `hparams`, applies the configured
/// transformations and wraps it in a loader.
///
/// Training loaders visit the examples in a random order seeded with the
/// transformation seed (reseed per epoch with [`DataLoader::shuffle`]);
/// evaluation loaders are sequential.
///
/// # Errors
///
/// Invalid hyperparameters and unknown dataset names are reported before
/// any file is read.
pub fn get(hparams: &DatasetHparams, platform: &Platform, train: bool) -> Result<Loader> {
    hparams.validate()?;
    let kind: DatasetKind = hparams.dataset_name.parse()?;
    let dataset = match kind {
        DatasetKind::Cifar10 => load::<Cifar10>(hparams, platform, train)?,
        DatasetKind::Mnist => load::<Mnist>(hparams, platform, train)?,
        DatasetKind::Imagenet => load::<Imagenet>(hparams, platform, train)?,
        DatasetKind::Domainnet => load::<DomainNet>(hparams, platform, train)?,
    };

    let batch_size = match (train, hparams.batch_size_test) {
        (false, Some(size)) => size,
        _ => hparams.batch_size,
    };
    let sampler: Box<dyn Sampler> = if train {
        Box::new(RandomSampler::new(false, None).with_seed(hparams.seed()))
    } else {
        Box::new(SequentialSampler::new())
    };
    info!(
        "{} {} loader: {} examples, batch size {}, {} workers",
        kind,
        if train { "train" } else { "test" },
        dataset.len(),
        batch_size,
        platform.num_workers()
    );
    DataLoader::new(dataset, batch_size, sampler, false).with_workers(platform.num_workers())
}

fn load<M: DatasetModule>(
    hparams: &DatasetHparams,
    platform: &Platform,
    train: bool,
) -> Result<Box<dyn RegistryDataset>> {
    let dataset = if train {
        M::get_train_set(platform, !hparams.do_not_augment)?
    } else {
        M::get_test_set(platform)?
    };
    let dataset = apply_transforms(dataset, hparams, train)?;
    Ok(Box::new(dataset))
}

/// Applies the configured label, subsample, domain and pixel transformations
/// to `dataset`, in that order.
///
/// # Errors
///
/// `UnsupportedCapability` when a domain or pixel transformation is requested
/// for a dataset that lacks the capability, `UnknownTransformMode` for an
/// unrecognized unsupervised labeling.
pub fn apply_transforms<D: RegistryDataset>(
    mut dataset: D,
    hparams: &DatasetHparams,
    train: bool,
) -> Result<D> {
    let seed = hparams.seed();

    if train {
        if let Some(fraction) = hparams.random_labels_fraction {
            debug!("{}: randomizing {} of the labels", dataset.name(), fraction);
            dataset.randomize_labels(seed, fraction)?;
        }
    }

    let subsample_fraction = if train {
        hparams.subsample_fraction
    } else {
        hparams.subsample_fraction_test
    };
    if let Some(fraction) = subsample_fraction {
        debug!(
            "{}: subsampling {} (inverse: {})",
            dataset.name(),
            fraction,
            hparams.subsample_inverse
        );
        dataset.subsample(seed, fraction, hparams.subsample_inverse)?;
    }

    if let Some(domains) = hparams.domain_list() {
        let name = dataset.name().to_string();
        debug!("{}: keeping domains {:?}", name, domains);
        dataset
            .as_domains()
            .ok_or_else(|| LotteryError::unsupported("domains", &name))?
            .domains(&domains);
    }

    if train {
        if let Some(factor) = hparams.blur_factor {
            let name = dataset.name().to_string();
            let pixels = dataset
                .as_pixel_transforms()
                .ok_or_else(|| LotteryError::unsupported("blur", &name))?;
            debug!("{}: blurring by {} (random: {})", name, factor, hparams.random_blur);
            if hparams.random_blur {
                pixels.random_blur(factor, hparams.subsample_blur, seed)?;
            } else {
                pixels.blur(factor, hparams.subsample_blur, seed)?;
            }
        }

        if let Some(angles) = hparams.rotation_angles()? {
            let name = dataset.name().to_string();
            let pixels = dataset
                .as_pixel_transforms()
                .ok_or_else(|| LotteryError::unsupported("rotate", &name))?;
            debug!("{}: rotating by {:?} (random: {})", name, angles, hparams.random_rotate);
            if hparams.random_rotate {
                pixels.random_rotate(&angles, seed)?;
            } else {
                pixels.rotate(&angles)?;
            }
        }
    }

    if hparams.unsupervised_mode()?.is_some() {
        let name = dataset.name().to_string();
        debug!("{}: relabeling by rotation", name);
        dataset
            .as_pixel_transforms()
            .ok_or_else(|| LotteryError::unsupported("unsupervised_rotation", &name))?
            .unsupervised_rotation(seed)?;
    }

    Ok(dataset)
}

/// Training iterations in one epoch.
pub fn iterations_per_epoch(hparams: &DatasetHparams) -> Result<usize> {
    let kind: DatasetKind = hparams.dataset_name.parse()?;
    iterations_for(&kind.num_train_examples(), hparams)
}

/// `ceil(examples * subsample_fraction / batch_size)`, where `examples` is
/// restricted to the selected domains. Rejects hparams that `get` would.
pub fn iterations_for(count: &ExampleCount, hparams: &DatasetHparams) -> Result<usize> {
    hparams.validate()?;
    let domains = hparams.domain_list();
    let mut examples = count.for_domains(domains.as_deref())? as f64;
    if let Some(fraction) = hparams.subsample_fraction {
        examples *= fraction;
    }
    Ok((examples / hparams.batch_size as f64).ceil() as usize)
}

/// Number of classes the loaders' labels range over.
pub fn num_classes(hparams: &DatasetHparams) -> Result<usize> {
    let kind: DatasetKind = hparams.dataset_name.parse()?;
    match hparams.unsupervised_mode()? {
        Some(mode) => Ok(mode.num_classes()),
        None => Ok(kind.num_classes()),
    }
}

pub fn num_train_examples(hparams: &DatasetHparams) -> Result<ExampleCount> {
    let kind: DatasetKind = hparams.dataset_name.parse()?;
    Ok(kind.num_train_examples())
}

pub fn num_test_examples(hparams: &DatasetHparams) -> Result<ExampleCount> {
    let kind: DatasetKind = hparams.dataset_name.parse()?;
    Ok(kind.num_test_examples())
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
