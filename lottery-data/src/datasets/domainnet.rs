//! DomainNet: six domains sharing 345 classes.
//!
//! Split index files live in `<root>/splits`, one `<relative-path> <label>`
//! per line; images live under `<root>/images`. Training splits are the index
//! files whose name contains `train`, test splits all the others.

use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::Path;

use log::{info, warn};
use lottery_core::{LotteryError, Platform, Result};

use super::image::{ImageDataset, ImageExample, Sample};
use super::imagenet::Imagenet;
use super::labeled::LabeledDataset;
use super::traits::{Dataset, RegistryDataset, SupportsDomains, SupportsPixelTransforms};
use crate::registry::{DatasetModule, ExampleCount};
use crate::transforms::{ImageTransform, Normalize};

const NUM_CLASSES: usize = 345;

const TRAIN_COUNTS: [(&str, usize); 6] = [
    ("clipart", 34019),
    ("infograph", 37087),
    ("painting", 52867),
    ("quickdraw", 120750),
    ("real", 122563),
    ("sketch", 49115),
];

const TEST_COUNTS: [(&str, usize); 6] = [
    ("clipart", 14814),
    ("infograph", 16114),
    ("painting", 22892),
    ("quickdraw", 51750),
    ("real", 52764),
    ("sketch", 21271),
];

/// The registered DomainNet module.
#[derive(Debug, Clone, Copy, Default)]
pub struct DomainNet;

/// A DomainNet split. Besides the image operations it can be restricted to a
/// set of domains.
#[derive(Debug, Clone)]
pub struct DomainNetDataset {
    inner: ImageDataset,
}

impl DomainNetDataset {
    pub fn images(&self) -> &ImageDataset {
        &self.inner
    }
}

/// Parses one split index file.
fn parse_split(
    platform: &Platform,
    path: &Path,
    examples: &mut Vec<ImageExample>,
    labels: &mut Vec<usize>,
) -> Result<()> {
    let reader = platform.open(path)?;
    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| LotteryError::io(path, e))?;
        let line_no = i + 1;
        let line = line.trim_end_matches('\r');
        let mut fields = line.split(' ');
        let (rel, label) = match (fields.next(), fields.next(), fields.next()) {
            (Some(rel), Some(label), None) if !rel.is_empty() => (rel, label),
            _ => {
                return Err(LotteryError::parse(
                    path,
                    line_no,
                    format!("expected '<path> <label>', found '{}'", line),
                ))
            }
        };
        let label: usize = label.parse().map_err(|_| {
            LotteryError::parse(path, line_no, format!("'{}' is not a class index", label))
        })?;
        if label >= NUM_CLASSES {
            return Err(LotteryError::parse(
                path,
                line_no,
                format!("class {} out of range", label),
            ));
        }
        examples.push(ImageExample::file(rel));
        labels.push(label);
    }
    Ok(())
}

impl DomainNet {
    fn load(platform: &Platform, train: bool, transforms: Vec<ImageTransform>) -> Result<DomainNetDataset> {
        let root = platform.domainnet_root();
        let splits_dir = root.join("splits");
        let mut examples = Vec::new();
        let mut labels = Vec::new();
        for name in platform.list_dir(&splits_dir)? {
            if name.contains("train") == train {
                parse_split(platform, &splits_dir.join(&name), &mut examples, &mut labels)?;
            }
        }
        info!(
            "domainnet: {} {} examples from {}",
            examples.len(),
            if train { "train" } else { "test" },
            splits_dir.display()
        );
        let data = LabeledDataset::new(examples, labels)?;
        let inner = ImageDataset::new(Self::NAME, data, NUM_CLASSES, Normalize::imagenet())
            .with_root(platform, root.join("images"))
            .with_transforms(transforms);
        Ok(DomainNetDataset { inner })
    }
}

impl DatasetModule for DomainNet {
    type Dataset = DomainNetDataset;
    const NAME: &'static str = "domainnet";

    fn get_train_set(platform: &Platform, use_augmentation: bool) -> Result<DomainNetDataset> {
        let transforms = if use_augmentation {
            Imagenet::augment_transforms()
        } else {
            Imagenet::deterministic_transforms()
        };
        Self::load(platform, true, transforms)
    }

    fn get_test_set(platform: &Platform) -> Result<DomainNetDataset> {
        Self::load(platform, false, Imagenet::deterministic_transforms())
    }

    fn num_train_examples() -> ExampleCount {
        ExampleCount::PerDomain(BTreeMap::from(TRAIN_COUNTS))
    }

    fn num_test_examples() -> ExampleCount {
        ExampleCount::PerDomain(BTreeMap::from(TEST_COUNTS))
    }

    fn num_classes() -> usize {
        NUM_CLASSES
    }
}

impl Dataset for DomainNetDataset {
    type Item = Sample;

    fn get(&self, index: usize) -> Result<Sample> {
        self.inner.get(index)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl SupportsDomains for DomainNetDataset {
    fn domains(&mut self, names: &[String]) {
        self.inner.retain_examples(|example| {
            let path = example
                .path()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default();
            names.iter().any(|name| path.contains(name.as_str()))
        });
        if self.inner.is_empty() {
            warn!("domainnet: no examples left for domains {:?}", names);
        }
    }
}

impl RegistryDataset for DomainNetDataset {
    fn name(&self) -> &str {
        RegistryDataset::name(&self.inner)
    }

    fn num_classes(&self) -> usize {
        RegistryDataset::num_classes(&self.inner)
    }

    fn labels(&self) -> &[usize] {
        self.inner.labels()
    }

    fn randomize_labels(&mut self, seed: u64, fraction: f64) -> Result<()> {
        self.inner.randomize_labels(seed, fraction)
    }

    fn subsample(&mut self, seed: u64, fraction: f64, inverse: bool) -> Result<()> {
        self.inner.subsample(seed, fraction, inverse)
    }

    fn as_domains(&mut self) -> Option<&mut dyn SupportsDomains> {
        Some(self)
    }

    fn as_pixel_transforms(&mut self) -> Option<&mut dyn SupportsPixelTransforms> {
        Some(&mut self.inner)
    }
}

#[cfg(test)]
#[path = "domainnet_test.rs"]
mod tests;
