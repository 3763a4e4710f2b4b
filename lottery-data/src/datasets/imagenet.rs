//! ImageNet in the usual `<split>/<class>/<image>` folder layout.
//!
//! Class labels are the indices of the class directories in sorted order.

use std::path::{Path, PathBuf};

use log::info;
use lottery_core::{LotteryError, Platform, Result};

use super::image::{ImageDataset, ImageExample};
use super::labeled::LabeledDataset;
use crate::registry::{DatasetModule, ExampleCount};
use crate::transforms::{ImageTransform, Normalize};

const NUM_CLASSES: usize = 1000;
const EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// The registered ImageNet module.
#[derive(Debug, Clone, Copy, Default)]
pub struct Imagenet;

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Image files below `root/rel`, as paths relative to `root`, sorted.
fn collect_images(platform: &Platform, root: &Path, rel: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for name in platform.list_dir(root.join(rel))? {
        let child = rel.join(&name);
        if platform.is_dir(root.join(&child)) {
            collect_images(platform, root, &child, out)?;
        } else if is_image(&child) {
            out.push(child);
        }
    }
    Ok(())
}

impl Imagenet {
    pub(crate) fn deterministic_transforms() -> Vec<ImageTransform> {
        vec![ImageTransform::Resize(256), ImageTransform::CenterCrop(224)]
    }

    pub(crate) fn augment_transforms() -> Vec<ImageTransform> {
        vec![
            ImageTransform::imagenet_crop(224),
            ImageTransform::RandomHorizontalFlip(0.5),
        ]
    }

    /// Scans one split directory into file-backed examples.
    pub fn scan(platform: &Platform, split_dir: &Path) -> Result<LabeledDataset<ImageExample>> {
        let classes: Vec<String> = platform
            .list_dir(split_dir)?
            .into_iter()
            .filter(|name| platform.is_dir(split_dir.join(name)))
            .collect();
        if classes.is_empty() {
            return Err(LotteryError::invalid_format(split_dir, "no class directories"));
        }

        let mut examples = Vec::new();
        let mut labels = Vec::new();
        for (label, class) in classes.iter().enumerate() {
            let mut paths = Vec::new();
            collect_images(platform, split_dir, Path::new(class), &mut paths)?;
            paths.sort();
            labels.extend(std::iter::repeat(label).take(paths.len()));
            examples.extend(paths.into_iter().map(ImageExample::file));
        }
        info!(
            "imagenet: found {} images in {} classes under {}",
            examples.len(),
            classes.len(),
            split_dir.display()
        );
        LabeledDataset::new(examples, labels)
    }

    fn load(platform: &Platform, split: &str, transforms: Vec<ImageTransform>) -> Result<ImageDataset> {
        let split_dir = platform.imagenet_root()?.join(split);
        let data = Self::scan(platform, &split_dir)?;
        Ok(ImageDataset::new(Self::NAME, data, NUM_CLASSES, Normalize::imagenet())
            .with_root(platform, split_dir)
            .with_transforms(transforms))
    }
}

impl DatasetModule for Imagenet {
    type Dataset = ImageDataset;
    const NAME: &'static str = "imagenet";

    fn get_train_set(platform: &Platform, use_augmentation: bool) -> Result<ImageDataset> {
        let transforms = if use_augmentation {
            Self::augment_transforms()
        } else {
            Self::deterministic_transforms()
        };
        Self::load(platform, "train", transforms)
    }

    fn get_test_set(platform: &Platform) -> Result<ImageDataset> {
        Self::load(platform, "val", Self::deterministic_transforms())
    }

    fn num_train_examples() -> ExampleCount {
        ExampleCount::Single(1_281_167)
    }

    fn num_test_examples() -> ExampleCount {
        ExampleCount::Single(50_000)
    }

    fn num_classes() -> usize {
        NUM_CLASSES
    }
}

#[cfg(test)]
#[path = "imagenet_test.rs"]
mod tests;
