//! CIFAR-10, read from the binary release.
//!
//! Every record is one label byte followed by a 32x32 image stored as three
//! 1024-byte planes (red, green, blue).

use std::path::PathBuf;

use image::{DynamicImage, RgbImage};
use log::info;
use lottery_core::{LotteryError, Platform, Result};

use super::image::{ImageDataset, ImageExample};
use super::labeled::LabeledDataset;
use super::read_bytes;
use crate::registry::{DatasetModule, ExampleCount};
use crate::transforms::{ImageTransform, Normalize};

const NUM_CLASSES: usize = 10;
const SIDE: usize = 32;
const PLANE: usize = SIDE * SIDE;
const RECORD_BYTES: usize = 1 + 3 * PLANE;

const TRAIN_FILES: [&str; 5] = [
    "data_batch_1.bin",
    "data_batch_2.bin",
    "data_batch_3.bin",
    "data_batch_4.bin",
    "data_batch_5.bin",
];
const TEST_FILES: [&str; 1] = ["test_batch.bin"];

/// The registered CIFAR-10 module.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cifar10;

impl Cifar10 {
    pub fn location(platform: &Platform) -> PathBuf {
        platform
            .dataset_root()
            .join("cifar10")
            .join("cifar-10-batches-bin")
    }

    fn augment_transforms() -> Vec<ImageTransform> {
        vec![
            ImageTransform::RandomHorizontalFlip(0.5),
            ImageTransform::RandomCrop {
                size: SIDE as u32,
                padding: 4,
            },
        ]
    }

    fn load(platform: &Platform, files: &[&str]) -> Result<LabeledDataset<ImageExample>> {
        let dir = Self::location(platform);
        let mut examples = Vec::new();
        let mut labels = Vec::new();
        for name in files {
            let path = dir.join(name);
            let bytes = read_bytes(platform, &path)?;
            if bytes.len() % RECORD_BYTES != 0 {
                return Err(LotteryError::invalid_format(
                    &path,
                    format!("{} bytes is not a whole number of records", bytes.len()),
                ));
            }
            for record in bytes.chunks_exact(RECORD_BYTES) {
                let label = record[0] as usize;
                if label >= NUM_CLASSES {
                    return Err(LotteryError::invalid_format(
                        &path,
                        format!("label {} out of range", label),
                    ));
                }
                examples.push(ImageExample::memory(DynamicImage::ImageRgb8(planes_to_rgb(
                    &record[1..],
                ))));
                labels.push(label);
            }
        }
        info!("cifar10: loaded {} images from {}", labels.len(), dir.display());
        LabeledDataset::new(examples, labels)
    }
}

/// Interleaves three `SIDE x SIDE` planes into an RGB image.
fn planes_to_rgb(planes: &[u8]) -> RgbImage {
    RgbImage::from_fn(SIDE as u32, SIDE as u32, |x, y| {
        let i = y as usize * SIDE + x as usize;
        image::Rgb([planes[i], planes[PLANE + i], planes[2 * PLANE + i]])
    })
}

impl DatasetModule for Cifar10 {
    type Dataset = ImageDataset;
    const NAME: &'static str = "cifar10";

    fn get_train_set(platform: &Platform, use_augmentation: bool) -> Result<ImageDataset> {
        let data = Self::load(platform, &TRAIN_FILES)?;
        let dataset = ImageDataset::new(Self::NAME, data, NUM_CLASSES, Normalize::imagenet());
        Ok(if use_augmentation {
            dataset.with_transforms(Self::augment_transforms())
        } else {
            dataset
        })
    }

    fn get_test_set(platform: &Platform) -> Result<ImageDataset> {
        let data = Self::load(platform, &TEST_FILES)?;
        Ok(ImageDataset::new(Self::NAME, data, NUM_CLASSES, Normalize::imagenet()))
    }

    fn num_train_examples() -> ExampleCount {
        ExampleCount::Single(50_000)
    }

    fn num_test_examples() -> ExampleCount {
        ExampleCount::Single(10_000)
    }

    fn num_classes() -> usize {
        NUM_CLASSES
    }
}

#[cfg(test)]
#[path = "cifar10_test.rs"]
mod tests;
