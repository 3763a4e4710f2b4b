//! MNIST handwritten digits, read from the raw IDX files.
//!
//! IDX layout (big-endian): two zero bytes, a type byte (`0x08` for `u8`
//! data), a dimension count, one `u32` per dimension, then the data.

use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage};
use log::info;
use lottery_core::{LotteryError, Platform, Result};

use super::image::{ImageDataset, ImageExample};
use super::labeled::LabeledDataset;
use super::read_bytes;
use crate::registry::{DatasetModule, ExampleCount};
use crate::transforms::Normalize;

const NUM_CLASSES: usize = 10;
const IMAGES_MAGIC: u32 = 2051;
const LABELS_MAGIC: u32 = 2049;

/// The registered MNIST module.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mnist;

impl Mnist {
    /// Directory holding the four IDX files.
    pub fn location(platform: &Platform) -> PathBuf {
        platform.dataset_root().join("mnist").join("MNIST").join("raw")
    }

    fn load(platform: &Platform, prefix: &str) -> Result<ImageDataset> {
        let dir = Self::location(platform);
        let images_path = dir.join(format!("{}-images-idx3-ubyte", prefix));
        let labels_path = dir.join(format!("{}-labels-idx1-ubyte", prefix));

        let image_bytes = read_bytes(platform, &images_path)?;
        let label_bytes = read_bytes(platform, &labels_path)?;
        let (dims, pixels) = parse_idx(&image_bytes, &images_path, IMAGES_MAGIC)?;
        let (label_dims, raw_labels) = parse_idx(&label_bytes, &labels_path, LABELS_MAGIC)?;

        let (count, rows, cols) = (dims[0], dims[1], dims[2]);
        if label_dims[0] != count {
            return Err(LotteryError::LengthMismatch {
                examples: count,
                labels: label_dims[0],
            });
        }
        if let Some(&bad) = raw_labels.iter().find(|&&l| l as usize >= NUM_CLASSES) {
            return Err(LotteryError::invalid_format(
                &labels_path,
                format!("label {} is not a digit", bad),
            ));
        }

        let plane = rows * cols;
        let mut examples = Vec::with_capacity(count);
        for chunk in pixels.chunks_exact(plane.max(1)).take(count) {
            let img = GrayImage::from_raw(cols as u32, rows as u32, chunk.to_vec()).ok_or_else(|| {
                LotteryError::invalid_format(&images_path, "image buffer too small")
            })?;
            examples.push(ImageExample::memory(DynamicImage::ImageLuma8(img)));
        }
        let labels = raw_labels.iter().map(|&l| l as usize).collect();
        info!("mnist: loaded {} {}x{} images from {}", count, rows, cols, dir.display());

        let data = LabeledDataset::new(examples, labels)?;
        Ok(ImageDataset::new(
            Self::NAME,
            data,
            NUM_CLASSES,
            Normalize::new(vec![0.1307], vec![0.3081]),
        ))
    }
}

/// Parses an IDX container of unsigned bytes, checking the magic number and
/// that the payload holds exactly the product of the dimensions.
fn parse_idx<'a>(bytes: &'a [u8], path: &Path, magic: u32) -> Result<(Vec<usize>, &'a [u8])> {
    let read_u32 = |offset: usize| -> Result<u32> {
        bytes
            .get(offset..offset + 4)
            .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
            .ok_or_else(|| LotteryError::invalid_format(path, "truncated header"))
    };

    let found = read_u32(0)?;
    if found != magic {
        return Err(LotteryError::invalid_format(
            path,
            format!("bad magic number {} (expected {})", found, magic),
        ));
    }
    let ndims = (magic & 0xff) as usize;
    let dims = (0..ndims)
        .map(|i| read_u32(4 + 4 * i).map(|d| d as usize))
        .collect::<Result<Vec<_>>>()?;

    let header = 4 + 4 * ndims;
    let expected: usize = dims.iter().product();
    let payload = &bytes[header.min(bytes.len())..];
    if payload.len() != expected {
        return Err(LotteryError::invalid_format(
            path,
            format!("expected {} data bytes, found {}", expected, payload.len()),
        ));
    }
    Ok((dims, payload))
}

impl DatasetModule for Mnist {
    type Dataset = ImageDataset;
    const NAME: &'static str = "mnist";

    fn get_train_set(platform: &Platform, _use_augmentation: bool) -> Result<ImageDataset> {
        Self::load(platform, "train")
    }

    fn get_test_set(platform: &Platform) -> Result<ImageDataset> {
        Self::load(platform, "t10k")
    }

    fn num_train_examples() -> ExampleCount {
        ExampleCount::Single(60_000)
    }

    fn num_test_examples() -> ExampleCount {
        ExampleCount::Single(10_000)
    }

    fn num_classes() -> usize {
        NUM_CLASSES
    }
}

#[cfg(test)]
#[path = "mnist_test.rs"]
mod tests;
