use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::io::Reader as ImageReader;
use image::DynamicImage;
use log::debug;
use lottery_core::{LotteryError, Platform, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::labeled::{count_for_fraction, permutation, LabeledDataset};
use super::traits::{Dataset, RegistryDataset, SupportsPixelTransforms};
use crate::transforms::{self, ImageTransform, Normalize};

/// A decoded, normalized image with its label.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Pixel values in `[C, H, W]` layout.
    pub pixels: Vec<f32>,
    pub shape: [usize; 3],
    pub label: usize,
}

/// Where the pixels of an example come from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// An encoded image file, relative to the dataset root.
    File(PathBuf),
    /// Pixels already decoded from a binary container.
    Memory(Arc<DynamicImage>),
}

/// One image example plus the pixel operations planned for it.
#[derive(Debug, Clone)]
pub struct ImageExample {
    pub source: ImageSource,
    /// Blur factor applied at load time, if any.
    pub blur_factor: Option<f32>,
    /// Counter-clockwise rotation in degrees applied at load time.
    pub rotation: f32,
}

impl ImageExample {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::with_source(ImageSource::File(path.into()))
    }

    pub fn memory(image: DynamicImage) -> Self {
        Self::with_source(ImageSource::Memory(Arc::new(image)))
    }

    fn with_source(source: ImageSource) -> Self {
        ImageExample {
            source,
            blur_factor: None,
            rotation: 0.0,
        }
    }

    /// The relative file path, for file-backed examples.
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            ImageSource::File(p) => Some(p),
            ImageSource::Memory(_) => None,
        }
    }
}

/// An image classification dataset whose examples are decoded lazily.
///
/// Loading an example decodes it, applies its planned blur and rotation, runs
/// the dataset's transforms, converts to `[C, H, W]` and normalizes.
#[derive(Debug, Clone)]
pub struct ImageDataset {
    name: String,
    platform: Platform,
    root: PathBuf,
    data: LabeledDataset<ImageExample>,
    num_classes: usize,
    transforms: Vec<ImageTransform>,
    normalize: Normalize,
}

impl ImageDataset {
    /// Creates a dataset with no transforms other than `normalize`. The number
    /// of channels produced follows `normalize.channels()`.
    pub fn new(
        name: impl Into<String>,
        data: LabeledDataset<ImageExample>,
        num_classes: usize,
        normalize: Normalize,
    ) -> Self {
        ImageDataset {
            name: name.into(),
            platform: Platform::local(),
            root: PathBuf::new(),
            data,
            num_classes,
            transforms: Vec::new(),
            normalize,
        }
    }

    /// Sets the platform used to open files and the root that file-backed
    /// example paths are relative to.
    pub fn with_root(mut self, platform: &Platform, root: impl Into<PathBuf>) -> Self {
        self.platform = platform.clone();
        self.root = root.into();
        self
    }

    pub fn with_transforms(mut self, transforms: Vec<ImageTransform>) -> Self {
        self.transforms = transforms;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn examples(&self) -> &[ImageExample] {
        self.data.examples()
    }

    pub fn transforms(&self) -> &[ImageTransform] {
        &self.transforms
    }

    /// Keeps the examples matching `predicate`, with their labels.
    pub fn retain_examples<F>(&mut self, predicate: F)
    where
        F: Fn(&ImageExample) -> bool,
    {
        self.data.retain(predicate);
    }

    /// Decodes the image of `example` without any transform.
    pub fn load_image(&self, example: &ImageExample) -> Result<DynamicImage> {
        match &example.source {
            ImageSource::Memory(img) => Ok((**img).clone()),
            ImageSource::File(rel) => {
                let path = self.root.join(rel);
                let reader = ImageReader::new(self.platform.open(&path)?)
                    .with_guessed_format()
                    .map_err(|e| LotteryError::io(&path, e))?;
                reader.decode().map_err(|e| LotteryError::ImageDecode {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })
            }
        }
    }

    fn apply_pixel_plan(img: DynamicImage, example: &ImageExample) -> DynamicImage {
        let img = match example.blur_factor {
            Some(factor) if factor > 1.0 => transforms::blur(&img, factor),
            _ => img,
        };
        if example.rotation.rem_euclid(360.0) != 0.0 {
            transforms::rotate(&img, example.rotation)
        } else {
            img
        }
    }

    /// Indices picked by `subsample_blur`, or all of them.
    fn blur_targets(&self, subsample_blur: Option<f64>, seed: u64) -> Result<Vec<usize>> {
        let n = self.data.len();
        match subsample_blur {
            None => Ok((0..n).collect()),
            Some(f) if f > 0.0 && f <= 1.0 => {
                let count = count_for_fraction(n, f);
                Ok(permutation(n, seed.wrapping_add(2))
                    .into_iter()
                    .take(count)
                    .collect())
            }
            Some(f) => Err(LotteryError::invalid_hparam(
                "subsample_blur",
                format!("{} is outside (0, 1]", f),
            )),
        }
    }
}

fn check_blur_factor(blur_factor: f32) -> Result<()> {
    if blur_factor >= 1.0 && blur_factor.is_finite() {
        Ok(())
    } else {
        Err(LotteryError::invalid_hparam(
            "blur_factor",
            format!("{} is not a finite factor >= 1", blur_factor),
        ))
    }
}

fn check_angles(angles: &[f32]) -> Result<()> {
    if angles.is_empty() {
        return Err(LotteryError::invalid_hparam("rotate_array", "no angles given"));
    }
    Ok(())
}

impl Dataset for ImageDataset {
    type Item = Sample;

    fn get(&self, index: usize) -> Result<Sample> {
        let (example, label) = self.data.example(index)?;
        let img = self.load_image(example)?;
        let mut img = Self::apply_pixel_plan(img, example);
        if !self.transforms.is_empty() {
            let mut rng = rand::thread_rng();
            for t in &self.transforms {
                img = t.apply(img, &mut rng);
            }
        }
        let (mut pixels, shape) = transforms::to_chw(&img, self.normalize.channels());
        self.normalize.apply(&mut pixels, shape)?;
        Ok(Sample {
            pixels,
            shape,
            label,
        })
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

impl SupportsPixelTransforms for ImageDataset {
    fn blur(&mut self, blur_factor: f32, subsample_blur: Option<f64>, seed: u64) -> Result<()> {
        check_blur_factor(blur_factor)?;
        let targets = self.blur_targets(subsample_blur, seed)?;
        debug!("{}: blurring {} examples by {}", self.name, targets.len(), blur_factor);
        let examples = self.data.examples_mut();
        for i in targets {
            examples[i].blur_factor = Some(blur_factor);
        }
        Ok(())
    }

    fn random_blur(
        &mut self,
        blur_factor: f32,
        subsample_blur: Option<f64>,
        seed: u64,
    ) -> Result<()> {
        check_blur_factor(blur_factor)?;
        let targets = self.blur_targets(subsample_blur, seed)?;
        debug!(
            "{}: blurring {} examples by random factors up to {}",
            self.name,
            targets.len(),
            blur_factor
        );
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(3));
        let examples = self.data.examples_mut();
        for i in targets {
            examples[i].blur_factor = Some(rng.gen_range(1.0..=blur_factor));
        }
        Ok(())
    }

    fn rotate(&mut self, angles: &[f32]) -> Result<()> {
        check_angles(angles)?;
        for (i, example) in self.data.examples_mut().iter_mut().enumerate() {
            example.rotation = angles[i % angles.len()];
        }
        Ok(())
    }

    fn random_rotate(&mut self, angles: &[f32], seed: u64) -> Result<()> {
        check_angles(angles)?;
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(4));
        for example in self.data.examples_mut().iter_mut() {
            if let Some(&angle) = angles.choose(&mut rng) {
                example.rotation = angle;
            }
        }
        Ok(())
    }

    fn unsupervised_rotation(&mut self, seed: u64) -> Result<()> {
        let mut rng = StdRng::seed_from_u64(seed);
        let labels: Vec<usize> = (0..self.data.len()).map(|_| rng.gen_range(0..4)).collect();
        for (example, &k) in self.data.examples_mut().iter_mut().zip(&labels) {
            example.rotation += 90.0 * k as f32;
        }
        self.data.set_labels(labels)?;
        self.num_classes = 4;
        Ok(())
    }
}

impl RegistryDataset for ImageDataset {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn labels(&self) -> &[usize] {
        self.data.labels()
    }

    fn randomize_labels(&mut self, seed: u64, fraction: f64) -> Result<()> {
        self.data.randomize_labels(seed, fraction, self.num_classes)
    }

    fn subsample(&mut self, seed: u64, fraction: f64, inverse: bool) -> Result<()> {
        self.data.subsample(seed, fraction, inverse)
    }

    fn as_pixel_transforms(&mut self) -> Option<&mut dyn SupportsPixelTransforms> {
        Some(self)
    }
}

#[cfg(test)]
#[path = "image_test.rs"]
mod tests;
