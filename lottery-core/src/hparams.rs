//! Dataset hyperparameters.
//!
//! `DatasetHparams` is the configuration record the registry consumes. It is
//! built once (by hand or by flattening it into a harness CLI with
//! `#[command(flatten)]`) and only read afterwards.

use std::str::FromStr;

use clap::Args;

use crate::error::{LotteryError, Result};

/// Labeling schemes that replace the dataset's own labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupervisedLabels {
    /// Each example is rotated by 0, 90, 180 or 270 degrees and labeled with
    /// the index of that rotation.
    Rotation,
}

impl UnsupervisedLabels {
    /// Number of classes the relabeled task has.
    pub fn num_classes(&self) -> usize {
        match self {
            UnsupervisedLabels::Rotation => 4,
        }
    }
}

impl FromStr for UnsupervisedLabels {
    type Err = LotteryError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "rotation" => Ok(UnsupervisedLabels::Rotation),
            other => Err(LotteryError::UnknownTransformMode(other.to_string())),
        }
    }
}

/// Hyperparameters describing which dataset to load and how to transform it.
#[derive(Args, Debug, Clone, PartialEq)]
pub struct DatasetHparams {
    /// Name of the registered dataset (cifar10, mnist, imagenet, domainnet).
    #[arg(long = "dataset_name")]
    pub dataset_name: String,

    /// Batch size for training, and for evaluation unless overridden.
    #[arg(long = "batch_size")]
    pub batch_size: usize,

    /// Batch size for evaluation.
    #[arg(long = "batch_size_test")]
    pub batch_size_test: Option<usize>,

    /// Disable training-time augmentation.
    #[arg(long = "do_not_augment")]
    pub do_not_augment: bool,

    /// Seed shared by every dataset transformation (defaults to 0).
    #[arg(long = "transformation_seed")]
    pub transformation_seed: Option<u64>,

    /// Fraction of the training set to keep.
    #[arg(long = "subsample_fraction")]
    pub subsample_fraction: Option<f64>,

    /// Fraction of the test set to keep.
    #[arg(long = "subsample_fraction_test")]
    pub subsample_fraction_test: Option<f64>,

    /// Keep the complement of the subsample instead.
    #[arg(long = "subsample_inverse")]
    pub subsample_inverse: bool,

    /// Fraction of training labels replaced by random labels.
    #[arg(long = "random_labels_fraction")]
    pub random_labels_fraction: Option<f64>,

    /// Comma-separated list of domains to keep.
    #[arg(long = "domains")]
    pub domains: Option<String>,

    /// Downsampling factor used to blur training images.
    #[arg(long = "blur_factor")]
    pub blur_factor: Option<f32>,

    /// Draw a blur factor per example in [1, blur_factor].
    #[arg(long = "random_blur")]
    pub random_blur: bool,

    /// Fraction of training examples that get blurred.
    #[arg(long = "subsample_blur")]
    pub subsample_blur: Option<f64>,

    /// Comma-separated rotation angles in degrees.
    #[arg(long = "rotate_array")]
    pub rotate_array: Option<String>,

    /// Draw each example's angle from `rotate_array` at random.
    #[arg(long = "random_rotate")]
    pub random_rotate: bool,

    /// Replace labels with an unsupervised task (only `rotation`).
    #[arg(long = "unsupervised_labels")]
    pub unsupervised_labels: Option<String>,
}

impl DatasetHparams {
    /// Creates hyperparameters for `dataset_name` with every optional
    /// transformation disabled.
    pub fn new(dataset_name: impl Into<String>, batch_size: usize) -> Self {
        DatasetHparams {
            dataset_name: dataset_name.into(),
            batch_size,
            batch_size_test: None,
            do_not_augment: false,
            transformation_seed: None,
            subsample_fraction: None,
            subsample_fraction_test: None,
            subsample_inverse: false,
            random_labels_fraction: None,
            domains: None,
            blur_factor: None,
            random_blur: false,
            subsample_blur: None,
            rotate_array: None,
            random_rotate: false,
            unsupervised_labels: None,
        }
    }

    pub fn seed(&self) -> u64 {
        self.transformation_seed.unwrap_or(0)
    }

    /// The selected domains, split on commas.
    pub fn domain_list(&self) -> Option<Vec<String>> {
        self.domains.as_ref().map(|d| {
            d.split(',')
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect()
        })
    }

    /// The parsed rotation angles, if any were configured.
    pub fn rotation_angles(&self) -> Result<Option<Vec<f32>>> {
        let Some(raw) = self.rotate_array.as_ref() else {
            return Ok(None);
        };
        if raw.trim().is_empty() {
            return Err(LotteryError::invalid_hparam("rotate_array", "no angles given"));
        }
        let angles = raw
            .split(',')
            .map(|a| {
                a.trim().parse::<f32>().map_err(|e| {
                    LotteryError::invalid_hparam("rotate_array", format!("'{}': {}", a.trim(), e))
                })
            })
            .collect::<Result<Vec<f32>>>()?;
        Ok(Some(angles))
    }

    pub fn unsupervised_mode(&self) -> Result<Option<UnsupervisedLabels>> {
        self.unsupervised_labels
            .as_deref()
            .map(UnsupervisedLabels::from_str)
            .transpose()
    }

    /// Checks every field without touching the filesystem.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(LotteryError::invalid_hparam("batch_size", "must be positive"));
        }
        if self.batch_size_test == Some(0) {
            return Err(LotteryError::invalid_hparam("batch_size_test", "must be positive"));
        }
        check_fraction("subsample_fraction", self.subsample_fraction, false)?;
        check_fraction("subsample_fraction_test", self.subsample_fraction_test, false)?;
        check_fraction("subsample_blur", self.subsample_blur, false)?;
        check_fraction("random_labels_fraction", self.random_labels_fraction, true)?;

        if let Some(factor) = self.blur_factor {
            if !(factor >= 1.0) || !factor.is_finite() {
                return Err(LotteryError::invalid_hparam(
                    "blur_factor",
                    format!("{} is not a finite factor >= 1", factor),
                ));
            }
        }

        if self.domain_list().is_some_and(|names| names.is_empty()) {
            return Err(LotteryError::invalid_hparam("domains", "no domain names given"));
        }

        let angles = self.rotation_angles()?;
        let mode = self.unsupervised_mode()?;
        if mode.is_some() && angles.is_some() {
            return Err(LotteryError::invalid_hparam(
                "rotate_array",
                "cannot be combined with unsupervised rotation labels",
            ));
        }
        Ok(())
    }
}

fn check_fraction(name: &str, value: Option<f64>, allow_zero: bool) -> Result<()> {
    let Some(f) = value else {
        return Ok(());
    };
    let lower_ok = if allow_zero { f >= 0.0 } else { f > 0.0 };
    if !lower_ok || f > 1.0 || f.is_nan() {
        let range = if allow_zero { "[0, 1]" } else { "(0, 1]" };
        return Err(LotteryError::invalid_hparam(
            name,
            format!("{} is outside {}", f, range),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[path = "hparams_test.rs"]
mod tests;
