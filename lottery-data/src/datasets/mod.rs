use std::io::Read;
use std::path::Path;

use lottery_core::{LotteryError, Platform, Result};

pub mod cifar10;
pub mod domainnet;
pub mod image;
pub mod imagenet;
pub mod labeled;
pub mod mnist;
pub mod traits;

pub use self::image::{ImageDataset, ImageExample, ImageSource, Sample};
pub use cifar10::Cifar10;
pub use domainnet::{DomainNet, DomainNetDataset};
pub use imagenet::Imagenet;
pub use labeled::LabeledDataset;
pub use mnist::Mnist;
pub use traits::{Dataset, RegistryDataset, SupportsDomains, SupportsPixelTransforms};

/// Reads a whole file through the platform's open service.
pub(crate) fn read_bytes(platform: &Platform, path: &Path) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    platform
        .open(path)?
        .read_to_end(&mut bytes)
        .map_err(|e| LotteryError::io(path, e))?;
    Ok(bytes)
}
