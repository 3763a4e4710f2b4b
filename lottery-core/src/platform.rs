//! Filesystem roots and I/O services for a machine.
//!
//! A `Platform` is built once at startup (`local()`, `from_env()` or the
//! builder methods) and passed explicitly to everything that needs a path.

use std::env;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{LotteryError, Result};

const DEFAULT_RESULTS_ROOT: &str = "/lottery/results";
const DEFAULT_DATASET_ROOT: &str = "/lottery/data";
const DEFAULT_DOMAINNET_ROOT: &str = "/lottery/data/domainnet";

/// Prefix of the environment variables read by [`Platform::from_env`].
pub const ENV_PREFIX: &str = "LOTTERY_";

/// Where results and datasets live, and how many loader workers to use.
#[derive(Debug, Clone, PartialEq)]
pub struct Platform {
    results_root: PathBuf,
    dataset_root: PathBuf,
    domainnet_root: PathBuf,
    imagenet_root: Option<PathBuf>,
    num_workers: usize,
}

impl Platform {
    /// The fixed roots of the local machine. ImageNet is not available here.
    pub fn local() -> Self {
        Platform {
            results_root: PathBuf::from(DEFAULT_RESULTS_ROOT),
            dataset_root: PathBuf::from(DEFAULT_DATASET_ROOT),
            domainnet_root: PathBuf::from(DEFAULT_DOMAINNET_ROOT),
            imagenet_root: None,
            num_workers: 0,
        }
    }

    /// `local()` with `LOTTERY_*` environment overrides applied.
    pub fn from_env() -> Result<Self> {
        Self::local().with_overrides(|key| env::var(format!("{}{}", ENV_PREFIX, key)).ok())
    }

    /// Applies overrides looked up by key (`RESULTS_ROOT`, `DATASET_ROOT`,
    /// `DOMAINNET_ROOT`, `IMAGENET_ROOT`, `NUM_WORKERS`).
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("RESULTS_ROOT") {
            self.results_root = PathBuf::from(v);
        }
        if let Some(v) = lookup("DATASET_ROOT") {
            self.dataset_root = PathBuf::from(v);
        }
        if let Some(v) = lookup("DOMAINNET_ROOT") {
            self.domainnet_root = PathBuf::from(v);
        }
        if let Some(v) = lookup("IMAGENET_ROOT") {
            self.imagenet_root = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("NUM_WORKERS") {
            self.num_workers = v.trim().parse().map_err(|e| LotteryError::InvalidConfig {
                name: format!("{}NUM_WORKERS", ENV_PREFIX),
                reason: format!("'{}': {}", v, e),
            })?;
        }
        debug!("Platform resolved: {:?}", self);
        Ok(self)
    }

    pub fn with_results_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.results_root = root.into();
        self
    }

    pub fn with_dataset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.dataset_root = root.into();
        self
    }

    pub fn with_domainnet_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.domainnet_root = root.into();
        self
    }

    pub fn with_imagenet_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.imagenet_root = Some(root.into());
        self
    }

    pub fn with_num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    pub fn results_root(&self) -> &Path {
        &self.results_root
    }

    /// Root under which the single-directory datasets (mnist, cifar10) live.
    pub fn dataset_root(&self) -> &Path {
        &self.dataset_root
    }

    pub fn domainnet_root(&self) -> &Path {
        &self.domainnet_root
    }

    /// # Errors
    ///
    /// Returns `PlatformUnavailable` when this platform has no ImageNet copy.
    pub fn imagenet_root(&self) -> Result<&Path> {
        self.imagenet_root
            .as_deref()
            .ok_or_else(|| LotteryError::PlatformUnavailable("imagenet_root".to_string()))
    }

    /// Number of loader worker threads (0 loads on the calling thread).
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Opens a file for buffered reading. The handle is closed when dropped.
    pub fn open(&self, path: impl AsRef<Path>) -> Result<BufReader<File>> {
        let path = path.as_ref();
        File::open(path)
            .map(BufReader::new)
            .map_err(|e| LotteryError::io(path, e))
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        path.as_ref().exists()
    }

    pub fn is_dir(&self, path: impl AsRef<Path>) -> bool {
        path.as_ref().is_dir()
    }

    /// Names of the entries in `path`, sorted.
    pub fn list_dir(&self, path: impl AsRef<Path>) -> Result<Vec<String>> {
        let path = path.as_ref();
        let mut names = Vec::new();
        for entry in fs::read_dir(path).map_err(|e| LotteryError::io(path, e))? {
            let entry = entry.map_err(|e| LotteryError::io(path, e))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::local()
    }
}

#[cfg(test)]
#[path = "platform_test.rs"]
mod tests;
