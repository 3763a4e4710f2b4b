use std::path::Path;
use thiserror::Error;

/// Custom error type for the lottery dataset tooling.
#[derive(Error, Debug, PartialEq, Clone)] // PartialEq for easier testing
pub enum LotteryError {
    #[error("No such dataset: {0}")]
    UnknownDataset(String),

    #[error("Operation '{operation}' is not supported by dataset {dataset}")]
    UnsupportedCapability { operation: String, dataset: String },

    #[error("Unknown unsupervised labels: {0}")]
    UnknownTransformMode(String),

    #[error("Unknown domain: {0}")]
    UnknownDomain(String),

    #[error("Invalid hyperparameter {name}: {reason}")]
    InvalidHparam { name: String, reason: String },

    #[error("Invalid configuration value {name}: {reason}")]
    InvalidConfig { name: String, reason: String },

    #[error("Platform resource unavailable: {0}")]
    PlatformUnavailable(String),

    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    #[error("Parse error in {path} at line {line}: {message}")]
    Parse {
        path: String,
        line: usize,
        message: String,
    },

    #[error("Invalid data format in {path}: {message}")]
    InvalidFormat { path: String, message: String },

    #[error("Failed to decode image {path}: {message}")]
    ImageDecode { path: String, message: String },

    #[error("Examples and labels differ in length: {examples} examples, {labels} labels")]
    LengthMismatch { examples: usize, labels: usize },

    #[error("Cannot subsample more than once.")]
    AlreadySubsampled,

    #[error("Index out of bounds: index {index} for dataset of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("No '{metric}' rows in {path}")]
    MissingMetric { path: String, metric: String },

    #[error("Run range {lo}..={hi} is out of bounds for {available} runs")]
    RunRangeOutOfBounds { lo: usize, hi: usize, available: usize },
}

impl LotteryError {
    /// Wraps a `std::io::Error` together with the path it happened on.
    pub fn io(path: impl AsRef<Path>, err: std::io::Error) -> Self {
        LotteryError::Io {
            path: path.as_ref().display().to_string(),
            message: err.to_string(),
        }
    }

    pub fn parse(path: impl AsRef<Path>, line: usize, message: impl Into<String>) -> Self {
        LotteryError::Parse {
            path: path.as_ref().display().to_string(),
            line,
            message: message.into(),
        }
    }

    pub fn invalid_format(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        LotteryError::InvalidFormat {
            path: path.as_ref().display().to_string(),
            message: message.into(),
        }
    }

    pub fn invalid_hparam(name: &str, reason: impl Into<String>) -> Self {
        LotteryError::InvalidHparam {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn unsupported(operation: &str, dataset: &str) -> Self {
        LotteryError::UnsupportedCapability {
            operation: operation.to_string(),
            dataset: dataset.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LotteryError>;
