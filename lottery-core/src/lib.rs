// Shared building blocks of the lottery tooling: the error type, the dataset
// hyperparameter record and the platform description.

pub mod error;
pub mod hparams;
pub mod platform;

pub use error::{LotteryError, Result};
pub use hparams::{DatasetHparams, UnsupervisedLabels};
pub use platform::Platform;
