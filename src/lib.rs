//! # PlantVillage Dataset Preparation
//!
//! A Rust library for preparing the PlantVillage plant disease dataset for
//! CNN training: splitting raw per-class image folders into train/test
//! trees, loading and normalizing images into a dense tensor, and encoding
//! folder-name labels as one-hot targets.
//!
//! ## Modules
//!
//! - `dataset`: splitting, loading/normalizing, and label encoding
//! - `training`: data contract of the opaque external training service
//! - `utils`: logging and error types
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use plantvillage_prep::dataset::{load_dataset, LabelEncoder, LoaderConfig};
//!
//! let dataset = load_dataset("PlantVillage/train", LoaderConfig::default())?;
//! let encoder = LabelEncoder::fit(&dataset.labels);
//! let targets = encoder.transform(&dataset.labels)?;
//! // hand dataset.images and targets to the training backend
//! ```

pub mod dataset;
pub mod training;
pub mod utils;

// Re-export commonly used items for convenience
pub use dataset::encoder::LabelEncoder;
pub use dataset::loader::{load_dataset, DecodeErrorPolicy, LoadedDataset, LoaderConfig};
pub use dataset::split::{split_dataset, SplitConfig, SplitSummary};
pub use training::{AugmentationConfig, Hyperparameters, TrainingBackend, TrainingHistory};
pub use utils::error::{PrepError, Result};

/// Default square resolution images are resized to
pub const IMAGE_SIZE: u32 = 256;

/// Default maximum number of images loaded per class
pub const IMAGES_PER_CLASS: usize = 100;

/// Default divisor applied to raw pixel intensities.
///
/// Deliberately 225.0 rather than the 8-bit channel maximum of 255.0: the
/// historical training pipeline used this value, and models trained against
/// it expect identical scaling at inference time.
pub const PIXEL_DIVISOR: f32 = 225.0;

/// Default fraction of each class assigned to the training subset
pub const TRAIN_RATIO: f64 = 0.8;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
