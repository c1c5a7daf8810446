//! Trainer hand-off boundary
//!
//! The neural network itself (layer topology, backprop, optimizer) lives in
//! an external training service. This module defines the data contract at
//! that boundary: the hyperparameters and augmentation settings handed over
//! together with the image tensor and one-hot targets, and the per-epoch
//! history handed back.
//!
//! No backend implementation ships in this crate.

use ndarray::{Array2, Array4};
use serde::{Deserialize, Serialize};

use crate::utils::error::Result;

/// Training hyperparameters passed to the external training service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hyperparameters {
    /// Number of training epochs
    pub epochs: usize,
    /// Batch size
    pub batch_size: usize,
    /// Learning rate
    pub learning_rate: f64,
    /// Steps per epoch
    pub steps_per_epoch: usize,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            epochs: 25,
            batch_size: 32,
            learning_rate: 1e-3,
            steps_per_epoch: 100,
        }
    }
}

/// Fill mode for pixels introduced by geometric augmentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FillMode {
    #[default]
    Nearest,
    Constant,
    Reflect,
    Wrap,
}

/// Configuration handed to the external augmentation service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AugmentationConfig {
    /// Rotation range in degrees
    pub rotation_range: f32,
    /// Horizontal shift range, fraction of width
    pub width_shift_range: f32,
    /// Vertical shift range, fraction of height
    pub height_shift_range: f32,
    /// Shear intensity
    pub shear_range: f32,
    /// Zoom range
    pub zoom_range: f32,
    /// Whether to flip horizontally at random
    pub horizontal_flip: bool,
    /// Fill mode for introduced pixels
    pub fill_mode: FillMode,
}

impl Default for AugmentationConfig {
    fn default() -> Self {
        Self {
            rotation_range: 25.0,
            width_shift_range: 0.1,
            height_shift_range: 0.1,
            shear_range: 0.2,
            zoom_range: 0.2,
            horizontal_flip: true,
            fill_mode: FillMode::Nearest,
        }
    }
}

/// Metrics reported for one training epoch
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,
    pub train_loss: f64,
    pub train_accuracy: f64,
    pub val_loss: f64,
    pub val_accuracy: f64,
}

/// Per-epoch history returned by the training service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochMetrics>,
}

impl TrainingHistory {
    /// Best validation accuracy over the run
    pub fn best_val_accuracy(&self) -> Option<f64> {
        self.epochs
            .iter()
            .map(|e| e.val_accuracy)
            .max_by(f64::total_cmp)
    }
}

/// The opaque training service this pipeline feeds.
///
/// Implementations receive the stacked image tensor `(n, h, w, 3)` and the
/// matching one-hot target matrix `(n, num_classes)` produced by the loader
/// and encoder.
pub trait TrainingBackend {
    /// Train a model on the given tensors and return the epoch history
    fn fit(
        &mut self,
        images: &Array4<f32>,
        targets: &Array2<f32>,
        hyper: &Hyperparameters,
        augment: &AugmentationConfig,
    ) -> Result<TrainingHistory>;

    /// Evaluate the trained model, returning (loss, accuracy)
    fn evaluate(&self, images: &Array4<f32>, targets: &Array2<f32>) -> Result<(f64, f64)>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hyperparameter_defaults() {
        let hyper = Hyperparameters::default();
        assert_eq!(hyper.epochs, 25);
        assert_eq!(hyper.batch_size, 32);
        assert_eq!(hyper.steps_per_epoch, 100);
        assert!((hyper.learning_rate - 1e-3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_augmentation_serializes_fill_mode_lowercase() {
        let config = AugmentationConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"nearest\""));
    }

    #[test]
    fn test_best_val_accuracy() {
        let history = TrainingHistory {
            epochs: vec![
                EpochMetrics {
                    epoch: 0,
                    train_loss: 1.0,
                    train_accuracy: 0.5,
                    val_loss: 0.9,
                    val_accuracy: 0.55,
                },
                EpochMetrics {
                    epoch: 1,
                    train_loss: 0.7,
                    train_accuracy: 0.7,
                    val_loss: 0.8,
                    val_accuracy: 0.68,
                },
            ],
        };
        assert_eq!(history.best_val_accuracy(), Some(0.68));
        assert_eq!(TrainingHistory::default().best_val_accuracy(), None);
    }
}
