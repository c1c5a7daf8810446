//! One-hot label encoding
//!
//! Maps class-folder names to fixed-width one-hot target vectors and back.
//! The index assignment is established once at fit time (label sort order)
//! and persisted as JSON alongside model artifacts, so a later inference run
//! can decode a model's output vector with the exact same assignment.

use std::collections::HashMap;
use std::path::Path;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::utils::error::{PrepError, Result};

/// Value written at the active index of each one-hot row
const ACTIVE: f32 = 1.0;
/// Value written everywhere else
const INACTIVE: f32 = 0.0;

/// Fixed assignment of class names to one-hot column indices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelEncoder {
    /// Class names, sorted; position = column index
    classes: Vec<String>,
    /// Reverse lookup, rebuilt on deserialization
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl LabelEncoder {
    /// Fit an encoder on the labels seen in a training run.
    ///
    /// The distinct label set is sorted, and each label gets the column
    /// index of its sort position.
    pub fn fit(labels: &[String]) -> Self {
        let mut classes: Vec<String> = labels.to_vec();
        classes.sort();
        classes.dedup();

        info!("Fitted label encoder with {} classes", classes.len());

        let index = Self::build_index(&classes);
        Self { classes, index }
    }

    fn build_index(classes: &[String]) -> HashMap<String, usize> {
        classes
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect()
    }

    /// Number of distinct classes
    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    /// The sorted class list
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Column index for a label
    pub fn encode(&self, label: &str) -> Result<usize> {
        self.index
            .get(label)
            .copied()
            .ok_or_else(|| PrepError::UnknownLabel(label.to_string()))
    }

    /// Class name for a column index
    pub fn decode_index(&self, index: usize) -> Result<&str> {
        self.classes
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| PrepError::UnknownLabel(format!("class index {}", index)))
    }

    /// Class name for a model output vector, by argmax
    pub fn decode(&self, scores: &[f32]) -> Result<&str> {
        if scores.len() != self.num_classes() {
            return Err(PrepError::Shape(format!(
                "score vector has length {}, expected {}",
                scores.len(),
                self.num_classes()
            )));
        }
        let argmax = scores
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(idx, _)| idx)
            .ok_or_else(|| PrepError::Shape("empty score vector".to_string()))?;
        self.decode_index(argmax)
    }

    /// One-hot matrix for a label sequence, one row per label
    pub fn transform(&self, labels: &[String]) -> Result<Array2<f32>> {
        let mut targets = Array2::from_elem((labels.len(), self.num_classes()), INACTIVE);
        for (row, label) in labels.iter().enumerate() {
            let col = self.encode(label)?;
            targets[[row, col]] = ACTIVE;
        }
        Ok(targets)
    }

    /// Persist the encoder as JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!("Label encoder saved to {}", path.display());
        Ok(())
    }

    /// Load a previously persisted encoder
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let mut encoder: Self = serde_json::from_str(&json)?;
        encoder.index = Self::build_index(&encoder.classes);
        Ok(encoder)
    }
}
