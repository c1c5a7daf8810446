//! Dataset splitting into train/test trees
//!
//! Partitions each class folder of a raw dataset between two parallel
//! directory trees, `dest/train/<class>/` and `dest/test/<class>/`, by a
//! uniformly random per-class shuffle. Source files are copied, never moved
//! or modified.
//!
//! Splits are irreproducible by default (entropy seeding); pass a seed for
//! deterministic partitions.

use std::fs;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::utils::error::{PrepError, Result};
use crate::TRAIN_RATIO;

/// Name of the training subtree under the destination root
pub const TRAIN_SUBDIR: &str = "train";
/// Name of the test subtree under the destination root
pub const TEST_SUBDIR: &str = "test";

/// Configuration for dataset splitting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Fraction of each class assigned to the training subset
    pub train_ratio: f64,
    /// Random seed; `None` draws a fresh seed from the OS per run
    pub seed: Option<u64>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_ratio: TRAIN_RATIO,
            seed: None,
        }
    }
}

impl SplitConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.train_ratio) {
            return Err(PrepError::Config(format!(
                "train_ratio must be in [0.0, 1.0], got {}",
                self.train_ratio
            )));
        }
        Ok(())
    }
}

/// Outcome of splitting one class directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSplit {
    /// Class (folder) name
    pub class_name: String,
    /// Files copied into the train subtree
    pub train_count: usize,
    /// Files copied into the test subtree
    pub test_count: usize,
    /// Total files found in the source class directory
    pub total_count: usize,
    /// Set when a copy failure aborted this class partway through;
    /// the counts above then reflect what was actually copied
    pub failure: Option<String>,
}

impl ClassSplit {
    /// Whether every file of this class was copied
    pub fn is_complete(&self) -> bool {
        self.failure.is_none() && self.train_count + self.test_count == self.total_count
    }
}

/// Summary of a whole split run, one entry per class processed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitSummary {
    /// Per-class outcomes, in processing order
    pub classes: Vec<ClassSplit>,
    /// Configuration the run used
    pub config: SplitConfig,
}

impl SplitSummary {
    /// Total files copied into the train subtree
    pub fn train_total(&self) -> usize {
        self.classes.iter().map(|c| c.train_count).sum()
    }

    /// Total files copied into the test subtree
    pub fn test_total(&self) -> usize {
        self.classes.iter().map(|c| c.test_count).sum()
    }

    /// Classes that did not complete because of a copy failure
    pub fn failed_classes(&self) -> Vec<&ClassSplit> {
        self.classes.iter().filter(|c| c.failure.is_some()).collect()
    }

    /// Save the summary as a JSON manifest
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load a summary manifest
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

impl std::fmt::Display for SplitSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Dataset split summary:")?;
        for class in &self.classes {
            write!(
                f,
                "  {:40} train: {:5}  test: {:5}  total: {:5}",
                class.class_name, class.train_count, class.test_count, class.total_count
            )?;
            match &class.failure {
                Some(reason) => writeln!(f, "  INCOMPLETE ({})", reason)?,
                None => writeln!(f)?,
            }
        }
        writeln!(
            f,
            "  Copied {} train / {} test files across {} classes",
            self.train_total(),
            self.test_total(),
            self.classes.len()
        )
    }
}

/// List the class subdirectories directly under the source root, sorted by
/// name. Non-directory entries are ignored.
///
/// The sort matters: one RNG spans all classes, so a seeded run is only
/// deterministic if classes consume it in a stable order, independent of the
/// filesystem's listing order.
fn list_class_dirs(source_root: &Path) -> Result<Vec<(String, PathBuf)>> {
    let entries =
        fs::read_dir(source_root).map_err(|e| PrepError::dir_access(source_root, e))?;

    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PrepError::dir_access(source_root, e))?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            dirs.push((name.to_string(), entry.path()));
        }
    }
    dirs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(dirs)
}

/// Copy a set of files into `dest_root/<subset>/<class_name>/`, preserving
/// filenames and overwriting on conflict. Returns how many were copied before
/// the first failure, if any.
fn copy_subset(
    files: &[PathBuf],
    dest_root: &Path,
    subset: &str,
    class_name: &str,
) -> (usize, Option<PrepError>) {
    let dest_dir = dest_root.join(subset).join(class_name);
    if let Err(e) = fs::create_dir_all(&dest_dir) {
        return (0, Some(PrepError::dir_access(dest_dir, e)));
    }

    for (copied, src) in files.iter().enumerate() {
        let file_name = match src.file_name() {
            Some(name) => name,
            None => continue,
        };
        let dst = dest_dir.join(file_name);
        if let Err(e) = fs::copy(src, &dst) {
            return (
                copied,
                Some(PrepError::Copy {
                    src: src.clone(),
                    dst,
                    source: e,
                }),
            );
        }
    }
    (files.len(), None)
}

/// Split every class under `source_root` into train/test trees under
/// `dest_root`.
///
/// Per class: shuffle the file list, assign the first `floor(n * ratio)`
/// entries to train and the rest to test, and copy each file into its
/// subset's class directory. A copy failure stops that class (the summary
/// records the partial counts and the reason) and processing continues with
/// the next class.
pub fn split_dataset(
    source_root: impl AsRef<Path>,
    dest_root: impl AsRef<Path>,
    config: &SplitConfig,
) -> Result<SplitSummary> {
    let source_root = source_root.as_ref();
    let dest_root = dest_root.as_ref();
    config.validate()?;

    let mut rng = match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    let class_dirs = list_class_dirs(source_root)?;
    if class_dirs.is_empty() {
        warn!(
            "No class directories found under {}; nothing to split",
            source_root.display()
        );
    }

    fs::create_dir_all(dest_root.join(TRAIN_SUBDIR))?;
    fs::create_dir_all(dest_root.join(TEST_SUBDIR))?;

    let mut classes = Vec::with_capacity(class_dirs.len());

    for (class_name, class_path) in class_dirs {
        let entries =
            fs::read_dir(&class_path).map_err(|e| PrepError::dir_access(&class_path, e))?;

        let mut files: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PrepError::dir_access(&class_path, e))?;
            if entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }

        // Stable pre-shuffle order, same reason as the class sort above
        files.sort();
        files.shuffle(&mut rng);
        let total_count = files.len();
        let split_index = (total_count as f64 * config.train_ratio).floor() as usize;
        let (train_files, test_files) = files.split_at(split_index);

        info!(
            "Splitting '{}': {} train / {} test",
            class_name,
            train_files.len(),
            test_files.len()
        );

        let (train_count, train_err) =
            copy_subset(train_files, dest_root, TRAIN_SUBDIR, &class_name);
        let (test_count, test_err) = if train_err.is_none() {
            copy_subset(test_files, dest_root, TEST_SUBDIR, &class_name)
        } else {
            (0, None)
        };

        let failure = train_err.or(test_err).map(|e| {
            error!("Class '{}' split incomplete: {}", class_name, e);
            e.to_string()
        });

        classes.push(ClassSplit {
            class_name,
            train_count,
            test_count,
            total_count,
            failure,
        });
    }

    let summary = SplitSummary {
        classes,
        config: config.clone(),
    };

    info!(
        "Split complete: {} train / {} test files",
        summary.train_total(),
        summary.test_total()
    );

    Ok(summary)
}
