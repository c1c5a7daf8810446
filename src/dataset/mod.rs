//! Dataset module for PlantVillage data preparation
//!
//! This module provides functionality for:
//! - Splitting a raw per-class image tree into train/test trees
//! - Loading a training tree into a normalized image tensor
//! - Encoding class-folder names as one-hot training targets
//!
//! The splitter produces the directory layout the loader expects:
//!
//! ```text
//! dest_root/
//! ├── train/
//! │   ├── Tomato___Early_blight/
//! │   │   └── *.jpg
//! │   └── ...
//! └── test/
//!     └── ...
//! ```

pub mod encoder;
pub mod loader;
pub mod split;

pub use encoder::LabelEncoder;
pub use loader::{
    load_dataset, scan_class_counts, DecodeErrorPolicy, ImageRecord, ImageStream, LoadedDataset,
    LoaderConfig,
};
pub use split::{split_dataset, ClassSplit, SplitConfig, SplitSummary, TEST_SUBDIR, TRAIN_SUBDIR};

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_class_images(root: &Path, class: &str, count: usize) {
        let dir = root.join(class);
        fs::create_dir_all(&dir).unwrap();
        for i in 0..count {
            let img = image::ImageBuffer::from_fn(16, 16, |_, _| {
                image::Rgb([(i * 20) as u8, 80, 140])
            });
            img.save(dir.join(format!("leaf_{i:03}.jpg"))).unwrap();
        }
    }

    // Full pipeline: split raw data, load the train tree, encode the labels.
    #[test]
    fn test_split_then_load_then_encode() {
        let raw = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_class_images(raw.path(), "Tomato___Early_blight", 10);
        write_class_images(raw.path(), "Potato___healthy", 5);

        let split_config = SplitConfig {
            train_ratio: 0.8,
            seed: Some(42),
        };
        let summary = split_dataset(raw.path(), out.path(), &split_config).unwrap();
        assert_eq!(summary.train_total(), 8 + 4);
        assert_eq!(summary.test_total(), 2 + 1);

        let loader_config = LoaderConfig {
            image_size: 8,
            ..LoaderConfig::default()
        };
        let dataset = load_dataset(out.path().join(TRAIN_SUBDIR), loader_config).unwrap();
        assert_eq!(dataset.len(), 12);
        assert_eq!(dataset.images.shape(), &[12, 8, 8, 3]);

        let encoder = LabelEncoder::fit(&dataset.labels);
        assert_eq!(encoder.num_classes(), 2);
        let targets = encoder.transform(&dataset.labels).unwrap();
        assert_eq!(targets.shape(), &[12, 2]);
        for (row, label) in targets.rows().into_iter().zip(&dataset.labels) {
            let active = row.iter().position(|&v| v == 1.0).unwrap();
            assert_eq!(encoder.decode_index(active).unwrap(), label);
        }
    }
}
