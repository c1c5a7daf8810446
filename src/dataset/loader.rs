//! PlantVillage Image Loader
//!
//! Walks a directory tree of per-class image folders and turns it into an
//! in-memory numeric dataset: one `(n, height, width, 3)` float tensor plus a
//! parallel list of class-name labels.
//!
//! Images are decoded lazily through [`ImageStream`], so callers that cannot
//! afford the full tensor in memory can consume records one at a time and
//! batch them however they like. [`load_dataset`] drives the same stream to
//! completion and stacks everything.

use std::fs;
use std::path::{Path, PathBuf};

use image::ImageReader;
use ndarray::Array4;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::utils::error::{PrepError, Result};
use crate::utils::logging::ProgressLogger;
use crate::{IMAGES_PER_CLASS, IMAGE_SIZE, PIXEL_DIVISOR};

/// What to do when an image file cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeErrorPolicy {
    /// Log a warning and move on. The record is dropped entirely, so the
    /// image/label index correspondence stays intact.
    #[default]
    Skip,
    /// Fail the whole load on the first undecodable file.
    Abort,
}

/// Configuration for loading a training directory
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Target square resolution images are resized to
    pub image_size: u32,
    /// Maximum number of directory entries considered per class.
    /// Applied to the raw listing, before extension filtering.
    pub images_per_class: usize,
    /// Divisor applied to raw pixel intensities when stacking the tensor.
    /// Defaults to [`PIXEL_DIVISOR`], which is 225.0 rather than 255.0;
    /// models trained against that scaling expect the same value at
    /// inference time.
    pub pixel_divisor: f32,
    /// Policy for undecodable files
    pub decode_error_policy: DecodeErrorPolicy,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            image_size: IMAGE_SIZE,
            images_per_class: IMAGES_PER_CLASS,
            pixel_divisor: PIXEL_DIVISOR,
            decode_error_policy: DecodeErrorPolicy::default(),
        }
    }
}

/// One decoded, resized image paired with its label.
///
/// Pixel values are raw channel intensities in `0.0..=255.0`, laid out
/// row-major HWC. Scaling by the configured divisor happens when the full
/// tensor is stacked.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    /// Raw pixel data, `image_size * image_size * 3` values
    pub pixels: Vec<f32>,
    /// Class label, the name of the enclosing folder
    pub label: String,
    /// Path the image was read from
    pub path: PathBuf,
}

/// Fully loaded dataset ready for hand-off to a training backend
#[derive(Debug)]
pub struct LoadedDataset {
    /// Normalized image tensor, shape `(n, height, width, 3)`
    pub images: Array4<f32>,
    /// Labels parallel to the first tensor axis
    pub labels: Vec<String>,
    /// Per-class loaded counts, in processing order
    pub per_class: Vec<(String, usize)>,
}

impl LoadedDataset {
    /// Number of loaded images
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether anything was loaded
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of distinct classes that contributed at least one image
    pub fn num_classes(&self) -> usize {
        self.per_class.iter().filter(|(_, n)| *n > 0).count()
    }
}

/// Returns true for files this pipeline treats as images.
///
/// Case-insensitive on the extension; only JPEG variants are accepted.
fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            ext == "jpg" || ext == "jpeg"
        })
        .unwrap_or(false)
}

/// List the files selected for one class directory: raw listing order,
/// truncated to the per-class cap, then extension-filtered.
fn list_class_files(class_dir: &Path, cap: usize) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(class_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let io = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("walk error"));
            PrepError::dir_access(class_dir, io)
        })?;
        if entry.file_type().is_file() {
            files.push(entry.path().to_path_buf());
        }
    }

    files.truncate(cap);
    files.retain(|p| is_image_file(p));
    Ok(files)
}

/// Streaming iterator over the images of a training directory.
///
/// Directory structure and per-class file lists are resolved eagerly at
/// construction (so directory access failures surface immediately), while
/// decoding happens one image at a time in `next()`.
pub struct ImageStream {
    config: LoaderConfig,
    /// (class name, selected files) in directory-listing order
    classes: Vec<(String, Vec<PathBuf>)>,
    class_idx: usize,
    file_idx: usize,
}

impl ImageStream {
    /// Open a training directory for streaming.
    ///
    /// `root` must contain one subdirectory per class; a missing or
    /// unreadable root or class directory is a fatal error.
    pub fn open(root: impl AsRef<Path>, config: LoaderConfig) -> Result<Self> {
        let root = root.as_ref();
        info!("Scanning training directory: {}", root.display());

        let entries = fs::read_dir(root).map_err(|e| PrepError::dir_access(root, e))?;

        let mut classes = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PrepError::dir_access(root, e))?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(class_name) = entry.file_name().to_str().map(String::from) else {
                continue;
            };
            let files = list_class_files(&entry.path(), config.images_per_class)?;
            debug!("Class '{}': {} candidate files", class_name, files.len());
            classes.push((class_name, files));
        }

        if classes.is_empty() {
            warn!("No class directories found under {}", root.display());
        } else {
            info!("Found {} classes", classes.len());
        }

        Ok(Self {
            config,
            classes,
            class_idx: 0,
            file_idx: 0,
        })
    }

    /// Total number of candidate files across all classes
    pub fn candidate_count(&self) -> usize {
        self.classes.iter().map(|(_, f)| f.len()).sum()
    }

    /// The loader configuration this stream was opened with
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    fn decode_one(&self, path: &Path, label: &str) -> Result<ImageRecord> {
        let img = ImageReader::open(path)
            .map_err(|e| PrepError::Decode {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
            .decode()
            .map_err(|e| PrepError::Decode {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let size = self.config.image_size;
        let resized = img.resize_exact(size, size, image::imageops::FilterType::Triangle);
        let rgb = resized.to_rgb8();

        let mut pixels = Vec::with_capacity((size * size * 3) as usize);
        for value in rgb.as_raw() {
            pixels.push(*value as f32);
        }

        Ok(ImageRecord {
            pixels,
            label: label.to_string(),
            path: path.to_path_buf(),
        })
    }
}

impl Iterator for ImageStream {
    type Item = Result<ImageRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (label, files) = self.classes.get(self.class_idx)?;
            let Some(path) = files.get(self.file_idx) else {
                self.class_idx += 1;
                self.file_idx = 0;
                continue;
            };
            let path = path.clone();
            let label = label.clone();
            self.file_idx += 1;

            match self.decode_one(&path, &label) {
                Ok(record) => return Some(Ok(record)),
                Err(err) => match self.config.decode_error_policy {
                    DecodeErrorPolicy::Skip => {
                        warn!("Skipping undecodable image: {}", err);
                        continue;
                    }
                    DecodeErrorPolicy::Abort => return Some(Err(err)),
                },
            }
        }
    }
}

/// Load an entire training directory into one normalized tensor.
///
/// Drives [`ImageStream`] to completion, stacks all records into a
/// `(n, image_size, image_size, 3)` tensor and divides every channel value
/// by the configured pixel divisor.
pub fn load_dataset(root: impl AsRef<Path>, config: LoaderConfig) -> Result<LoadedDataset> {
    let size = config.image_size as usize;
    let divisor = config.pixel_divisor;
    if divisor <= 0.0 {
        return Err(PrepError::Config(format!(
            "pixel_divisor must be positive, got {}",
            divisor
        )));
    }

    let stream = ImageStream::open(root, config)?;
    let mut progress = ProgressLogger::new("Loading images", stream.candidate_count());

    let mut data: Vec<f32> = Vec::new();
    let mut labels: Vec<String> = Vec::new();
    let mut per_class: Vec<(String, usize)> = Vec::new();

    for record in stream {
        let record = record?;
        data.extend(record.pixels.iter().map(|v| v / divisor));
        match per_class.last_mut() {
            Some((name, count)) if *name == record.label => *count += 1,
            _ => per_class.push((record.label.clone(), 1)),
        }
        labels.push(record.label);
        progress.increment();
    }
    progress.finish();

    let n = labels.len();
    let images = Array4::from_shape_vec((n, size, size, 3), data)
        .map_err(|e| PrepError::Shape(e.to_string()))?;

    info!("Loaded {} images across {} classes", n, per_class.len());

    Ok(LoadedDataset {
        images,
        labels,
        per_class,
    })
}

/// Count image files per class without decoding anything.
///
/// Used by the `inspect` CLI command; no per-class cap is applied.
pub fn scan_class_counts(root: impl AsRef<Path>) -> Result<Vec<(String, usize)>> {
    let root = root.as_ref();
    let entries = fs::read_dir(root).map_err(|e| PrepError::dir_access(root, e))?;

    let mut counts = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PrepError::dir_access(root, e))?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let Some(class_name) = entry.file_name().to_str().map(String::from) else {
            continue;
        };
        let files = list_class_files(&entry.path(), usize::MAX)?;
        counts.push((class_name, files.len()));
    }

    counts.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_test_image(path: &Path, color: [u8; 3]) {
        let img = image::ImageBuffer::from_fn(16, 16, |_, _| image::Rgb(color));
        img.save(path).unwrap();
    }

    fn make_class(root: &Path, name: &str, count: usize) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        for i in 0..count {
            write_test_image(&dir.join(format!("img_{i}.jpg")), [120, 60, 30]);
        }
    }

    fn small_config() -> LoaderConfig {
        LoaderConfig {
            image_size: 8,
            ..LoaderConfig::default()
        }
    }

    #[test]
    fn test_labels_align_with_images() {
        let tmp = TempDir::new().unwrap();
        make_class(tmp.path(), "Tomato___Early_blight", 3);
        make_class(tmp.path(), "Potato___healthy", 2);

        let ds = load_dataset(tmp.path(), small_config()).unwrap();
        assert_eq!(ds.len(), 5);
        assert_eq!(ds.images.shape(), &[5, 8, 8, 3]);
        assert_eq!(ds.labels.len(), 5);
        assert_eq!(ds.num_classes(), 2);

        let total: usize = ds.per_class.iter().map(|(_, n)| n).sum();
        assert_eq!(total, ds.len());
    }

    #[test]
    fn test_per_class_cap() {
        let tmp = TempDir::new().unwrap();
        make_class(tmp.path(), "Apple___healthy", 6);

        let config = LoaderConfig {
            images_per_class: 4,
            ..small_config()
        };
        let ds = load_dataset(tmp.path(), config).unwrap();
        assert_eq!(ds.len(), 4);
    }

    #[test]
    fn test_extension_filter_case_insensitive() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("Grape___Black_rot");
        fs::create_dir_all(&dir).unwrap();
        write_test_image(&dir.join("a.jpg"), [10, 10, 10]);
        write_test_image(&dir.join("b.JPG"), [10, 10, 10]);
        write_test_image(&dir.join("c.jpeg"), [10, 10, 10]);
        write_test_image(&dir.join("d.png"), [10, 10, 10]);
        fs::write(dir.join("notes.txt"), "not an image").unwrap();

        let ds = load_dataset(tmp.path(), small_config()).unwrap();
        assert_eq!(ds.len(), 3);
    }

    #[test]
    fn test_corrupt_image_skipped() {
        let tmp = TempDir::new().unwrap();
        make_class(tmp.path(), "Corn___Common_rust", 3);
        fs::write(
            tmp.path().join("Corn___Common_rust").join("zz_corrupt.jpg"),
            b"definitely not a jpeg",
        )
        .unwrap();

        let ds = load_dataset(tmp.path(), small_config()).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.images.shape()[0], 3);
    }

    #[test]
    fn test_corrupt_image_aborts_when_configured() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("Corn___Common_rust");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("bad.jpg"), b"garbage").unwrap();

        let config = LoaderConfig {
            decode_error_policy: DecodeErrorPolicy::Abort,
            ..small_config()
        };
        let err = load_dataset(tmp.path(), config).unwrap_err();
        assert!(matches!(err, PrepError::Decode { .. }));
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("does_not_exist");
        let err = load_dataset(&missing, small_config()).unwrap_err();
        assert!(matches!(err, PrepError::DirectoryAccess { .. }));
    }

    #[test]
    fn test_pixel_scaling_uses_divisor() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("Solid");
        fs::create_dir_all(&dir).unwrap();
        write_test_image(&dir.join("gray.jpg"), [180, 180, 180]);

        let ds = load_dataset(tmp.path(), small_config()).unwrap();
        // JPEG is lossy, allow a few intensity levels of slack
        let expected = 180.0 / PIXEL_DIVISOR;
        let actual = ds.images[[0, 4, 4, 0]];
        assert!(
            (actual - expected).abs() < 8.0 / PIXEL_DIVISOR,
            "expected ~{expected}, got {actual}"
        );
    }

    #[test]
    fn test_stream_yields_raw_pixels() {
        let tmp = TempDir::new().unwrap();
        make_class(tmp.path(), "Pepper___Bacterial_spot", 2);

        let stream = ImageStream::open(tmp.path(), small_config()).unwrap();
        let records: Vec<_> = stream.map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].pixels.len(), 8 * 8 * 3);
        assert_eq!(records[0].label, "Pepper___Bacterial_spot");
        // Raw intensities, not yet divided
        assert!(records[0].pixels.iter().any(|&v| v > 1.0));
    }

    #[test]
    fn test_empty_root_loads_empty_dataset() {
        let tmp = TempDir::new().unwrap();
        let ds = load_dataset(tmp.path(), small_config()).unwrap();
        assert!(ds.is_empty());
        assert_eq!(ds.images.shape()[0], 0);
    }

    #[test]
    fn test_scan_class_counts() {
        let tmp = TempDir::new().unwrap();
        make_class(tmp.path(), "B_class", 2);
        make_class(tmp.path(), "A_class", 3);
        fs::write(tmp.path().join("stray.txt"), "ignored").unwrap();

        let counts = scan_class_counts(tmp.path()).unwrap();
        assert_eq!(
            counts,
            vec![("A_class".to_string(), 3), ("B_class".to_string(), 2)]
        );
    }
}
