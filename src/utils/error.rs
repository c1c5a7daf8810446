//! Error Handling Module
//!
//! Defines custom error types for the PlantVillage preparation pipeline.
//! Uses thiserror for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for dataset preparation operations
#[derive(Error, Debug)]
pub enum PrepError {
    /// A class directory or dataset root is missing or unreadable.
    /// Always fatal: it indicates a misconfigured input root.
    #[error("Failed to access directory '{path}': {source}")]
    DirectoryAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An image file could not be decoded (missing, corrupt, or unreadable)
    #[error("Failed to decode image '{path}': {reason}")]
    Decode { path: PathBuf, reason: String },

    /// A label was not seen when the encoder was fitted
    #[error("Unknown label '{0}': not present in the fitted class set")]
    UnknownLabel(String),

    /// A file copy failed during dataset splitting
    #[error("Failed to copy '{src}' to '{dst}': {source}")]
    Copy {
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Tensor shape error when stacking image arrays
    #[error("Shape error: {0}")]
    Shape(String),
}

/// Convenience Result type for dataset preparation operations
pub type Result<T> = std::result::Result<T, PrepError>;

impl PrepError {
    /// Wrap an io::Error as a directory access failure for the given path
    pub fn dir_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryAccess {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PrepError::UnknownLabel("Tomato___Late_blight".to_string());
        assert!(format!("{}", err).contains("Tomato___Late_blight"));
    }

    #[test]
    fn test_decode_error_display() {
        let err = PrepError::Decode {
            path: PathBuf::from("/data/train/Apple___healthy/img.jpg"),
            reason: "unexpected EOF".to_string(),
        };
        assert!(format!("{}", err).contains("img.jpg"));
        assert!(format!("{}", err).contains("unexpected EOF"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: PrepError = io.into();
        assert!(matches!(err, PrepError::Io(_)));
    }
}
