//! Error taxonomy of the dataset loader.
//!
//! All fallible APIs in this crate return [`anyhow::Result`]; failures
//! that callers may want to tell apart are raised as [`DatasetError`]
//! values and stay recoverable through [`anyhow::Error::downcast_ref`].

use crate::common::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    /// Invalid options or label tables: unknown scenario/downloader
    /// combination, unmapped class name, mismatched train/test counts.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A required file or directory does not exist.
    #[error("missing resource '{}'", .0.display())]
    MissingResource(PathBuf),

    /// The on-disk data contradicts its own metadata: frame/mask count
    /// mismatch, an instance id outside every segmentation range, or an
    /// ambiguous scenario directory match.
    #[error("integrity check failed: {0}")]
    Integrity(String),

    /// An image file exists but cannot be decoded.
    #[error("failed to decode image '{}'", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
