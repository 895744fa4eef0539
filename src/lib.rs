//! Loader for continual-learning image and video streams recorded by the
//! endless continual-learning simulator.
//!
//! The on-disk tree is organized into train/test sequence directories,
//! each holding time-ordered subsequences that simulate a non-stationary
//! data stream. This crate scans the tree, recovers sequence boundaries
//! and label tables from the JSON descriptors, and exposes every
//! subsequence through synchronous per-sample random access.

mod common;
pub mod config;
pub mod dataset;
pub mod download;
pub mod error;

pub use config::{ArchiveSpec, PatchSize, Scenario, TaskKind};
pub use dataset::{
    ClassificationSubsequence, DatasetInit, DatasetPreparer, EndlessClSimDataset, LabelMap,
    RandomAccessDataset, Sample, SegmentationRangeMap, Subsequence, Target, VideoSubsequence,
};
pub use download::Downloader;
pub use error::DatasetError;
