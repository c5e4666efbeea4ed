//! rainfall-classifiers: feature extraction and classification for
//! California winter extreme-rainfall prediction.
//!
//! Gridded November-mean fields (surface temperature, sea-level pressure,
//! precipitable water, ...) from many ensemble members and years are reduced
//! to a small, fixed-width feature row per sample by a grid-normalizing PCA
//! extractor. A sparse logistic classifier then turns those rows into the
//! probability that northern California exceeds its winter rainfall
//! threshold.
//!
//! Cross-validation, skill scores and reading the model output files are left
//! to the caller; the crate only needs the fields as `(sample, lat, lon)`
//! arrays and the binary labels.
pub mod config;
pub mod data_handling;
pub mod decomposition;
pub mod error;
pub mod feature_extractor;
pub mod models;
pub mod pipeline;
pub mod preprocessing;
pub mod synthetic;

pub use error::{ErrorKind, PipelineError, Result};
