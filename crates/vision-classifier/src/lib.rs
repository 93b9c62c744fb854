//! Vision Classifier
//!
//! Object-detection support for the proctoring pipeline:
//! - Detection result types (objects, scores, bounding boxes)
//! - Cancellation-safe model loading ([`ClassifierLoader`])
//! - A deterministic heuristic detector for the default build
//! - Optional ONNX backend behind the `onnx` feature
//!
//! A load resolving after the loader is shut down is an expected race, not
//! an error: the handle is closed on the spot and no state is written.

pub mod detect;
pub mod loader;
#[cfg(feature = "onnx")]
pub mod onnx;

pub use detect::{BoundingBox, DetectedObject, DetectionResult, Detector, HeuristicDetector};
pub use loader::ClassifierLoader;

use thiserror::Error;

/// Classifier error types
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Detection failed: {0}")]
    Detection(String),

    #[error("Frame has no usable dimensions")]
    UnusableFrame,
}
