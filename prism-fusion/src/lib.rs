//! Prism Fusion Crate
//!
//! Lifts 2D instance segmentation onto 3D point clouds.
//!
//! ## Modules
//!
//! - [`detection`]: instance masks and bilinear mask resizing
//! - [`detector`]: the [`Detector`] trait and built-in detectors
//! - [`fusion`]: per-point label assignment through the pinhole camera
//! - [`palette`]: display colors for labels

pub mod detection;
pub mod detector;
mod error;
pub mod fusion;
pub mod palette;

pub use detection::{Detection, DetectionSet, ScoreMap, resize_bilinear};
pub use detector::{ColorKey, ColorKeyDetector, Detector, NullDetector};
pub use error::FusionError;
pub use fusion::{LABEL_THRESHOLD, UNLABELED, fuse_labels};
pub use palette::{class_color, colorize_labels};
