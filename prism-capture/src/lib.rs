//! Prism Capture - RGBD frames from multiple sources
//!
//! This crate provides implementations of the [`RgbdSource`] trait:
//!
//! - Recorded sequences of color/depth PNG pairs ([`RecordedSource`])
//! - A procedurally generated scene ([`SyntheticSource`])
//!
//! ## Example
//!
//! ```ignore
//! use prism_capture::{RgbdSource, SyntheticSource};
//!
//! let mut source = SyntheticSource::new(640, 480);
//! while let Some(frame) = source.next_frame()? {
//!     // Process frame...
//! }
//! ```

mod recorded;
mod source;
mod synthetic;

pub use recorded::RecordedSource;
pub use source::{CaptureError, RgbdSource};
pub use synthetic::SyntheticSource;
