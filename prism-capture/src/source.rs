//! Common capture source types and traits.

use prism_data::{DataError, Intrinsics, RgbdFrame};
use thiserror::Error;

/// Errors that can occur during capture.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Failed to open source: {0}")]
    OpenFailed(String),

    #[error("Frame data error: {0}")]
    Data(#[from] DataError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for sources that provide aligned color/depth frames.
///
/// Sources are owned and driven by the producer thread, hence `Send`.
pub trait RgbdSource: Send {
    /// Get the next frame. `Ok(None)` means the stream has ended.
    fn next_frame(&mut self) -> Result<Option<RgbdFrame>, CaptureError>;

    /// Get the frame rate, if known.
    fn frame_rate(&self) -> Option<f32>;

    /// Get the resolution (width, height).
    fn resolution(&self) -> (u32, u32);

    /// Intrinsics of the color/depth pair.
    fn intrinsics(&self) -> Intrinsics;

    /// Check if the source is still active.
    fn is_active(&self) -> bool;

    /// Stop capturing.
    fn stop(&mut self);
}

impl RgbdSource for Box<dyn RgbdSource> {
    fn next_frame(&mut self) -> Result<Option<RgbdFrame>, CaptureError> {
        (**self).next_frame()
    }

    fn frame_rate(&self) -> Option<f32> {
        (**self).frame_rate()
    }

    fn resolution(&self) -> (u32, u32) {
        (**self).resolution()
    }

    fn intrinsics(&self) -> Intrinsics {
        (**self).intrinsics()
    }

    fn is_active(&self) -> bool {
        (**self).is_active()
    }

    fn stop(&mut self) {
        (**self).stop()
    }
}
