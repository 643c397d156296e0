//! RGBD frames as produced by a capture source.

use crate::camera::Intrinsics;
use glam::Mat4;
use image::{ImageBuffer, Luma, RgbImage};

/// Raw depth image in sensor units (see [`DepthConversion::depth_scale`]).
///
/// [`DepthConversion::depth_scale`]: crate::DepthConversion::depth_scale
pub type DepthImage = ImageBuffer<Luma<u16>, Vec<u16>>;

/// One color/depth pair with its camera model.
#[derive(Debug, Clone)]
pub struct RgbdFrame {
    pub color: RgbImage,
    /// Same resolution as `color`.
    pub depth: DepthImage,
    pub intrinsics: Intrinsics,
    /// Rigid world→camera transform.
    pub extrinsic: Mat4,
    /// Seconds since the stream started.
    pub timestamp: f64,
    pub frame_number: u64,
}

impl RgbdFrame {
    /// Create a frame at the world origin (identity extrinsic).
    ///
    /// Color and depth must share one resolution; this is checked in debug builds.
    pub fn new(
        color: RgbImage,
        depth: DepthImage,
        intrinsics: Intrinsics,
        timestamp: f64,
        frame_number: u64,
    ) -> Self {
        debug_assert_eq!(color.dimensions(), depth.dimensions());
        Self {
            color,
            depth,
            intrinsics,
            extrinsic: Mat4::IDENTITY,
            timestamp,
            frame_number,
        }
    }

    pub fn with_extrinsic(mut self, extrinsic: Mat4) -> Self {
        self.extrinsic = extrinsic;
        self
    }

    /// Image dimensions (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        self.color.dimensions()
    }
}
