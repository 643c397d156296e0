//! Procedurally generated RGBD scene.

use crate::source::{CaptureError, RgbdSource};
use glam::Vec3;
use image::{Luma, Rgb, RgbImage};
use prism_data::{DepthImage, Intrinsics, RgbdFrame};
use tracing::info;

const FLOOR_Y: f32 = 0.8;
const WALL_Z: f32 = 2.8;
const BOX_HALF: Vec3 = Vec3::new(0.3, 0.25, 0.3);
const BOX_CENTER: Vec3 = Vec3::new(0.0, FLOOR_Y - 0.25, 1.8);

/// A ray-cast room with a floor, a back wall and a box sliding left and right.
///
/// Depth is in millimeters. Useful for running the pipeline without hardware
/// and as a deterministic source in tests.
pub struct SyntheticSource {
    width: u32,
    height: u32,
    intrinsics: Intrinsics,
    frame_count: u64,
    frame_limit: Option<u64>,
    active: bool,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32) -> Self {
        let f = width as f32 * 0.8;
        Self {
            width,
            height,
            intrinsics: Intrinsics::new(f, f, width as f32 / 2.0, height as f32 / 2.0),
            frame_count: 0,
            frame_limit: None,
            active: true,
        }
    }

    /// End the stream after `limit` frames.
    pub fn with_frame_limit(mut self, limit: u64) -> Self {
        self.frame_limit = Some(limit);
        self
    }

    fn box_center(&self) -> Vec3 {
        let phase = self.frame_count as f32 / 30.0;
        BOX_CENTER + Vec3::new(0.4 * phase.sin(), 0.0, 0.0)
    }

    /// Cast one camera ray and return the hit depth (camera z) and color.
    fn trace(&self, dir: Vec3, box_center: Vec3) -> Option<(f32, [u8; 3])> {
        let mut best: Option<(f32, [u8; 3])> = None;
        let mut consider = |t: f32, color: [u8; 3]| {
            if t > 0.0 && best.is_none_or(|(bt, _)| t < bt) {
                best = Some((t, color));
            }
        };

        if let Some(t) = ray_box(dir, box_center - BOX_HALF, box_center + BOX_HALF) {
            consider(t, [200, 40, 40]);
        }
        if dir.y > 0.0 {
            let t = FLOOR_Y / dir.y;
            let hit = dir * t;
            let checker = ((hit.x * 4.0).floor() as i32 + (hit.z * 4.0).floor() as i32) & 1;
            consider(t, if checker == 0 { [150, 150, 150] } else { [90, 90, 90] });
        }
        consider(WALL_Z / dir.z, [60, 90, 160]);

        // dir.z == 1, so the ray parameter is the camera-frame depth.
        best
    }
}

fn ray_box(dir: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let inv = dir.recip();
    let t0 = min * inv;
    let t1 = max * inv;
    let near = t0.min(t1).max_element();
    let far = t0.max(t1).min_element();
    (near <= far && far > 0.0).then_some(near)
}

impl RgbdSource for SyntheticSource {
    fn next_frame(&mut self) -> Result<Option<RgbdFrame>, CaptureError> {
        if !self.active || self.frame_limit.is_some_and(|limit| self.frame_count >= limit) {
            return Ok(None);
        }

        let k = self.intrinsics;
        let box_center = self.box_center();
        let mut color = RgbImage::new(self.width, self.height);
        let mut depth = DepthImage::new(self.width, self.height);

        for v in 0..self.height {
            for u in 0..self.width {
                let dir = Vec3::new((u as f32 - k.cx) / k.fx, (v as f32 - k.cy) / k.fy, 1.0);
                if let Some((z, rgb)) = self.trace(dir, box_center) {
                    color.put_pixel(u, v, Rgb(rgb));
                    depth.put_pixel(u, v, Luma([(z * 1000.0).round() as u16]));
                }
            }
        }

        let timestamp = self.frame_count as f64 / 30.0;
        let frame = RgbdFrame::new(color, depth, k, timestamp, self.frame_count);
        self.frame_count += 1;
        Ok(Some(frame))
    }

    fn frame_rate(&self) -> Option<f32> {
        Some(30.0)
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn intrinsics(&self) -> Intrinsics {
        self.intrinsics
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn stop(&mut self) {
        self.active = false;
        info!("Synthetic source stopped after {} frames", self.frame_count);
    }
}
