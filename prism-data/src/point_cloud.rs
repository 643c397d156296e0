//! Point clouds and depth→cloud conversion.

use crate::camera::Intrinsics;
use crate::frame::RgbdFrame;
use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How raw depth values become metric points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthConversion {
    /// Raw depth units per meter (1000 for millimeter depth).
    pub depth_scale: f32,
    /// Depths beyond this many meters are dropped.
    pub depth_max: f32,
    /// Sample every `stride`-th pixel in both directions.
    pub stride: u32,
}

impl Default for DepthConversion {
    fn default() -> Self {
        Self {
            depth_scale: 1000.0,
            depth_max: 3.0,
            stride: 1,
        }
    }
}

/// An ordered point cloud stored as parallel arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    pub positions: Vec<Vec3>,
    /// RGB in 0-1, one per position when present.
    pub colors: Option<Vec<Vec3>>,
    /// Unit normals, one per position when present. Zero where undefined.
    pub normals: Option<Vec<Vec3>>,
}

impl PointCloud {
    pub fn new(positions: Vec<Vec3>) -> Self {
        Self {
            positions,
            colors: None,
            normals: None,
        }
    }

    pub fn with_colors(positions: Vec<Vec3>, colors: Vec<Vec3>) -> Self {
        debug_assert_eq!(positions.len(), colors.len());
        Self {
            positions,
            colors: Some(colors),
            normals: None,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Back-project a depth image into a world-frame cloud colored from the
    /// color image. Zero and out-of-range depths produce no point.
    ///
    /// With `estimate_normals`, each point gets the normal of the plane spanned
    /// by its right and lower grid neighbors, oriented towards the sensor.
    pub fn from_rgbd(frame: &RgbdFrame, conversion: &DepthConversion, estimate_normals: bool) -> Self {
        let (width, height) = frame.dimensions();
        let stride = conversion.stride.max(1);
        let camera_to_world = frame.extrinsic.inverse();
        let rotation = Mat3::from_mat4(camera_to_world);

        let grid_w = width.div_ceil(stride) as usize;
        let grid_h = height.div_ceil(stride) as usize;

        // Camera-frame point per grid cell, if the depth there is valid.
        let mut grid: Vec<Option<Vec3>> = Vec::with_capacity(grid_w * grid_h);
        for v in (0..height).step_by(stride as usize) {
            for u in (0..width).step_by(stride as usize) {
                grid.push(sample_point(frame, &frame.intrinsics, conversion, u, v));
            }
        }

        let mut positions = Vec::new();
        let mut colors = Vec::new();
        let mut normals = if estimate_normals { Some(Vec::new()) } else { None };

        for gy in 0..grid_h {
            for gx in 0..grid_w {
                let Some(p) = grid[gy * grid_w + gx] else {
                    continue;
                };
                let u = gx as u32 * stride;
                let v = gy as u32 * stride;
                positions.push(camera_to_world.transform_point3(p));
                let rgb = frame.color.get_pixel(u, v).0;
                colors.push(Vec3::new(rgb[0] as f32, rgb[1] as f32, rgb[2] as f32) / 255.0);

                if let Some(normals) = normals.as_mut() {
                    let right = (gx + 1 < grid_w).then(|| grid[gy * grid_w + gx + 1]).flatten();
                    let down = (gy + 1 < grid_h).then(|| grid[(gy + 1) * grid_w + gx]).flatten();
                    let n = match (right, down) {
                        (Some(r), Some(d)) => orient_towards_origin((r - p).cross(d - p), p),
                        _ => Vec3::ZERO,
                    };
                    normals.push(rotation * n);
                }
            }
        }

        debug!(
            "Depth conversion produced {} points from {}x{} (stride {})",
            positions.len(),
            width,
            height,
            stride
        );

        Self {
            positions,
            colors: Some(colors),
            normals,
        }
    }
}

fn sample_point(
    frame: &RgbdFrame,
    intrinsics: &Intrinsics,
    conversion: &DepthConversion,
    u: u32,
    v: u32,
) -> Option<Vec3> {
    let raw = frame.depth.get_pixel(u, v).0[0];
    if raw == 0 {
        return None;
    }
    let z = raw as f32 / conversion.depth_scale;
    if z > conversion.depth_max {
        return None;
    }
    Some(intrinsics.unproject_pixel(u as f32, v as f32, z))
}

fn orient_towards_origin(n: Vec3, p: Vec3) -> Vec3 {
    let n = n.normalize_or_zero();
    if n.dot(p) > 0.0 { -n } else { n }
}
