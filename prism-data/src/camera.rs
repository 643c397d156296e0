//! Pinhole camera model and the display camera used for picking.
//!
//! Two cameras live here. [`Intrinsics`] plus a world→camera extrinsic describe
//! the physical sensor and are used to project point clouds onto the color
//! image. [`ViewCamera`] is the interactive display camera (view + projection
//! matrices) whose depth buffer is sampled when the user clicks into the 3D view.

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Depth-buffer value meaning "no visible geometry at this pixel".
pub const FAR_PLANE_DEPTH: f32 = 1.0;

/// Pinhole intrinsic parameters in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
}

impl Intrinsics {
    pub fn new(fx: f32, fy: f32, cx: f32, cy: f32) -> Self {
        Self { fx, fy, cx, cy }
    }

    /// Read the parameters out of a 3x3 intrinsic matrix.
    ///
    /// The matrix is the usual `[[fx, 0, cx], [0, fy, cy], [0, 0, 1]]` in
    /// row-major notation; glam stores it column-major, so `cx` sits in the
    /// third column.
    pub fn from_matrix(m: &Mat3) -> Self {
        Self {
            fx: m.x_axis.x,
            fy: m.y_axis.y,
            cx: m.z_axis.x,
            cy: m.z_axis.y,
        }
    }

    pub fn matrix(&self) -> Mat3 {
        Mat3::from_cols(
            Vec3::new(self.fx, 0.0, 0.0),
            Vec3::new(0.0, self.fy, 0.0),
            Vec3::new(self.cx, self.cy, 1.0),
        )
    }

    /// Project a camera-frame point to continuous pixel coordinates.
    ///
    /// The caller is responsible for discarding points with `z <= 0`.
    #[inline]
    pub fn project(&self, p: Vec3) -> Vec2 {
        Vec2::new(p.x * self.fx / p.z + self.cx, p.y * self.fy / p.z + self.cy)
    }

    /// Lift a pixel with metric depth back into the camera frame.
    #[inline]
    pub fn unproject_pixel(&self, u: f32, v: f32, depth: f32) -> Vec3 {
        Vec3::new(
            (u - self.cx) * depth / self.fx,
            (v - self.cy) * depth / self.fy,
            depth,
        )
    }
}

impl Default for Intrinsics {
    /// A 640x480 sensor with a ~58 degree horizontal field of view.
    fn default() -> Self {
        Self::new(525.0, 525.0, 319.5, 239.5)
    }
}

/// Apply a rigid world→camera transform to a world-frame point.
#[inline]
pub fn world_to_camera(extrinsic: &Mat4, p: Vec3) -> Vec3 {
    let h = *extrinsic * p.extend(1.0);
    h.truncate()
}

/// Scene bounds computed from point positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneBounds {
    pub min: Vec3,
    pub max: Vec3,
    pub center: Vec3,
    pub radius: f32,
}

impl SceneBounds {
    pub fn from_positions(positions: impl Iterator<Item = Vec3>) -> Self {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        let mut count = 0;

        for pos in positions {
            min = min.min(pos);
            max = max.max(pos);
            count += 1;
        }

        if count == 0 {
            return Self {
                min: Vec3::ZERO,
                max: Vec3::ZERO,
                center: Vec3::ZERO,
                radius: 1.0,
            };
        }

        let center = (min + max) * 0.5;
        let radius = ((max - min).length() * 0.5).max(0.5);
        Self {
            min,
            max,
            center,
            radius,
        }
    }
}

/// Framing presets for the display camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPreset {
    /// Look out of the sensor, the way the color image sees the scene.
    Camera,
    /// Look straight down onto the scene.
    BirdsEye,
}

/// Snapshot of the display camera.
///
/// Uses the wgpu depth convention: normalized depth runs from 0 at the near
/// plane to [`FAR_PLANE_DEPTH`] at the far plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewCamera {
    pub view: Mat4,
    pub projection: Mat4,
}

impl ViewCamera {
    pub fn new(view: Mat4, projection: Mat4) -> Self {
        Self { view, projection }
    }

    /// Perspective camera at `eye` looking at `center`.
    pub fn look_at(eye: Vec3, center: Vec3, up: Vec3, fov_y: f32, aspect: f32) -> Self {
        Self {
            view: Mat4::look_at_rh(eye, center, up),
            projection: Mat4::perspective_rh(fov_y, aspect, 0.05, 100.0),
        }
    }

    /// Frame `bounds` with one of the presets.
    ///
    /// Sensor coordinates have +y pointing down and +z pointing forward, so
    /// "up" on screen is -y.
    pub fn preset(preset: ViewPreset, bounds: &SceneBounds, fov_y: f32, aspect: f32) -> Self {
        match preset {
            ViewPreset::Camera => Self::look_at(
                Vec3::ZERO,
                Vec3::new(0.0, 0.0, bounds.center.z.max(1.0)),
                Vec3::NEG_Y,
                fov_y,
                aspect,
            ),
            ViewPreset::BirdsEye => {
                let eye = bounds.center + Vec3::new(0.0, -3.0 * bounds.radius, 0.0);
                Self::look_at(eye, bounds.center, Vec3::Z, fov_y, aspect)
            }
        }
    }

    fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// Convert a viewport pixel plus a normalized depth-buffer value into a
    /// world-space point. `(x, y)` has its origin at the top-left corner.
    pub fn unproject(&self, x: f32, y: f32, depth: f32, width: u32, height: u32) -> Vec3 {
        let ndc = Vec3::new(
            2.0 * x / width as f32 - 1.0,
            1.0 - 2.0 * y / height as f32,
            depth,
        );
        self.view_projection().inverse().project_point3(ndc)
    }

    /// Project a world point into the viewport, returning `(x, y, depth)`.
    ///
    /// Returns `None` for points behind the camera or outside the depth range.
    pub fn project(&self, world: Vec3, width: u32, height: u32) -> Option<Vec3> {
        let clip: Vec4 = self.view_projection() * world.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        if !(0.0..=1.0).contains(&ndc.z) {
            return None;
        }
        Some(Vec3::new(
            (ndc.x + 1.0) * 0.5 * width as f32,
            (1.0 - ndc.y) * 0.5 * height as f32,
            ndc.z,
        ))
    }
}

impl Default for ViewCamera {
    fn default() -> Self {
        Self::preset(
            ViewPreset::Camera,
            &SceneBounds::from_positions(std::iter::empty()),
            std::f32::consts::FRAC_PI_3,
            4.0 / 3.0,
        )
    }
}
