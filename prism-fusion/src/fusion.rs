//! Project a point cloud into the color image and read instance masks there.

use crate::detection::{DetectionSet, ScoreMap, resize_bilinear};
use glam::{Mat4, Vec3};
use prism_data::{Intrinsics, world_to_camera};
use tracing::debug;

/// Label given to points no mask claims.
pub const UNLABELED: i32 = -1;

/// A mask score must be strictly above this to label a point.
pub const LABEL_THRESHOLD: f32 = 0.5;

/// Assign each point the class id of the mask that covers its reprojection.
///
/// `positions` are world-frame, `extrinsic` maps world to camera and
/// `(width, height)` is the resolution of the image the detections were made
/// on. The result has exactly one entry per input point, in input order.
/// Points behind the camera, outside the image, or under no mask scoring above
/// [`LABEL_THRESHOLD`] are [`UNLABELED`]. Where several masks share the
/// highest score the earliest one wins.
///
/// The camera matrices are taken as given; no shape or sanity checks are made.
pub fn fuse_labels(
    intrinsics: &Intrinsics,
    extrinsic: &Mat4,
    positions: &[Vec3],
    detections: &DetectionSet,
    (width, height): (u32, u32),
) -> Vec<i32> {
    let mut labels = vec![UNLABELED; positions.len()];
    if detections.is_empty() {
        return labels;
    }

    let masks: Vec<ScoreMap> = detections
        .detections
        .iter()
        .map(|d| resize_bilinear(&d.mask, width, height))
        .collect();

    let mut labeled = 0usize;
    for (index, world) in positions.iter().enumerate() {
        let Some((u, v)) = project_to_pixel(intrinsics, extrinsic, *world, width, height) else {
            continue;
        };

        let mut best_score = f32::NEG_INFINITY;
        let mut best_mask = 0;
        for (k, mask) in masks.iter().enumerate() {
            let score = mask.get_pixel(u, v).0[0];
            if score > best_score {
                best_score = score;
                best_mask = k;
            }
        }

        if best_score > LABEL_THRESHOLD {
            labels[index] = detections.detections[best_mask].class_id;
            labeled += 1;
        }
    }

    debug!(
        "Fused {} masks onto {} points ({} labeled)",
        masks.len(),
        positions.len(),
        labeled
    );
    labels
}

/// Nearest pixel a world point lands on, or `None` if it is behind the camera,
/// off the image or not a finite point. Halfway cases round to even.
fn project_to_pixel(
    intrinsics: &Intrinsics,
    extrinsic: &Mat4,
    world: Vec3,
    width: u32,
    height: u32,
) -> Option<(u32, u32)> {
    let cam = world_to_camera(extrinsic, world);
    if cam.z.is_nan() || cam.z <= 0.0 {
        return None;
    }
    let uv = intrinsics.project(cam);
    let u = uv.x.round_ties_even();
    let v = uv.y.round_ties_even();
    if !u.is_finite() || !v.is_finite() {
        return None;
    }
    if u < 0.0 || v < 0.0 || u >= width as f32 || v >= height as f32 {
        return None;
    }
    Some((u as u32, v as u32))
}
