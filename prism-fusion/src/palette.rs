//! Display colors for fused labels.

use crate::fusion::UNLABELED;
use glam::Vec3;

/// Colors cycled through by class id.
pub const CLASS_COLORS: &[[u8; 3]] = &[
    [230, 25, 75],
    [60, 180, 75],
    [255, 225, 25],
    [0, 130, 200],
    [245, 130, 48],
    [145, 30, 180],
    [70, 240, 240],
    [240, 50, 230],
    [210, 245, 60],
    [250, 190, 190],
];

/// Display color for a class id (RGB, 0-1). `None` for [`UNLABELED`].
pub fn class_color(class_id: i32) -> Option<Vec3> {
    if class_id == UNLABELED || class_id < 0 {
        return None;
    }
    let [r, g, b] = CLASS_COLORS[class_id as usize % CLASS_COLORS.len()];
    Some(Vec3::new(r as f32, g as f32, b as f32) / 255.0)
}

/// Replace the color of every labeled point by its class color.
/// Unlabeled points keep their source color.
pub fn colorize_labels(colors: &mut [Vec3], labels: &[i32]) {
    for (color, &label) in colors.iter_mut().zip(labels) {
        if let Some(c) = class_color(label) {
            *color = c;
        }
    }
}
