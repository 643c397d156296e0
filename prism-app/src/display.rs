//! Point coloring modes for the 3D view.

use crate::view::FrameElements;
use glam::Vec3;
use prism_fusion::colorize_labels;
use std::fmt;
use std::str::FromStr;

/// How points are colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// Source colors from the color image.
    #[default]
    Colors,
    /// Class colors where labels exist, source colors elsewhere.
    Segmentation,
    /// Normals mapped to RGB.
    Normals,
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayMode::Colors => write!(f, "Colors"),
            DisplayMode::Segmentation => write!(f, "Segmentation"),
            DisplayMode::Normals => write!(f, "Normals"),
        }
    }
}

impl FromStr for DisplayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "colors" | "color" => Ok(DisplayMode::Colors),
            "segmentation" | "seg" => Ok(DisplayMode::Segmentation),
            "normals" | "normal" => Ok(DisplayMode::Normals),
            other => Err(format!("unknown display mode '{other}'")),
        }
    }
}

impl DisplayMode {
    /// Cycle to the next mode.
    pub fn next(self) -> Self {
        match self {
            DisplayMode::Colors => DisplayMode::Segmentation,
            DisplayMode::Segmentation => DisplayMode::Normals,
            DisplayMode::Normals => DisplayMode::Colors,
        }
    }
}

/// Per-point display colors for a frame.
///
/// Falls back to source colors when the mode's data is missing (no labels or
/// no normals for this frame), and to white when the cloud has no colors.
pub fn point_colors(frame: &FrameElements, mode: DisplayMode) -> Vec<Vec3> {
    let cloud = &frame.cloud;
    let mut colors = cloud
        .colors
        .clone()
        .unwrap_or_else(|| vec![Vec3::ONE; cloud.len()]);

    match mode {
        DisplayMode::Colors => {}
        DisplayMode::Segmentation => {
            if let Some(labels) = &frame.labels {
                colorize_labels(&mut colors, labels);
            }
        }
        DisplayMode::Normals => {
            if let Some(normals) = &cloud.normals {
                for (color, n) in colors.iter_mut().zip(normals) {
                    if *n != Vec3::ZERO {
                        *color = *n * 0.5 + Vec3::splat(0.5);
                    }
                }
            }
        }
    }
    colors
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_data::PointCloud;
    use prism_fusion::{UNLABELED, class_color};

    fn frame_with(cloud: PointCloud, labels: Option<Vec<i32>>) -> FrameElements {
        let mut frame = FrameElements::empty(0);
        frame.cloud = cloud;
        frame.labels = labels;
        frame
    }

    #[test]
    fn test_mode_cycle_visits_all() {
        let mode = DisplayMode::Colors.next();
        assert_eq!(mode, DisplayMode::Segmentation);
        assert_eq!(mode.next(), DisplayMode::Normals);
        assert_eq!(mode.next().next(), DisplayMode::Colors);
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!("seg".parse::<DisplayMode>().unwrap(), DisplayMode::Segmentation);
        assert!("wireframe".parse::<DisplayMode>().is_err());
    }

    #[test]
    fn test_segmentation_colors_only_labeled_points() {
        let cloud = PointCloud::with_colors(vec![Vec3::ZERO; 2], vec![Vec3::splat(0.2); 2]);
        let frame = frame_with(cloud, Some(vec![UNLABELED, 3]));
        let colors = point_colors(&frame, DisplayMode::Segmentation);
        assert_eq!(colors[0], Vec3::splat(0.2));
        assert_eq!(colors[1], class_color(3).unwrap());
    }

    #[test]
    fn test_normals_mode_without_normals_keeps_colors() {
        let cloud = PointCloud::with_colors(vec![Vec3::ZERO], vec![Vec3::X]);
        let frame = frame_with(cloud, None);
        assert_eq!(point_colors(&frame, DisplayMode::Normals), vec![Vec3::X]);
    }
}
