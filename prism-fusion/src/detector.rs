//! Detector interface and the built-in detectors.
//!
//! A detector turns a color image into soft instance masks. Real segmentation
//! networks plug in by implementing [`Detector`]; only their output contract is
//! used here.

use crate::detection::{Detection, DetectionSet, ScoreMap};
use crate::error::FusionError;
use image::{Luma, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Produces instance masks for one color image.
pub trait Detector: Send {
    fn detect(&mut self, image: &RgbImage) -> Result<DetectionSet, FusionError>;

    /// Short name for logs and status text.
    fn name(&self) -> &str;
}

/// Finds nothing. Used before a real detector is initialized.
#[derive(Debug, Default)]
pub struct NullDetector;

impl Detector for NullDetector {
    fn detect(&mut self, _image: &RgbImage) -> Result<DetectionSet, FusionError> {
        Ok(DetectionSet::empty())
    }

    fn name(&self) -> &str {
        "null"
    }
}

/// One class for [`ColorKeyDetector`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorKey {
    pub class_id: i32,
    pub color: [u8; 3],
    /// RGB distance at which the score falls to zero.
    pub tolerance: f32,
}

/// Scores pixels by their distance to a per-class key color.
///
/// Emits one mask per class at `1 / downsample` of the image resolution,
/// mimicking the reduced output resolution of segmentation networks.
#[derive(Debug, Clone)]
pub struct ColorKeyDetector {
    keys: Vec<ColorKey>,
    downsample: u32,
}

impl ColorKeyDetector {
    pub fn new(keys: Vec<ColorKey>) -> Self {
        Self { keys, downsample: 4 }
    }

    pub fn with_downsample(mut self, factor: u32) -> Self {
        self.downsample = factor.max(1);
        self
    }

    fn score(key: &ColorKey, rgb: [u8; 3]) -> f32 {
        let d: f32 = rgb
            .iter()
            .zip(key.color)
            .map(|(&a, b)| (a as f32 - b as f32).powi(2))
            .sum::<f32>()
            .sqrt();
        (1.0 - d / key.tolerance.max(f32::EPSILON)).max(0.0)
    }
}

impl Detector for ColorKeyDetector {
    fn detect(&mut self, image: &RgbImage) -> Result<DetectionSet, FusionError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(FusionError::EmptyImage);
        }
        let f = self.downsample;
        let mask_w = width.div_ceil(f);
        let mask_h = height.div_ceil(f);

        let detections: Vec<Detection> = self
            .keys
            .iter()
            .map(|key| {
                let mask = ScoreMap::from_fn(mask_w, mask_h, |x, y| {
                    let px = (x * f).min(width - 1);
                    let py = (y * f).min(height - 1);
                    Luma([Self::score(key, image.get_pixel(px, py).0)])
                });
                Detection::new(mask, key.class_id)
            })
            .collect();

        debug!("Color key detector produced {} masks", detections.len());
        Ok(DetectionSet::new(detections))
    }

    fn name(&self) -> &str {
        "color-key"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_null_detector_is_empty() {
        let image = RgbImage::new(4, 4);
        assert!(NullDetector.detect(&image).unwrap().is_empty());
    }

    #[test]
    fn test_color_key_scores_matching_pixels() {
        let mut image = RgbImage::from_pixel(8, 8, Rgb([0, 0, 255]));
        image.put_pixel(0, 0, Rgb([255, 0, 0]));
        let mut detector = ColorKeyDetector::new(vec![ColorKey {
            class_id: 2,
            color: [255, 0, 0],
            tolerance: 100.0,
        }]);

        let set = detector.detect(&image).unwrap();
        assert_eq!(set.len(), 1);
        let mask = &set.detections[0].mask;
        assert_eq!(mask.dimensions(), (2, 2));
        assert_eq!(mask.get_pixel(0, 0).0[0], 1.0);
        assert_eq!(mask.get_pixel(1, 1).0[0], 0.0);
        assert_eq!(set.detections[0].class_id, 2);
    }

    #[test]
    fn test_downsample_sets_mask_resolution() {
        let image = RgbImage::from_pixel(9, 6, Rgb([255, 0, 0]));
        let key = ColorKey {
            class_id: 1,
            color: [255, 0, 0],
            tolerance: 10.0,
        };
        let mut full = ColorKeyDetector::new(vec![key.clone()]).with_downsample(1);
        assert_eq!(full.detect(&image).unwrap().detections[0].mask.dimensions(), (9, 6));
        // A zero factor is treated as no downsampling.
        let mut coarse = ColorKeyDetector::new(vec![key]).with_downsample(0);
        assert_eq!(coarse.detect(&image).unwrap().detections[0].mask.dimensions(), (9, 6));
    }

    #[test]
    fn test_color_key_rejects_empty_image() {
        let mut detector = ColorKeyDetector::new(Vec::new());
        assert!(detector.detect(&RgbImage::new(0, 0)).is_err());
    }
}
