//! Instance masks produced by a detector.

use image::{ImageBuffer, Luma};

/// Per-pixel soft confidence field for one instance.
pub type ScoreMap = ImageBuffer<Luma<f32>, Vec<f32>>;

/// One detected instance: a soft mask and its class id.
#[derive(Debug, Clone)]
pub struct Detection {
    pub mask: ScoreMap,
    pub class_id: i32,
}

impl Detection {
    pub fn new(mask: ScoreMap, class_id: i32) -> Self {
        Self { mask, class_id }
    }

    /// A mask with the same score everywhere.
    pub fn uniform(width: u32, height: u32, score: f32, class_id: i32) -> Self {
        Self::new(ScoreMap::from_pixel(width, height, Luma([score])), class_id)
    }
}

/// All instances found in one frame. Masks may be at a lower resolution than
/// the frame; see [`resize_bilinear`].
#[derive(Debug, Clone, Default)]
pub struct DetectionSet {
    pub detections: Vec<Detection>,
}

impl DetectionSet {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}

/// Bilinear resize with half-pixel centers (`align_corners = false`).
///
/// Source coordinates below zero clamp to the first row/column and the
/// interpolation never reads past the last one, so borders replicate. An
/// empty source resizes to an all-zero map.
pub fn resize_bilinear(src: &ScoreMap, width: u32, height: u32) -> ScoreMap {
    let (src_w, src_h) = src.dimensions();
    if (src_w, src_h) == (width, height) {
        return src.clone();
    }
    if src_w == 0 || src_h == 0 {
        return ScoreMap::new(width, height);
    }

    let scale_x = src_w as f32 / width as f32;
    let scale_y = src_h as f32 / height as f32;
    let xs: Vec<(u32, u32, f32)> = (0..width).map(|x| taps(x, scale_x, src_w)).collect();
    let ys: Vec<(u32, u32, f32)> = (0..height).map(|y| taps(y, scale_y, src_h)).collect();

    let at = |x: u32, y: u32| src.get_pixel(x, y).0[0];
    ScoreMap::from_fn(width, height, |x, y| {
        let (x0, x1, lx) = xs[x as usize];
        let (y0, y1, ly) = ys[y as usize];
        let top = at(x0, y0) * (1.0 - lx) + at(x1, y0) * lx;
        let bottom = at(x0, y1) * (1.0 - lx) + at(x1, y1) * lx;
        Luma([top * (1.0 - ly) + bottom * ly])
    })
}

/// The two source taps and the weight of the second for one output index.
fn taps(dst: u32, scale: f32, src_len: u32) -> (u32, u32, f32) {
    let pos = ((dst as f32 + 0.5) * scale - 0.5).max(0.0);
    let i0 = (pos.floor() as u32).min(src_len - 1);
    let i1 = (i0 + 1).min(src_len - 1);
    (i0, i1, pos - i0 as f32)
}
