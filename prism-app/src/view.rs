//! The display side of the pipeline as seen by the controller.
//!
//! Widgets, layout and the renderer itself live behind these traits; the
//! controller only needs to push frames, flip a few controls and ask the 3D
//! view for its depth buffer.

use crate::display::DisplayMode;
use image::{ImageBuffer, Luma, RgbImage};
use prism_data::{DepthImage, PointCloud, ViewCamera, ViewPreset};

/// Everything the display needs from one produced frame.
#[derive(Debug, Clone)]
pub struct FrameElements {
    pub color: RgbImage,
    pub depth: DepthImage,
    /// World-frame cloud with source colors.
    pub cloud: PointCloud,
    /// Fused labels, one per point, when segmentation is on.
    pub labels: Option<Vec<i32>>,
    pub frame_number: u64,
    pub timestamp: f64,
}

impl FrameElements {
    #[cfg(test)]
    pub(crate) fn empty(frame_number: u64) -> Self {
        Self {
            color: RgbImage::new(1, 1),
            depth: DepthImage::new(1, 1),
            cloud: PointCloud::default(),
            labels: None,
            frame_number,
            timestamp: 0.0,
        }
    }
}

/// Position and size of the 3D view inside the window, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(x: f32, y: f32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Window coordinates to viewport-local coordinates, if inside.
    pub fn to_local(&self, x: f32, y: f32) -> Option<(u32, u32)> {
        let lx = x - self.x;
        let ly = y - self.y;
        if lx >= 0.0 && ly >= 0.0 && lx < self.width as f32 && ly < self.height as f32 {
            Some((lx as u32, ly as u32))
        } else {
            None
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Normalized depth buffer of the 3D view, 1.0 where nothing was drawn.
pub type DepthBuffer = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Completion for an asynchronous depth render. Runs off the UI thread.
pub type DepthCallback = Box<dyn FnOnce(DepthBuffer) + Send>;

/// The 3D view widget.
pub trait RenderSurface {
    fn viewport(&self) -> Viewport;

    /// Install or remove the interactive pick handler. While removed, pointer
    /// events belong to the view's own navigation.
    fn set_pick_handler(&mut self, enabled: bool);

    fn pick_handler_enabled(&self) -> bool;

    /// Current display camera.
    fn view_camera(&self) -> ViewCamera;

    /// Render the depth buffer as seen from `camera` and hand it to
    /// `callback` on a render thread.
    fn request_depth_image(&self, camera: ViewCamera, callback: DepthCallback);
}

/// The application window: frame display plus the controls the controller
/// keeps in sync.
pub trait PipelineView: 'static {
    type Surface: RenderSurface;

    /// Show a new frame.
    fn update(&mut self, frame: FrameElements);

    fn capturing(&self) -> bool;
    fn set_capturing(&mut self, capturing: bool);

    /// Whether interactive editing (picking) is allowed.
    fn edit_mode(&self) -> bool;
    fn set_edit_mode(&mut self, enabled: bool);

    /// Reflect the record state in its control without firing a toggle event.
    fn set_record_toggle(&mut self, on: bool);

    fn set_normals(&mut self, enabled: bool);
    fn display_mode(&self) -> DisplayMode;
    fn set_display_mode(&mut self, mode: DisplayMode);
    fn apply_view_preset(&mut self, preset: ViewPreset);

    /// Text sink for pick results.
    fn set_pick_text(&mut self, text: String);
    fn set_status(&mut self, text: String);

    fn surface(&self) -> &Self::Surface;
    fn surface_mut(&mut self) -> &mut Self::Surface;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_to_local() {
        let viewport = Viewport::new(10.0, 20.0, 100, 50);
        assert_eq!(viewport.to_local(10.0, 20.0), Some((0, 0)));
        assert_eq!(viewport.to_local(109.5, 69.0), Some((99, 49)));
        assert_eq!(viewport.to_local(110.0, 30.0), None);
        assert_eq!(viewport.to_local(5.0, 30.0), None);
    }
}
