//! Headless front end: a console view, a software depth renderer for picks
//! and a line-based command reader on stdin.

use crate::controller::UiEvent;
use crate::display::{DisplayMode, point_colors};
use crate::pick::PointerEvent;
use crate::view::{DepthBuffer, DepthCallback, FrameElements, PipelineView, RenderSurface, Viewport};
use glam::{Vec2, Vec3};
use image::Luma;
use prism_data::{FAR_PLANE_DEPTH, SceneBounds, ViewCamera, ViewPreset};
use std::io::{self, BufRead};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Vertical field of view of the display camera.
const VIEW_FOV_Y: f32 = std::f32::consts::FRAC_PI_3;

/// Render the nearest depth per pixel of `points` as seen by `camera`.
///
/// Each point covers a `(2 * splat + 1)` pixel square. Uncovered pixels hold
/// the far-plane depth.
pub fn render_depth(
    points: &[Vec3],
    camera: &ViewCamera,
    (width, height): (u32, u32),
    splat: u32,
) -> DepthBuffer {
    let mut depth = DepthBuffer::from_pixel(width, height, Luma([FAR_PLANE_DEPTH]));
    let splat = splat as i64;

    for point in points {
        let Some(screen) = camera.project(*point, width, height) else {
            continue;
        };
        let (cx, cy) = (screen.x.floor() as i64, screen.y.floor() as i64);
        for y in (cy - splat)..=(cy + splat) {
            for x in (cx - splat)..=(cx + splat) {
                if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
                    continue;
                }
                let pixel = depth.get_pixel_mut(x as u32, y as u32);
                if screen.z < pixel.0[0] {
                    pixel.0[0] = screen.z;
                }
            }
        }
    }
    depth
}

/// CPU stand-in for the 3D view.
pub struct SoftwareSurface {
    viewport: Viewport,
    pick_handler: bool,
    camera: ViewCamera,
    preset: ViewPreset,
    points: Arc<Vec<Vec3>>,
    colors: Vec<Vec3>,
    framed: bool,
    splat: u32,
}

impl SoftwareSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            viewport: Viewport::new(0.0, 0.0, width, height),
            pick_handler: true,
            camera: ViewCamera::default(),
            preset: ViewPreset::Camera,
            points: Arc::new(Vec::new()),
            colors: Vec::new(),
            framed: false,
            splat: 1,
        }
    }

    /// Replace the displayed cloud. The camera frames the first cloud it sees.
    pub fn set_cloud(&mut self, points: Vec<Vec3>, colors: Vec<Vec3>) {
        self.points = Arc::new(points);
        self.colors = colors;
        if !self.framed && !self.points.is_empty() {
            self.apply_preset(self.preset);
            self.framed = true;
        }
    }

    pub fn apply_preset(&mut self, preset: ViewPreset) {
        let bounds = SceneBounds::from_positions(self.points.iter().copied());
        self.preset = preset;
        self.camera = ViewCamera::preset(preset, &bounds, VIEW_FOV_Y, self.viewport.aspect());
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn colors(&self) -> &[Vec3] {
        &self.colors
    }
}

impl RenderSurface for SoftwareSurface {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn set_pick_handler(&mut self, enabled: bool) {
        self.pick_handler = enabled;
    }

    fn pick_handler_enabled(&self) -> bool {
        self.pick_handler
    }

    fn view_camera(&self) -> ViewCamera {
        self.camera
    }

    fn request_depth_image(&self, camera: ViewCamera, callback: DepthCallback) {
        let points = Arc::clone(&self.points);
        let size = (self.viewport.width, self.viewport.height);
        let splat = self.splat;
        let spawned = thread::Builder::new()
            .name("depth-render".to_string())
            .spawn(move || callback(render_depth(&points, &camera, size, splat)));
        if let Err(e) = spawned {
            warn!("Could not start depth render: {}", e);
        }
    }
}

/// Frames per second over a sliding window.
struct FpsCounter {
    window_start: Instant,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            window_start: Instant::now(),
            frames: 0,
            fps: 0.0,
        }
    }

    /// Count a frame. Returns the new rate once per window.
    fn tick(&mut self) -> Option<f32> {
        self.frames += 1;
        let elapsed = self.window_start.elapsed();
        if elapsed < Duration::from_secs(2) {
            return None;
        }
        self.fps = self.frames as f32 / elapsed.as_secs_f32();
        self.frames = 0;
        self.window_start = Instant::now();
        Some(self.fps)
    }
}

/// A [`PipelineView`] that logs instead of drawing.
pub struct ConsoleView {
    surface: SoftwareSurface,
    capturing: bool,
    edit_mode: bool,
    record: bool,
    normals: bool,
    display_mode: DisplayMode,
    pick_text: String,
    status: String,
    fps: FpsCounter,
    frames_shown: u64,
}

impl ConsoleView {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            surface: SoftwareSurface::new(width, height),
            capturing: false,
            edit_mode: true,
            record: false,
            normals: false,
            display_mode: DisplayMode::default(),
            pick_text: String::new(),
            status: String::new(),
            fps: FpsCounter::new(),
            frames_shown: 0,
        }
    }

    pub fn pick_text(&self) -> &str {
        &self.pick_text
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn frames_shown(&self) -> u64 {
        self.frames_shown
    }
}

impl PipelineView for ConsoleView {
    type Surface = SoftwareSurface;

    fn update(&mut self, frame: FrameElements) {
        let colors = point_colors(&frame, self.display_mode);
        let labeled = frame
            .labels
            .as_ref()
            .map(|labels| labels.iter().filter(|l| **l >= 0).count());
        debug!(
            "Showing frame {} ({} points, {:?} labeled)",
            frame.frame_number,
            frame.cloud.len(),
            labeled
        );
        if let Some(fps) = self.fps.tick() {
            info!(
                "Frame {}: {} points, {:.1} fps",
                frame.frame_number,
                frame.cloud.len(),
                fps
            );
        }
        self.surface.set_cloud(frame.cloud.positions, colors);
        self.frames_shown += 1;
    }

    fn capturing(&self) -> bool {
        self.capturing
    }

    fn set_capturing(&mut self, capturing: bool) {
        self.capturing = capturing;
    }

    fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    fn set_edit_mode(&mut self, enabled: bool) {
        self.edit_mode = enabled;
        info!("Edit mode {}", if enabled { "on" } else { "off" });
    }

    fn set_record_toggle(&mut self, on: bool) {
        self.record = on;
    }

    fn set_normals(&mut self, enabled: bool) {
        self.normals = enabled;
        // Normals are only worth showing once they are computed.
        if enabled && self.display_mode == DisplayMode::Colors {
            self.display_mode = DisplayMode::Normals;
        } else if !enabled && self.display_mode == DisplayMode::Normals {
            self.display_mode = DisplayMode::Colors;
        }
    }

    fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    fn set_display_mode(&mut self, mode: DisplayMode) {
        info!("Display mode: {}", mode);
        self.display_mode = mode;
    }

    fn apply_view_preset(&mut self, preset: ViewPreset) {
        self.surface.apply_preset(preset);
    }

    fn set_pick_text(&mut self, text: String) {
        info!("{}", text);
        self.pick_text = text;
    }

    fn set_status(&mut self, text: String) {
        info!("{}", text);
        self.status = text;
    }

    fn surface(&self) -> &SoftwareSurface {
        &self.surface
    }

    fn surface_mut(&mut self) -> &mut SoftwareSurface {
        &mut self.surface
    }
}

pub const COMMAND_HELP: &str = "\
commands:
  capture on|off     start or stop capture
  record on|off      record frames while capturing
  save pcd|rgbd      save the next frame
  normals on|off     estimate normals
  seg on|off         run segmentation and label fusion
  edit on|off        allow picking
  mode colors|seg|normals|next
  view camera|birdseye
  pick X Y           pick the point under viewport pixel (X, Y)
  quit";

fn parse_switch(word: Option<&str>) -> Result<bool, String> {
    match word {
        Some("on") | Some("1") | Some("true") => Ok(true),
        Some("off") | Some("0") | Some("false") => Ok(false),
        Some(other) => Err(format!("expected on/off, got '{other}'")),
        None => Err("expected on/off".to_string()),
    }
}

/// Parse one console command line.
pub fn parse_command(line: &str) -> Result<UiEvent, String> {
    let mut words = line.split_whitespace();
    let command = words.next().ok_or_else(|| "empty command".to_string())?;

    let event = match command.to_ascii_lowercase().as_str() {
        "capture" => UiEvent::ToggleCapture(parse_switch(words.next())?),
        "start" => UiEvent::ToggleCapture(true),
        "stop" => UiEvent::ToggleCapture(false),
        "record" => UiEvent::ToggleRecord(parse_switch(words.next())?),
        "save" => match words.next() {
            Some("pcd") => UiEvent::SavePointCloud,
            Some("rgbd") => UiEvent::SaveRgbd,
            _ => return Err("usage: save pcd|rgbd".to_string()),
        },
        "normals" => UiEvent::ToggleNormals(parse_switch(words.next())?),
        "seg" => UiEvent::ToggleModelInit(parse_switch(words.next())?),
        "edit" => UiEvent::SetEditMode(parse_switch(words.next())?),
        "mode" => {
            match words.next() {
                Some("next") => UiEvent::CycleDisplayMode,
                Some(mode) => UiEvent::SetDisplayMode(mode.parse()?),
                None => return Err("usage: mode colors|seg|normals|next".to_string()),
            }
        }
        "view" => match words.next() {
            Some("camera") => UiEvent::ViewPreset(ViewPreset::Camera),
            Some("birdseye") | Some("top") => UiEvent::ViewPreset(ViewPreset::BirdsEye),
            _ => return Err("usage: view camera|birdseye".to_string()),
        },
        "pick" => {
            let mut coord = || -> Result<f32, String> {
                words
                    .next()
                    .ok_or_else(|| "usage: pick X Y".to_string())?
                    .parse::<f32>()
                    .map_err(|e| format!("bad coordinate: {e}"))
            };
            let x = coord()?;
            let y = coord()?;
            UiEvent::Pointer(PointerEvent::pick_click(Vec2::new(x, y)))
        }
        "quit" | "exit" | "q" => UiEvent::Close,
        other => return Err(format!("unknown command '{other}'")),
    };
    Ok(event)
}

/// Read commands from stdin until EOF or `quit`. EOF closes the window.
pub fn spawn_stdin_reader(events: Sender<UiEvent>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("console-input".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "help" {
                    info!("\n{}", COMMAND_HELP);
                    continue;
                }
                match parse_command(line) {
                    Ok(event) => {
                        let closing = event == UiEvent::Close;
                        if events.send(event).is_err() || closing {
                            return;
                        }
                    }
                    Err(e) => warn!("{} (type 'help')", e),
                }
            }
            let _ = events.send(UiEvent::Close);
        })
}
