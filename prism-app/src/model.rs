//! The producer: reads frames, builds point clouds, fuses labels and saves.
//!
//! [`PipelineModel::run`] is the body of the producer thread. It owns the
//! capture source and only talks to the rest of the app through the shared
//! [`CaptureControl`], the [`DetectorSlot`] and the frame queue.

use crate::control::{CaptureCommand, CaptureControl, GateOutcome, Tick};
use crate::dispatch::FramePoster;
use crate::errors::AppError;
use crate::view::FrameElements;
use prism_capture::RgbdSource;
use prism_data::{DepthConversion, PointCloud, RgbdFrame, write_ply, write_rgbd};
use prism_fusion::{DetectionSet, Detector, FusionError, fuse_labels};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Builds a fresh detector.
pub type DetectorFactory = dyn Fn() -> Result<Box<dyn Detector>, FusionError> + Send + Sync;

/// The segmentation model shared between the UI thread, which (re)initializes
/// it, and the producer, which runs it.
#[derive(Clone)]
pub struct DetectorSlot {
    detector: Arc<Mutex<Option<Box<dyn Detector>>>>,
    factory: Arc<DetectorFactory>,
}

impl DetectorSlot {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Box<dyn Detector>, FusionError> + Send + Sync + 'static,
    {
        Self {
            detector: Arc::new(Mutex::new(None)),
            factory: Arc::new(factory),
        }
    }

    /// Build a new detector and swap it in. Blocks until done.
    pub fn initialize(&self) -> Result<(), FusionError> {
        let detector = (self.factory)()?;
        info!("Detector '{}' initialized", detector.name());
        *self.detector.lock().unwrap_or_else(PoisonError::into_inner) = Some(detector);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.detector
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn detect(&self, image: &image::RgbImage) -> Result<DetectionSet, FusionError> {
        let mut guard = self.detector.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_mut() {
            Some(detector) => detector.detect(image),
            None => Err(FusionError::NotInitialized),
        }
    }
}

/// Producer settings.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub conversion: DepthConversion,
    pub output_dir: PathBuf,
    /// Sleep to hold the source frame rate.
    pub pace: bool,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            conversion: DepthConversion::default(),
            output_dir: PathBuf::from("output"),
            pace: true,
        }
    }
}

/// Producer loop state.
pub struct PipelineModel<S: RgbdSource> {
    source: S,
    control: Arc<CaptureControl>,
    detector: DetectorSlot,
    frames: FramePoster,
    settings: ModelSettings,
    recorded: u64,
}

impl<S: RgbdSource> PipelineModel<S> {
    pub fn new(
        source: S,
        control: Arc<CaptureControl>,
        detector: DetectorSlot,
        frames: FramePoster,
        settings: ModelSettings,
    ) -> Self {
        Self {
            source,
            control,
            detector,
            frames,
            settings,
            recorded: 0,
        }
    }

    /// Run until exit is requested. Parks on the capture gate whenever capture
    /// is disabled, and disables capture itself when the source runs dry.
    pub fn run(mut self) -> Result<(), AppError> {
        let (width, height) = self.source.resolution();
        info!("Producer started ({}x{})", width, height);
        let period = self
            .source
            .frame_rate()
            .filter(|fps| *fps > 0.0)
            .map(|fps| Duration::from_secs_f32(1.0 / fps));

        loop {
            if self.control.wait_for_capture() == GateOutcome::Exit {
                break;
            }
            let started = Instant::now();

            if !self.source.is_active() {
                info!("Source stopped; pausing capture");
                self.control.apply(CaptureCommand::Stop);
                continue;
            }
            let Some(frame) = self.source.next_frame()? else {
                info!("Source exhausted; pausing capture");
                self.control.apply(CaptureCommand::Stop);
                continue;
            };
            let Some(tick) = self.control.begin_tick() else {
                break;
            };

            let elements = self.process(frame, &tick);

            // Exit may have been requested while this frame was processed.
            let frames = &mut self.frames;
            if self
                .control
                .unless_exit(|| frames.deliver_frame(elements))
                .is_none()
            {
                break;
            }

            if let (true, Some(period)) = (self.settings.pace, period) {
                if let Some(rest) = period.checked_sub(started.elapsed()) {
                    thread::sleep(rest);
                }
            }
        }

        self.source.stop();
        info!("Producer stopped ({} frames dropped by UI)", self.frames.dropped());
        Ok(())
    }

    fn process(&mut self, frame: RgbdFrame, tick: &Tick) -> FrameElements {
        let cloud = PointCloud::from_rgbd(&frame, &self.settings.conversion, tick.normals);

        let labels = if tick.model_init {
            match self.detector.detect(&frame.color) {
                Ok(detections) => Some(fuse_labels(
                    &frame.intrinsics,
                    &frame.extrinsic,
                    &cloud.positions,
                    &detections,
                    frame.dimensions(),
                )),
                Err(e) => {
                    warn!("Segmentation skipped for frame {}: {}", frame.frame_number, e);
                    None
                }
            }
        } else {
            None
        };

        if tick.save_pcd {
            let status = self.save_point_cloud(&frame, &cloud);
            self.frames.post_status(status);
        }
        if tick.save_rgbd {
            let status = self.save_rgbd(&frame);
            self.frames.post_status(status);
        }
        if tick.record {
            self.record(&frame);
        }

        debug!(
            "Frame {}: {} points{}",
            frame.frame_number,
            cloud.len(),
            if labels.is_some() { ", labeled" } else { "" }
        );

        FrameElements {
            color: frame.color,
            depth: frame.depth,
            cloud,
            labels,
            frame_number: frame.frame_number,
            timestamp: frame.timestamp,
        }
    }

    fn save_point_cloud(&self, frame: &RgbdFrame, cloud: &PointCloud) -> String {
        let path = self
            .settings
            .output_dir
            .join("pcd")
            .join(format!("frame_{:06}.ply", frame.frame_number));
        match write_ply(&path, cloud) {
            Ok(()) => format!("Saved point cloud to {}", path.display()),
            Err(e) => {
                warn!("Saving point cloud failed: {}", e);
                format!("Saving point cloud failed: {e}")
            }
        }
    }

    fn save_rgbd(&self, frame: &RgbdFrame) -> String {
        let dir = self.settings.output_dir.join("rgbd");
        let stem = format!("frame_{:06}", frame.frame_number);
        match write_rgbd(&dir, &stem, frame) {
            Ok((color, _)) => format!("Saved RGBD frame {}", color.display()),
            Err(e) => {
                warn!("Saving RGBD frame failed: {}", e);
                format!("Saving RGBD frame failed: {e}")
            }
        }
    }

    fn record(&mut self, frame: &RgbdFrame) {
        let dir = self.settings.output_dir.join("recording");
        let stem = format!("{:06}", self.recorded);
        match write_rgbd(&dir, &stem, frame) {
            Ok(_) => self.recorded += 1,
            Err(e) => warn!("Recording frame {} failed: {}", frame.frame_number, e),
        }
    }
}
