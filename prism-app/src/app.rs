//! Application setup with builder pattern.

use crate::config::{LoggingConfig, PipelineConfig};
use crate::console::{ConsoleView, spawn_stdin_reader};
use crate::controller::PipelineController;
use crate::control::CaptureControl;
use crate::dispatch::frame_channel;
use crate::errors::AppError;
use crate::model::{DetectorSlot, ModelSettings, PipelineModel};
use prism_capture::{RecordedSource, RgbdSource, SyntheticSource};
use prism_fusion::{ColorKeyDetector, Detector};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;
use tracing::info;

/// Where frames come from.
#[derive(Debug, Clone)]
pub enum SourceConfig {
    /// A directory with `color/` and `depth/` PNG pairs.
    Recording { dir: PathBuf, looping: bool },
    /// The built-in moving-box scene.
    Synthetic,
}

/// Builder for configuring and running the pipeline.
pub struct AppBuilder {
    config: PipelineConfig,
    source: SourceConfig,
    logging: LoggingConfig,
    start_capturing: bool,
}

impl AppBuilder {
    /// Create a new AppBuilder with default settings.
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            source: SourceConfig::Synthetic,
            logging: LoggingConfig::default(),
            start_capturing: false,
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_source(mut self, source: SourceConfig) -> Self {
        self.source = source;
        self
    }

    /// Override the output directory for saves and recordings.
    pub fn with_output_dir(mut self, dir: PathBuf) -> Self {
        self.config.output_dir = dir;
        self
    }

    /// Start capturing right away instead of waiting for a command.
    pub fn with_capture_on_start(mut self, enabled: bool) -> Self {
        self.start_capturing = enabled;
        self
    }

    /// Configure logging.
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging = config;
        self
    }

    /// Run the pipeline until the console closes.
    pub fn run(self) -> Result<(), AppError> {
        self.init_logging();

        let source = self.open_source()?;
        let (width, height) = source.resolution();
        info!(
            "Source ready: {}x{} at {:?} fps",
            width,
            height,
            source.frame_rate()
        );

        let color_keys = self.config.color_keys.clone();
        let downsample = self.config.mask_downsample;
        let detector = DetectorSlot::new(move || {
            let detector = ColorKeyDetector::new(color_keys.clone()).with_downsample(downsample);
            Ok(Box::new(detector) as Box<dyn Detector>)
        });
        let control = Arc::new(CaptureControl::new());
        let (poster, frames) = frame_channel(self.config.frame_queue);

        let model = PipelineModel::new(
            source,
            control.clone(),
            detector.clone(),
            poster,
            ModelSettings {
                conversion: self.config.depth,
                output_dir: self.config.output_dir.clone(),
                pace: true,
            },
        );

        let mut controller =
            PipelineController::new(ConsoleView::new(width, height), control, detector)
                .with_ui_tick(Duration::from_millis(self.config.ui_tick_ms));
        if self.start_capturing {
            controller.on_toggle_capture(true);
        }

        let (events, event_rx) = mpsc::channel();
        // The reader blocks on stdin; it is not joined.
        spawn_stdin_reader(events)?;
        info!("Type 'help' for commands");

        controller.start(model, frames, event_rx)
    }

    fn open_source(&self) -> Result<Box<dyn RgbdSource>, AppError> {
        let source: Box<dyn RgbdSource> = match &self.source {
            SourceConfig::Recording { dir, looping } => {
                let intrinsics = self.config.intrinsics.unwrap_or_default();
                let mut recorded = RecordedSource::open(dir, intrinsics)?.with_looping(*looping);
                if let Some(fps) = self.config.fps {
                    recorded = recorded.with_frame_rate(fps);
                }
                info!("Playing {} frames from {}", recorded.len(), dir.display());
                Box::new(recorded)
            }
            SourceConfig::Synthetic => {
                Box::new(SyntheticSource::new(self.config.width, self.config.height))
            }
        };
        Ok(source)
    }

    fn init_logging(&self) {
        #[cfg(feature = "tracy")]
        {
            if self.logging.enable_tracy {
                use tracing_subscriber::Layer;
                use tracing_subscriber::layer::SubscriberExt;
                use tracing_subscriber::util::SubscriberInitExt;
                tracing_subscriber::registry()
                    .with(tracing_tracy::TracyLayer::default())
                    .with(
                        tracing_subscriber::fmt::layer().with_filter(
                            tracing_subscriber::EnvFilter::try_from_default_env()
                                .unwrap_or_else(|_| self.logging.level.clone().into()),
                        ),
                    )
                    .init();
                return;
            }
        }

        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&self.logging.level)),
            )
            .with_target(false)
            .init();
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}
