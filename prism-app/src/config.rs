//! Pipeline and logging configuration.

use crate::errors::AppError;
use prism_data::{DepthConversion, Intrinsics};
use prism_fusion::ColorKey;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Settings for one pipeline run, usually loaded from a JSON file.
///
/// Every field is optional in the file; missing fields take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Intrinsics of a recorded sequence. Synthetic sources bring their own.
    pub intrinsics: Option<Intrinsics>,
    /// Resolution of the synthetic source.
    pub width: u32,
    pub height: u32,
    pub depth: DepthConversion,
    /// Playback rate for recordings; `None` keeps the source rate.
    pub fps: Option<f32>,
    /// Where saves and recordings go.
    pub output_dir: PathBuf,
    /// Classes for the color key detector.
    pub color_keys: Vec<ColorKey>,
    /// Detector masks are this many times coarser than the image.
    pub mask_downsample: u32,
    /// Frames allowed to queue up for the UI before new ones are dropped.
    pub frame_queue: usize,
    /// UI redraw period in milliseconds.
    pub ui_tick_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            intrinsics: None,
            width: 640,
            height: 480,
            depth: DepthConversion::default(),
            fps: None,
            output_dir: PathBuf::from("output"),
            color_keys: vec![
                ColorKey {
                    class_id: 1,
                    color: [200, 40, 40],
                    tolerance: 60.0,
                },
                ColorKey {
                    class_id: 2,
                    color: [60, 90, 160],
                    tolerance: 60.0,
                },
            ],
            mask_downsample: 4,
            frame_queue: crate::dispatch::MAX_QUEUED_FRAMES,
            ui_tick_ms: 16,
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config file.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json(&text).map_err(|source| AppError::Config {
            path: path.display().to_string(),
            source,
        })?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Logging configuration.
pub struct LoggingConfig {
    pub level: String,
    pub enable_tracy: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            enable_tracy: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_gives_defaults() {
        let config = PipelineConfig::from_json("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_partial_json_overrides_fields() {
        let config = PipelineConfig::from_json(
            r#"{
                "intrinsics": { "fx": 500.0, "fy": 500.0, "cx": 320.0, "cy": 240.0 },
                "depth": { "depth_max": 1.5 },
                "output_dir": "/tmp/prism",
                "mask_downsample": 2
            }"#,
        )
        .unwrap();
        assert_eq!(config.intrinsics, Some(Intrinsics::new(500.0, 500.0, 320.0, 240.0)));
        assert_eq!(config.depth.depth_max, 1.5);
        assert_eq!(config.depth.depth_scale, 1000.0);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/prism"));
        assert_eq!(config.mask_downsample, 2);
        assert_eq!(config.width, 640);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(PipelineConfig::from_json("{ \"width\": \"wide\" }").is_err());
    }
}
