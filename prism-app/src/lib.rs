//! Prism Application
//!
//! Live RGBD capture pipeline with 2D→3D label fusion.
//!
//! Features:
//! - Recorded or synthetic RGBD sources
//! - Point clouds with optional normals
//! - Segmentation masks fused onto the cloud
//! - Point picking on the 3D view
//! - Saving and recording frames
//!
//! Two long-lived threads: the UI thread runs [`PipelineController`] and the
//! producer thread runs [`PipelineModel`]. They share a [`CaptureControl`] and
//! a bounded frame queue.

pub mod app;
pub mod config;
pub mod console;
pub mod control;
pub mod controller;
pub mod dispatch;
pub mod display;
pub mod errors;
pub mod model;
pub mod pick;
pub mod view;

pub use app::{AppBuilder, SourceConfig};
pub use config::{LoggingConfig, PipelineConfig};
pub use control::{CaptureCommand, CaptureControl, CaptureFlags, GateOutcome, SaveKind, Tick};
pub use controller::{PipelineController, UiEvent};
pub use errors::AppError;
pub use model::{DetectorSlot, ModelSettings, PipelineModel};
