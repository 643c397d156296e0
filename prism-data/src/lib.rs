//! Prism Data Crate
//!
//! Frame and geometry types shared by the capture, fusion and app crates.
//! Everything here is plain CPU data plus the pinhole camera math that relates
//! point clouds to images.

pub mod camera;
mod error;
pub mod frame;
pub mod io;
pub mod point_cloud;

pub use camera::{
    FAR_PLANE_DEPTH, Intrinsics, SceneBounds, ViewCamera, ViewPreset, world_to_camera,
};
pub use error::DataError;
pub use frame::{DepthImage, RgbdFrame};
pub use io::{write_ply, write_rgbd};
pub use point_cloud::{DepthConversion, PointCloud};
