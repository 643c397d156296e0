//! Writers for saved point clouds and RGBD pairs.

use crate::error::DataError;
use crate::frame::RgbdFrame;
use crate::point_cloud::PointCloud;
use std::fs::{self, File};
use serde::{Deserialize, Serialize};
use serde_ply::SerializeOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// One vertex row. Normals and colors are written only when the cloud has them.
#[derive(Serialize, Deserialize, Debug)]
struct PlyPoint {
    x: f32,
    y: f32,
    z: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nx: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ny: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nz: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    red: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    green: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    blue: Option<u8>,
}

#[derive(Serialize, Deserialize, Debug)]
struct PlyFile {
    vertex: Vec<PlyPoint>,
}

fn to_u8(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Write an ASCII PLY with positions and, when present, colors and normals.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn write_ply(path: &Path, cloud: &PointCloud) -> Result<(), DataError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let vertex = cloud
        .positions
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let n = cloud.normals.as_ref().map(|normals| normals[i]);
            let c = cloud.colors.as_ref().map(|colors| colors[i]);
            PlyPoint {
                x: p.x,
                y: p.y,
                z: p.z,
                nx: n.map(|n| n.x),
                ny: n.map(|n| n.y),
                nz: n.map(|n| n.z),
                red: c.map(|c| to_u8(c.x)),
                green: c.map(|c| to_u8(c.y)),
                blue: c.map(|c| to_u8(c.z)),
            }
        })
        .collect();

    let mut out = BufWriter::new(File::create(path)?);
    serde_ply::to_writer(&PlyFile { vertex }, SerializeOptions::ascii(), &mut out)?;
    out.flush()?;

    info!("Saved point cloud with {} points", cloud.len());
    Ok(())
}

/// Write `color/<stem>.png` and a 16-bit `depth/<stem>.png` under `dir`.
///
/// This is the same layout `RecordedSource` reads back. Returns the two paths.
pub fn write_rgbd(dir: &Path, stem: &str, frame: &RgbdFrame) -> Result<(PathBuf, PathBuf), DataError> {
    let color_dir = dir.join("color");
    let depth_dir = dir.join("depth");
    fs::create_dir_all(&color_dir)?;
    fs::create_dir_all(&depth_dir)?;

    let color_path = color_dir.join(format!("{stem}.png"));
    let depth_path = depth_dir.join(format!("{stem}.png"));
    frame.color.save(&color_path)?;
    frame.depth.save(&depth_path)?;

    info!(
        "Saved RGBD pair {} / {}",
        color_path.display(),
        depth_path.display()
    );
    Ok((color_path, depth_path))
}
