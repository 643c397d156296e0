//! Playback of a recorded RGBD sequence.

use crate::source::{CaptureError, RgbdSource};
use prism_data::{DataError, Intrinsics, RgbdFrame};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Reads `color/*.png` and `depth/*.png` pairs from a directory, in file name
/// order. Depth images are 16-bit.
///
/// This is the layout `prism_data::write_rgbd` produces, so a recording made
/// by the app can be played back directly.
pub struct RecordedSource {
    pairs: Vec<(PathBuf, PathBuf)>,
    intrinsics: Intrinsics,
    frame_rate: f32,
    resolution: (u32, u32),
    cursor: usize,
    frame_count: u64,
    looping: bool,
    active: bool,
}

impl RecordedSource {
    /// Open a recording directory.
    pub fn open(dir: impl AsRef<Path>, intrinsics: Intrinsics) -> Result<Self, CaptureError> {
        let dir = dir.as_ref();
        let color = list_png(&dir.join("color"))?;
        let depth = list_png(&dir.join("depth"))?;

        if color.is_empty() {
            return Err(CaptureError::OpenFailed(format!(
                "no color frames under {}",
                dir.display()
            )));
        }
        if color.len() != depth.len() {
            return Err(CaptureError::OpenFailed(format!(
                "{} color frames but {} depth frames",
                color.len(),
                depth.len()
            )));
        }

        let resolution = image::image_dimensions(&color[0])?;
        info!(
            "Opened recording {} ({} frames, {}x{})",
            dir.display(),
            color.len(),
            resolution.0,
            resolution.1
        );

        Ok(Self {
            pairs: color.into_iter().zip(depth).collect(),
            intrinsics,
            frame_rate: 30.0,
            resolution,
            cursor: 0,
            frame_count: 0,
            looping: false,
            active: true,
        })
    }

    /// Restart from the first frame when the end is reached.
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_frame_rate(mut self, fps: f32) -> Self {
        self.frame_rate = fps;
        self
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

fn list_png(dir: &Path) -> Result<Vec<PathBuf>, CaptureError> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("png")))
        .collect();
    files.sort();
    Ok(files)
}

impl RgbdSource for RecordedSource {
    fn next_frame(&mut self) -> Result<Option<RgbdFrame>, CaptureError> {
        if !self.active {
            return Ok(None);
        }
        if self.cursor >= self.pairs.len() {
            if !self.looping {
                return Ok(None);
            }
            debug!("Recording wrapped after {} frames", self.frame_count);
            self.cursor = 0;
        }

        let (color_path, depth_path) = &self.pairs[self.cursor];
        let color = image::open(color_path)?.into_rgb8();
        let depth = image::open(depth_path)?.into_luma16();
        if color.dimensions() != depth.dimensions() {
            return Err(DataError::ResolutionMismatch {
                color: color.dimensions(),
                depth: depth.dimensions(),
            }
            .into());
        }

        let timestamp = self.frame_count as f64 / self.frame_rate as f64;
        let frame = RgbdFrame::new(color, depth, self.intrinsics, timestamp, self.frame_count);
        self.cursor += 1;
        self.frame_count += 1;
        Ok(Some(frame))
    }

    fn frame_rate(&self) -> Option<f32> {
        Some(self.frame_rate)
    }

    fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    fn intrinsics(&self) -> Intrinsics {
        self.intrinsics
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn stop(&mut self) {
        self.active = false;
        info!("Recording playback stopped after {} frames", self.frame_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SyntheticSource;
    use prism_data::write_rgbd;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("prism-capture-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_plays_back_written_frames_in_order() {
        let dir = scratch_dir("playback");
        let mut synthetic = SyntheticSource::new(32, 24);
        for i in 0..3 {
            let frame = synthetic.next_frame().unwrap().unwrap();
            write_rgbd(&dir, &format!("{i:06}"), &frame).unwrap();
        }

        let mut source = RecordedSource::open(&dir, synthetic.intrinsics()).unwrap();
        assert_eq!(source.len(), 3);
        assert_eq!(source.resolution(), (32, 24));
        for expected in 0..3 {
            let frame = source.next_frame().unwrap().unwrap();
            assert_eq!(frame.frame_number, expected);
            assert_eq!(frame.dimensions(), (32, 24));
        }
        assert!(source.next_frame().unwrap().is_none());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_looping_wraps_around() {
        let dir = scratch_dir("looping");
        let mut synthetic = SyntheticSource::new(8, 8);
        let frame = synthetic.next_frame().unwrap().unwrap();
        write_rgbd(&dir, "000000", &frame).unwrap();

        let mut source = RecordedSource::open(&dir, synthetic.intrinsics())
            .unwrap()
            .with_looping(true);
        for _ in 0..3 {
            assert!(source.next_frame().unwrap().is_some());
        }
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_open_missing_directory_fails() {
        let dir = scratch_dir("missing");
        assert!(RecordedSource::open(&dir, Intrinsics::default()).is_err());
    }
}
