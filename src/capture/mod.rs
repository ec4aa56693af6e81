//! Frame acquisition layer
//!
//! The session controller pulls frames through the [`FrameSource`] trait so
//! that any acquisition backend (camera, video, still image) can feed the
//! detection pipeline. The shipped implementation replays a still image.

pub mod frame;

pub use frame::Frame;

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::error::CycleError;

/// Source of frames for the scan session
pub trait FrameSource {
    /// Return the most recent frame.
    ///
    /// A source that has no usable frame yet reports
    /// [`CycleError::SourceNotReady`]; the current cycle is skipped without
    /// tearing down the session.
    fn latest_frame(&mut self) -> Result<Frame, CycleError>;
}

/// Frame source backed by a single image file, replayed on every request
pub struct StillImageSource {
    frame: Frame,
}

impl StillImageSource {
    /// Load an image file and wrap it as a frame source
    pub fn open(path: &Path) -> Result<Self> {
        let image = image::open(path)
            .with_context(|| format!("failed to open input image {}", path.display()))?;
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        info!(width, height, path = %path.display(), "input image loaded");
        Ok(Self {
            frame: Frame::new(rgba.into_raw(), width, height),
        })
    }
}

impl FrameSource for StillImageSource {
    fn latest_frame(&mut self) -> Result<Frame, CycleError> {
        if self.frame.is_empty() {
            return Err(CycleError::SourceNotReady);
        }
        Ok(self.frame.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_file_fails() {
        let result = StillImageSource::open(Path::new("/nonexistent/input.png"));
        assert!(result.is_err());
    }

    #[test]
    fn test_still_source_replays_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.png");
        image::RgbaImage::from_pixel(8, 4, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let mut source = StillImageSource::open(&path).unwrap();
        let first = source.latest_frame().unwrap();
        let second = source.latest_frame().unwrap();
        assert_eq!(first.dimensions(), (8, 4));
        assert_eq!(first.dimensions(), second.dimensions());
        assert_eq!(first.data, second.data);
    }
}
