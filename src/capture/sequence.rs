use super::CaptureSource;
use crate::error::{check_dimensions, Error, Result};
use image::RgbImage;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

const EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "ppm"];

/// Frames read from the image files of a directory, in file name order
///
/// Stands in for a camera when replaying recorded scenes. Every frame must
/// have the dimensions of the first one.
pub struct ImageSequenceCapture {
    pending: VecDeque<PathBuf>,
    width: u32,
    height: u32,
    next: Option<RgbImage>,
}

impl ImageSequenceCapture {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        tracing::info!("Opening frame directory {}", dir.display());

        let entries = std::fs::read_dir(dir)
            .map_err(|e| Error::DeviceUnavailable(format!("{}: {}", dir.display(), e)))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if is_image {
                files.push(path);
            }
        }
        files.sort();

        let mut pending: VecDeque<PathBuf> = files.into();
        let first = match pending.pop_front() {
            Some(path) => image::open(&path)?.to_rgb8(),
            None => {
                return Err(Error::DeviceUnavailable(format!(
                    "no frames in {}",
                    dir.display()
                )))
            }
        };

        let (width, height) = first.dimensions();
        tracing::info!("Found {} frames at {}x{}", pending.len() + 1, width, height);

        Ok(Self {
            pending,
            width,
            height,
            next: Some(first),
        })
    }
}

impl CaptureSource for ImageSequenceCapture {
    fn capture_frame(&mut self) -> Result<Option<RgbImage>> {
        if let Some(frame) = self.next.take() {
            return Ok(Some(frame));
        }

        let Some(path) = self.pending.pop_front() else {
            return Ok(None);
        };

        let frame = image::open(&path)?.to_rgb8();
        check_dimensions(
            &format!("frame {}", path.display()),
            (self.width, self.height),
            frame.dimensions(),
        )?;
        Ok(Some(frame))
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
