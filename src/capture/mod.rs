mod sequence;
#[cfg(feature = "camera")]
mod webcam;

pub use sequence::ImageSequenceCapture;
#[cfg(feature = "camera")]
pub use webcam::WebcamCapture;

use crate::error::Result;
use image::RgbImage;

/// Trait for frame sources
pub trait CaptureSource {
    /// Capture a single frame
    ///
    /// Returns `Ok(None)` once the source has nothing more to give; callers
    /// treat that as the end of the stream and do not retry.
    fn capture_frame(&mut self) -> Result<Option<RgbImage>>;

    /// Get the resolution of captured frames
    fn resolution(&self) -> (u32, u32);
}
