use crate::error::Result;
use image::{GrayImage, RgbImage};

/// Foreground mask: 0 = background, any non-zero value = foreground
/// Dimensions match the input frame dimensions
pub type Mask = GrayImage;

/// Trait for background subtraction models
/// Allows swapping the statistical model behind a pipeline (MOG2, test doubles, ...)
pub trait BackgroundSubtractor {
    /// Classify a frame against the learned background and fold it into the model
    ///
    /// # Arguments
    /// * `frame` - Input RGB frame, same dimensions on every call
    ///
    /// # Returns
    /// * Foreground mask with the frame's dimensions
    fn apply(&mut self, frame: &RgbImage) -> Result<Mask>;

    /// Current estimate of the background scene, if any frame has been seen
    fn background_image(&self) -> Option<RgbImage> {
        None
    }

    /// Frame dimensions the model is locked to
    ///
    /// Returns (width, height), or None before the first frame
    fn frame_size(&self) -> Option<(u32, u32)>;
}
