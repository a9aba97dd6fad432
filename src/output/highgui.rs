use super::{DisplaySurface, View};
use crate::cv::rgb_to_bgr_mat;
use crate::error::{Error, Result};
use image::RgbImage;
use opencv::highgui;
use std::time::Duration;

/// OpenCV highgui windows, one per view; destroyed on close or drop
pub struct HighguiDisplay {
    open: bool,
}

impl HighguiDisplay {
    pub fn new() -> Self {
        Self { open: false }
    }
}

impl Default for HighguiDisplay {
    fn default() -> Self {
        Self::new()
    }
}

fn display_error(e: opencv::Error) -> Error {
    Error::Display(e.to_string())
}

impl DisplaySurface for HighguiDisplay {
    fn show(&mut self, view: View, frame: &RgbImage) -> Result<()> {
        let mat = rgb_to_bgr_mat(frame).map_err(display_error)?;
        highgui::imshow(view.title(), &mat).map_err(display_error)?;
        self.open = true;
        Ok(())
    }

    fn poll_key(&mut self, timeout: Duration) -> Result<Option<char>> {
        let millis = timeout.as_millis().clamp(1, i32::MAX as u128) as i32;
        let key = highgui::wait_key(millis).map_err(display_error)?;
        if key < 0 {
            return Ok(None);
        }
        Ok(char::from_u32((key & 0xff) as u32))
    }

    fn close(&mut self) -> Result<()> {
        if self.open {
            highgui::destroy_all_windows().map_err(display_error)?;
            self.open = false;
            tracing::debug!("Display windows destroyed");
        }
        Ok(())
    }
}

impl Drop for HighguiDisplay {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("Failed to close display: {}", e);
        }
    }
}
