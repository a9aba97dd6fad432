mod headless;
#[cfg(feature = "gui")]
mod highgui;

pub use headless::HeadlessDisplay;
#[cfg(feature = "gui")]
pub use highgui::HighguiDisplay;

use crate::error::Result;
use image::RgbImage;
use std::time::Duration;

/// Named output channels of the capture loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Raw,
    Processed,
}

impl View {
    pub fn title(self) -> &'static str {
        match self {
            View::Raw => "Camera View",
            View::Processed => "Processed Image",
        }
    }
}

/// Trait for display destinations
pub trait DisplaySurface {
    /// Show a frame on one of the output channels
    fn show(&mut self, view: View, frame: &RgbImage) -> Result<()>;

    /// Wait up to `timeout` for a key press
    fn poll_key(&mut self, timeout: Duration) -> Result<Option<char>>;

    /// Tear down every window; safe to call more than once
    fn close(&mut self) -> Result<()>;
}
