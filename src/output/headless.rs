use super::{DisplaySurface, View};
use crate::error::Result;
use image::RgbImage;
use std::time::Duration;

/// Display that only logs what it is given; never asks the loop to stop
#[derive(Debug, Default)]
pub struct HeadlessDisplay {
    shown: u64,
}

impl HeadlessDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames shown so far across all views
    pub fn shown(&self) -> u64 {
        self.shown
    }
}

impl DisplaySurface for HeadlessDisplay {
    fn show(&mut self, view: View, frame: &RgbImage) -> Result<()> {
        self.shown += 1;
        tracing::trace!("{}: {}x{}", view.title(), frame.width(), frame.height());
        Ok(())
    }

    fn poll_key(&mut self, _timeout: Duration) -> Result<Option<char>> {
        Ok(None)
    }

    fn close(&mut self) -> Result<()> {
        tracing::debug!("Headless display closed after {} frames", self.shown);
        Ok(())
    }
}
