use super::CaptureSource;
use crate::error::{Error, Result};
use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;

/// Webcam frames through nokhwa; the stream is stopped when dropped
pub struct WebcamCapture {
    camera: Camera,
    width: u32,
    height: u32,
}

impl WebcamCapture {
    pub fn new(device_index: u32) -> Result<Self> {
        tracing::info!("Initializing webcam {}", device_index);

        let index = CameraIndex::Index(device_index);
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);

        let mut camera = Camera::new(index, requested)
            .map_err(|e| Error::DeviceUnavailable(format!("camera {}: {}", device_index, e)))?;

        camera
            .open_stream()
            .map_err(|e| {
                Error::DeviceUnavailable(format!("camera {} stream: {}", device_index, e))
            })?;

        let resolution = camera.resolution();
        let (width, height) = (resolution.width(), resolution.height());

        tracing::info!("Webcam initialized at {}x{}", width, height);

        Ok(Self {
            camera,
            width,
            height,
        })
    }
}

impl CaptureSource for WebcamCapture {
    fn capture_frame(&mut self) -> Result<Option<RgbImage>> {
        let frame = match self.camera.frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("No frame from camera: {}", e);
                return Ok(None);
            }
        };

        match frame.decode_image::<RgbFormat>() {
            Ok(decoded) => Ok(Some(decoded)),
            Err(e) => {
                tracing::warn!("Failed to decode camera frame: {}", e);
                Ok(None)
            }
        }
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Drop for WebcamCapture {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            tracing::warn!("Failed to stop camera stream: {}", e);
        } else {
            tracing::debug!("Camera stream stopped");
        }
    }
}
