mod mog2;
#[cfg(feature = "opencv")]
mod opencv_mog2;
pub mod types;

pub use mog2::{Mog2, Mog2Settings, BACKGROUND, FOREGROUND};
#[cfg(feature = "opencv")]
pub use opencv_mog2::OpencvMog2;
pub use types::{BackgroundSubtractor, Mask};

use crate::error::Result;

/// Create the default background model (OpenCV's MOG2 with stock settings)
#[cfg(feature = "opencv")]
pub fn create_default_model() -> Result<Box<dyn BackgroundSubtractor>> {
    let model = OpencvMog2::new(Mog2Settings::default())?;
    Ok(Box::new(model))
}

/// Create the default background model
///
/// Without the `opencv` feature this is the pure Rust MOG2 port.
#[cfg(not(feature = "opencv"))]
pub fn create_default_model() -> Result<Box<dyn BackgroundSubtractor>> {
    tracing::info!("Built without the `opencv` feature, using the built-in MOG2 model");
    Ok(Box::new(Mog2::new(Mog2Settings::default())))
}
