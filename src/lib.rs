//! Live foreground extraction from a camera stream.
//!
//! A MOG2 background model classifies each frame, an elliptical opening cleans
//! the mask, and the compositor renders either the foreground pixels or
//! outlines/boxes around large moving regions.

pub mod capture;
#[cfg(feature = "opencv")]
mod cv;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod postprocess;
pub mod runner;
pub mod segmentation;

pub use error::{Error, Result};
pub use pipeline::{FramePipeline, PipelineConfig, Variant};
pub use runner::{run_capture_loop, LoopSummary, StopReason};
