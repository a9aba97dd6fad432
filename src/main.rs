use anyhow::{Context, Result};
use clap::Parser;
use mogcam::capture::{CaptureSource, ImageSequenceCapture};
use mogcam::output::DisplaySurface;
use mogcam::{run_capture_loop, segmentation, FramePipeline, Variant};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input webcam device index
    #[arg(short, long, default_value_t = 0)]
    input_device: u32,

    /// Read frames from the images in this directory instead of a camera
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Run a single variant instead of cycling through all four
    #[arg(short, long, value_enum)]
    mode: Option<Variant>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("mogcam starting");

    let variants = match args.mode {
        Some(variant) => vec![variant],
        None => Variant::ALL.to_vec(),
    };

    // One model for every run, so later variants start from a learned background
    let model =
        segmentation::create_default_model().context("Failed to create background model")?;
    let mut pipeline = FramePipeline::new(model, variants[0].config());

    for variant in variants {
        tracing::info!("Running variant {:?}", variant);
        pipeline.set_config(variant.config());

        let mut capture = open_capture(&args).context("Failed to open capture source")?;
        let mut display = open_display();

        let summary = run_capture_loop(capture.as_mut(), display.as_mut(), Some(&mut pipeline))
            .with_context(|| format!("Capture loop failed in variant {:?}", variant))?;

        tracing::info!(
            "Variant {:?} finished after {} frames ({:?})",
            variant,
            summary.frames,
            summary.stop
        );
    }

    Ok(())
}

fn open_capture(args: &Args) -> mogcam::Result<Box<dyn CaptureSource>> {
    if let Some(dir) = &args.input_dir {
        return Ok(Box::new(ImageSequenceCapture::new(dir)?));
    }
    open_camera(args.input_device)
}

#[cfg(feature = "camera")]
fn open_camera(device_index: u32) -> mogcam::Result<Box<dyn CaptureSource>> {
    Ok(Box::new(mogcam::capture::WebcamCapture::new(device_index)?))
}

#[cfg(not(feature = "camera"))]
fn open_camera(device_index: u32) -> mogcam::Result<Box<dyn CaptureSource>> {
    Err(mogcam::Error::DeviceUnavailable(format!(
        "camera {} requested but this build has no camera support \
         (enable the `camera` feature or pass --input-dir)",
        device_index
    )))
}

#[cfg(feature = "gui")]
fn open_display() -> Box<dyn DisplaySurface> {
    Box::new(mogcam::output::HighguiDisplay::new())
}

#[cfg(not(feature = "gui"))]
fn open_display() -> Box<dyn DisplaySurface> {
    tracing::info!("Built without the `gui` feature, frames are not displayed");
    Box::new(mogcam::output::HeadlessDisplay::new())
}
