use crate::capture::CaptureSource;
use crate::error::Result;
use crate::output::{DisplaySurface, View};
use crate::pipeline::FramePipeline;
use std::time::{Duration, Instant};

/// Key that ends the loop
pub const QUIT_KEY: char = 'q';
/// How long each iteration waits for a key
pub const KEY_WAIT: Duration = Duration::from_millis(1);

const STATS_INTERVAL: u64 = 30;

/// Why the capture loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The capture source ran dry
    EndOfStream,
    /// The quit key was pressed
    UserQuit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSummary {
    pub frames: u64,
    pub stop: StopReason,
}

/// Show frames from `capture` until the stream ends or the user quits
///
/// Every frame goes to the raw view; with a pipeline, its output goes to the
/// processed view as well. The display is closed on every exit path.
pub fn run_capture_loop<C, D>(
    capture: &mut C,
    display: &mut D,
    pipeline: Option<&mut FramePipeline>,
) -> Result<LoopSummary>
where
    C: CaptureSource + ?Sized,
    D: DisplaySurface + ?Sized,
{
    let outcome = drive(capture, display, pipeline);

    match display.close() {
        Ok(()) => outcome,
        Err(e) if outcome.is_ok() => Err(e),
        Err(e) => {
            tracing::warn!("Failed to close display: {}", e);
            outcome
        }
    }
}

fn drive<C, D>(
    capture: &mut C,
    display: &mut D,
    mut pipeline: Option<&mut FramePipeline>,
) -> Result<LoopSummary>
where
    C: CaptureSource + ?Sized,
    D: DisplaySurface + ?Sized,
{
    let mut frame_count = 0u64;
    let mut total_capture_time = Duration::ZERO;
    let mut total_process_time = Duration::ZERO;
    let mut total_display_time = Duration::ZERO;

    let (width, height) = capture.resolution();
    tracing::info!("Starting capture loop at {}x{}", width, height);
    if let Some(pipeline) = pipeline.as_deref() {
        tracing::info!("Processing with {:?}", pipeline.config());
    }
    tracing::info!("Press '{}' to stop", QUIT_KEY);

    let stop = loop {
        // Capture frame
        let capture_start = Instant::now();
        let Some(frame) = capture.capture_frame()? else {
            tracing::info!("Capture source ended after {} frames", frame_count);
            break StopReason::EndOfStream;
        };
        total_capture_time += capture_start.elapsed();

        // Processing (if a pipeline is attached)
        let process_start = Instant::now();
        let processed = match pipeline.as_deref_mut() {
            Some(pipeline) => Some(pipeline.process(&frame)?),
            None => None,
        };
        total_process_time += process_start.elapsed();

        // Display
        let display_start = Instant::now();
        display.show(View::Raw, &frame)?;
        if let Some(processed) = &processed {
            display.show(View::Processed, processed)?;
        }
        total_display_time += display_start.elapsed();

        frame_count += 1;

        // Log stats every 30 frames
        if frame_count % STATS_INTERVAL == 0 {
            let avg_capture_ms = total_capture_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let avg_process_ms = total_process_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let avg_display_ms = total_display_time.as_secs_f64() * 1000.0 / frame_count as f64;

            tracing::info!(
                "Frame {}: capture={:.1}ms, process={:.1}ms, display={:.1}ms",
                frame_count,
                avg_capture_ms,
                avg_process_ms,
                avg_display_ms
            );
        }

        if display.poll_key(KEY_WAIT)? == Some(QUIT_KEY) {
            tracing::info!("Quit requested after {} frames", frame_count);
            break StopReason::UserQuit;
        }
    };

    Ok(LoopSummary {
        frames: frame_count,
        stop,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::pipeline::Variant;
    use crate::segmentation::Mog2;
    use image::{Rgb, RgbImage};
    use std::collections::VecDeque;

    struct FakeCapture {
        frames: VecDeque<RgbImage>,
    }

    impl FakeCapture {
        fn new(count: usize, size: u32) -> Self {
            let frames = (0..count)
                .map(|i| RgbImage::from_pixel(size, size, Rgb([i as u8, 0, 0])))
                .collect();
            Self { frames }
        }
    }

    impl CaptureSource for FakeCapture {
        fn capture_frame(&mut self) -> Result<Option<RgbImage>> {
            Ok(self.frames.pop_front())
        }

        fn resolution(&self) -> (u32, u32) {
            (16, 16)
        }
    }

    #[derive(Default)]
    struct FakeDisplay {
        shown: Vec<View>,
        keys: VecDeque<char>,
        closed: usize,
    }

    impl DisplaySurface for FakeDisplay {
        fn show(&mut self, view: View, _frame: &RgbImage) -> Result<()> {
            self.shown.push(view);
            Ok(())
        }

        fn poll_key(&mut self, _timeout: Duration) -> Result<Option<char>> {
            Ok(self.keys.pop_front())
        }

        fn close(&mut self) -> Result<()> {
            self.closed += 1;
            Ok(())
        }
    }

    fn pipeline() -> FramePipeline {
        FramePipeline::new(Box::new(Mog2::default()), Variant::Refined.config())
    }

    #[test]
    fn stops_at_end_of_stream() {
        let mut capture = FakeCapture::new(3, 16);
        let mut display = FakeDisplay::default();
        let mut pipeline = pipeline();

        let summary = run_capture_loop(&mut capture, &mut display, Some(&mut pipeline)).unwrap();

        assert_eq!(summary, LoopSummary { frames: 3, stop: StopReason::EndOfStream });
        assert_eq!(display.shown.iter().filter(|&&v| v == View::Raw).count(), 3);
        assert_eq!(display.shown.iter().filter(|&&v| v == View::Processed).count(), 3);
        assert_eq!(display.closed, 1);
    }

    #[test]
    fn quit_key_stops_the_loop() {
        let mut capture = FakeCapture::new(10, 16);
        let mut display = FakeDisplay {
            keys: VecDeque::from(['x', QUIT_KEY]),
            ..FakeDisplay::default()
        };
        let mut pipeline = pipeline();

        let summary = run_capture_loop(&mut capture, &mut display, Some(&mut pipeline)).unwrap();

        assert_eq!(summary, LoopSummary { frames: 2, stop: StopReason::UserQuit });
        assert_eq!(capture.frames.len(), 8);
        assert_eq!(display.closed, 1);
    }

    #[test]
    fn raw_view_only_without_pipeline() {
        let mut capture = FakeCapture::new(4, 16);
        let mut display = FakeDisplay::default();

        let summary = run_capture_loop(&mut capture, &mut display, None).unwrap();

        assert_eq!(summary.frames, 4);
        assert!(display.shown.iter().all(|&v| v == View::Raw));
    }

    #[test]
    fn empty_source_still_closes_display() {
        let mut capture = FakeCapture::new(0, 16);
        let mut display = FakeDisplay::default();

        let summary = run_capture_loop(&mut capture, &mut display, None).unwrap();

        assert_eq!(summary, LoopSummary { frames: 0, stop: StopReason::EndOfStream });
        assert!(display.shown.is_empty());
        assert_eq!(display.closed, 1);
    }

    #[test]
    fn pipeline_errors_close_display() {
        let mut capture = FakeCapture::new(1, 16);
        capture.frames.push_back(RgbImage::new(8, 8));
        let mut display = FakeDisplay::default();
        let mut pipeline = pipeline();

        let err = run_capture_loop(&mut capture, &mut display, Some(&mut pipeline)).unwrap_err();

        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(display.closed, 1);
    }
}
