use crate::error::Result;
use crate::postprocess::{composite, MaskRefiner, Overlay, MIN_SHAPE_AREA};
use crate::segmentation::BackgroundSubtractor;
use image::RgbImage;

/// What a pipeline does with the mask it gets from the background model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Open the mask before compositing
    pub refine: bool,
    pub overlay: Overlay,
}

/// The four fixed compositions offered by the binary
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Variant {
    /// Raw foreground pixels
    Foreground,
    /// Foreground pixels after noise removal
    Refined,
    /// Frame with region outlines
    Contours,
    /// Frame with region bounding boxes
    BoundingBoxes,
}

impl Variant {
    /// Every variant, in the order the binary cycles through them
    pub const ALL: [Variant; 4] = [
        Variant::Foreground,
        Variant::Refined,
        Variant::Contours,
        Variant::BoundingBoxes,
    ];

    pub fn config(self) -> PipelineConfig {
        match self {
            Variant::Foreground => PipelineConfig {
                refine: false,
                overlay: Overlay::Masked,
            },
            Variant::Refined => PipelineConfig {
                refine: true,
                overlay: Overlay::Masked,
            },
            Variant::Contours => PipelineConfig {
                refine: true,
                overlay: Overlay::Contours,
            },
            Variant::BoundingBoxes => PipelineConfig {
                refine: true,
                overlay: Overlay::BoundingBoxes,
            },
        }
    }
}

/// Background model, refiner and compositor wired together
///
/// The model adapts on every processed frame and is kept across `set_config`
/// calls, so switching variants does not restart learning.
pub struct FramePipeline {
    subtractor: Box<dyn BackgroundSubtractor>,
    refiner: MaskRefiner,
    config: PipelineConfig,
    min_area: f64,
}

impl FramePipeline {
    pub fn new(subtractor: Box<dyn BackgroundSubtractor>, config: PipelineConfig) -> Self {
        Self {
            subtractor,
            refiner: MaskRefiner::default(),
            config,
            min_area: MIN_SHAPE_AREA,
        }
    }

    pub fn config(&self) -> PipelineConfig {
        self.config
    }

    pub fn set_config(&mut self, config: PipelineConfig) {
        tracing::debug!("Pipeline config changed to {:?}", config);
        self.config = config;
    }

    pub fn subtractor(&self) -> &dyn BackgroundSubtractor {
        self.subtractor.as_ref()
    }

    /// Run one frame through the pipeline, advancing the background model
    pub fn process(&mut self, frame: &RgbImage) -> Result<RgbImage> {
        let _span = tracing::debug_span!("process_frame").entered();

        let mask = self.subtractor.apply(frame)?;
        let mask = if self.config.refine {
            self.refiner.refine(&mask)
        } else {
            mask
        };

        composite(frame, &mask, self.config.overlay, self.min_area)
    }
}
