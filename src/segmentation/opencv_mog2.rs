use super::mog2::Mog2Settings;
use super::types::{BackgroundSubtractor, Mask};
use crate::cv::{bgr_mat_to_rgb, mat_to_gray, rgb_to_bgr_mat};
use crate::error::{check_dimensions, Error, Result};
use image::RgbImage;
use opencv::core::{Mat, Ptr};
use opencv::prelude::*;
use opencv::video::{create_background_subtractor_mog2, BackgroundSubtractorMOG2};

/// OpenCV's `BackgroundSubtractorMOG2` behind the crate's subtractor trait
///
/// The model locks to the dimensions of the first frame it sees.
pub struct OpencvMog2 {
    subtractor: Ptr<BackgroundSubtractorMOG2>,
    settings: Mog2Settings,
    size: Option<(u32, u32)>,
    frames: u64,
}

fn mog2_from_settings(settings: &Mog2Settings) -> Result<Ptr<BackgroundSubtractorMOG2>> {
    let mut subtractor = create_background_subtractor_mog2(
        settings.history as i32,
        settings.var_threshold as f64,
        settings.detect_shadows,
    )?;

    subtractor.set_n_mixtures(settings.mixtures as i32)?;
    subtractor.set_background_ratio(settings.background_ratio as f64)?;
    subtractor.set_var_threshold_gen(settings.var_threshold_gen as f64)?;
    subtractor.set_var_init(settings.var_init as f64)?;
    subtractor.set_var_min(settings.var_min as f64)?;
    subtractor.set_var_max(settings.var_max as f64)?;
    subtractor.set_complexity_reduction_threshold(settings.complexity_reduction as f64)?;
    subtractor.set_shadow_value(settings.shadow_value as i32)?;
    subtractor.set_shadow_threshold(settings.shadow_threshold as f64)?;

    Ok(subtractor)
}

impl OpencvMog2 {
    pub fn new(settings: Mog2Settings) -> Result<Self> {
        tracing::debug!("Creating OpenCV MOG2 subtractor with {:?}", settings);

        Ok(Self {
            subtractor: mog2_from_settings(&settings)?,
            settings,
            size: None,
            frames: 0,
        })
    }

    pub fn settings(&self) -> &Mog2Settings {
        &self.settings
    }

    /// Number of frames folded into the model so far
    pub fn frames_seen(&self) -> u64 {
        self.frames
    }

    /// Like `apply`, with an explicit learning rate in [0, 1]
    ///
    /// `None` lets OpenCV pick `1 / min(2 * frames, history)`.
    pub fn apply_with_learning_rate(
        &mut self,
        frame: &RgbImage,
        learning_rate: Option<f32>,
    ) -> Result<Mask> {
        let _span = tracing::debug_span!("opencv_mog2_apply").entered();

        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::InvalidInput("frame is empty".to_string()));
        }
        if let Some(size) = self.size {
            check_dimensions("frame", size, (width, height))?;
        }

        let input = rgb_to_bgr_mat(frame)?;
        let mut mask = Mat::default();
        let rate = learning_rate.map(|r| r.min(1.0) as f64).unwrap_or(-1.0);
        self.subtractor.apply(&input, &mut mask, rate)?;

        self.size = Some((width, height));
        self.frames += 1;

        mat_to_gray(&mask).map_err(Error::from)
    }
}

impl BackgroundSubtractor for OpencvMog2 {
    fn apply(&mut self, frame: &RgbImage) -> Result<Mask> {
        self.apply_with_learning_rate(frame, None)
    }

    fn background_image(&self) -> Option<RgbImage> {
        self.size?;

        let mut background = Mat::default();
        match self
            .subtractor
            .get_background_image(&mut background)
            .and_then(|_| bgr_mat_to_rgb(&background))
        {
            Ok(image) => Some(image),
            Err(e) => {
                tracing::warn!("Failed to read MOG2 background image: {}", e);
                None
            }
        }
    }

    fn frame_size(&self) -> Option<(u32, u32)> {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn solid(width: u32, height: u32, value: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb(value))
    }

    fn model() -> OpencvMog2 {
        OpencvMog2::new(Mog2Settings::default()).unwrap()
    }

    #[test]
    fn static_scene_becomes_background() {
        let mut model = model();
        let frame = solid(10, 10, [120, 60, 30]);

        model.apply(&frame).unwrap();
        let mask = model.apply(&frame).unwrap();

        assert_eq!(mask.dimensions(), (10, 10));
        assert!(mask.pixels().all(|p| p[0] == 0));
        assert_eq!(model.frames_seen(), 2);
    }

    #[test]
    fn new_object_is_foreground() {
        let mut model = model();
        let background = solid(20, 20, [0, 0, 0]);
        for _ in 0..5 {
            model.apply(&background).unwrap();
        }

        let mut scene = background.clone();
        for y in 5..10 {
            for x in 5..10 {
                scene.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
        let mask = model.apply(&scene).unwrap();

        assert_eq!(mask.pixels().filter(|p| p[0] == 255).count(), 25);
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn rejects_dimension_change() {
        let mut model = model();
        model.apply(&solid(10, 10, [0, 0, 0])).unwrap();

        let err = model.apply(&solid(12, 10, [0, 0, 0])).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(model.frame_size(), Some((10, 10)));
        assert_eq!(model.frames_seen(), 1);
    }

    #[test]
    fn background_image_tracks_static_scene() {
        let mut model = model();
        assert!(model.background_image().is_none());

        let frame = solid(6, 6, [10, 200, 90]);
        for _ in 0..3 {
            model.apply(&frame).unwrap();
        }

        assert_eq!(model.background_image(), Some(frame));
        assert_eq!(model.settings().history, 500);
    }
}
