use super::types::{BackgroundSubtractor, Mask};
use crate::error::{check_dimensions, Error, Result};
use image::{GrayImage, Luma, Rgb, RgbImage};

const CHANNELS: usize = 3;

/// Mask value for pixels that match a background mode
pub const BACKGROUND: u8 = 0;
/// Mask value for pixels that match nothing in the model
pub const FOREGROUND: u8 = 255;

/// Tuning of the Gaussian mixture model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mog2Settings {
    /// Number of frames the automatic learning rate averages over
    pub history: u32,
    /// Squared Mahalanobis distance below which a pixel is background (Tb)
    pub var_threshold: f32,
    /// Squared Mahalanobis distance below which a pixel updates a mode (Tg)
    pub var_threshold_gen: f32,
    /// Maximum number of Gaussians per pixel
    pub mixtures: usize,
    /// Cumulative weight of the modes that describe the background (TB)
    pub background_ratio: f32,
    pub var_init: f32,
    pub var_min: f32,
    pub var_max: f32,
    /// Weight decay that prunes modes nobody supports (cT)
    pub complexity_reduction: f32,
    pub detect_shadows: bool,
    /// Mask value written for shadow pixels
    pub shadow_value: u8,
    /// Darkest a shadow may make a background colour (tau)
    pub shadow_threshold: f32,
}

impl Default for Mog2Settings {
    fn default() -> Self {
        Self {
            history: 500,
            var_threshold: 16.0,
            var_threshold_gen: 9.0,
            mixtures: 5,
            background_ratio: 0.9,
            var_init: 15.0,
            var_min: 4.0,
            var_max: 75.0,
            complexity_reduction: 0.05,
            detect_shadows: true,
            shadow_value: 127,
            shadow_threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Gaussian {
    weight: f32,
    variance: f32,
    mean: [f32; CHANNELS],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Background,
    Shadow,
    Foreground,
}

/// Adaptive Gaussian mixture background model
///
/// Every pixel carries up to `mixtures` Gaussians sorted by weight. Each call to
/// `apply` classifies the frame and then folds it into the model, so the mask
/// sharpens over the first frames as the statistics converge.
///
/// Pure Rust fallback for builds without the `opencv` feature; it follows the
/// update and shadow rules of OpenCV's `BackgroundSubtractorMOG2`.
pub struct Mog2 {
    settings: Mog2Settings,
    size: Option<(u32, u32)>,

    // Flattened per-pixel mixtures: pixel i owns modes[i * mixtures..(i + 1) * mixtures]
    modes: Vec<Gaussian>,
    modes_used: Vec<u8>,

    frames: u64,
}

impl Mog2 {
    pub fn new(settings: Mog2Settings) -> Self {
        let mut settings = settings;
        settings.mixtures = settings.mixtures.clamp(1, u8::MAX as usize);
        settings.history = settings.history.max(1);

        Self {
            settings,
            size: None,
            modes: Vec::new(),
            modes_used: Vec::new(),
            frames: 0,
        }
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
    /// `None` (or a negative rate) selects the automatic rate
    /// `1 / min(2 * frames, history)`. The first frame always uses the automatic rate.
    pub fn apply_with_learning_rate(
        &mut self,
        frame: &RgbImage,
        learning_rate: Option<f32>,
    ) -> Result<Mask> {
        let _span = tracing::debug_span!("mog2_apply").entered();

        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::InvalidInput("frame is empty".to_string()));
        }

        match self.size {
            Some(size) => check_dimensions("frame", size, (width, height))?,
            None => self.allocate(width, height),
        }

        self.frames += 1;
        let alpha = match learning_rate {
            Some(rate) if rate >= 0.0 && self.frames > 1 => rate.min(1.0),
            _ => 1.0 / (2 * self.frames).min(self.settings.history as u64) as f32,
        };

        let settings = &self.settings;
        let mut mask = GrayImage::new(width, height);
        let mixtures = self.modes.chunks_exact_mut(settings.mixtures);

        for ((pixel, out), (modes, used)) in frame
            .pixels()
            .zip(mask.pixels_mut())
            .zip(mixtures.zip(self.modes_used.iter_mut()))
        {
            let sample = [pixel[0] as f32, pixel[1] as f32, pixel[2] as f32];
            let value = match update_pixel(settings, alpha, modes, used, sample) {
                Verdict::Background => BACKGROUND,
                Verdict::Shadow => settings.shadow_value,
                Verdict::Foreground => FOREGROUND,
            };
            *out = Luma([value]);
        }

        Ok(mask)
    }

    fn allocate(&mut self, width: u32, height: u32) {
        let pixels = width as usize * height as usize;
        tracing::debug!(
            "Allocating MOG2 model for {}x{} with {} mixtures",
            width,
            height,
            self.settings.mixtures
        );

        self.modes = vec![Gaussian::default(); pixels * self.settings.mixtures];
        self.modes_used = vec![0; pixels];
        self.size = Some((width, height));
    }
}

impl Default for Mog2 {
    fn default() -> Self {
        Self::new(Mog2Settings::default())
    }
}

impl BackgroundSubtractor for Mog2 {
    fn apply(&mut self, frame: &RgbImage) -> Result<Mask> {
        self.apply_with_learning_rate(frame, None)
    }

    fn background_image(&self) -> Option<RgbImage> {
        let (width, height) = self.size?;
        let mixtures = self.settings.mixtures;

        Some(RgbImage::from_fn(width, height, |x, y| {
            let idx = (y * width + x) as usize;
            let start = idx * mixtures;
            let modes = &self.modes[start..start + self.modes_used[idx] as usize];

            let mut sum = [0.0f32; CHANNELS];
            let mut total_weight = 0.0f32;
            for mode in modes {
                for (acc, mean) in sum.iter_mut().zip(mode.mean) {
                    *acc += mode.weight * mean;
                }
                total_weight += mode.weight;
                if total_weight > self.settings.background_ratio {
                    break;
                }
            }

            if total_weight > f32::EPSILON {
                sum.iter_mut().for_each(|v| *v /= total_weight);
            }
            Rgb(sum.map(|v| v.round().clamp(0.0, 255.0) as u8))
        }))
    }

    fn frame_size(&self) -> Option<(u32, u32)> {
        self.size
    }
}

fn squared_distance(a: &[f32; CHANNELS], b: &[f32; CHANNELS]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Classify one pixel and update its mixture in place
fn update_pixel(
    s: &Mog2Settings,
    alpha: f32,
    modes: &mut [Gaussian],
    used: &mut u8,
    sample: [f32; CHANNELS],
) -> Verdict {
    let prune = -alpha * s.complexity_reduction;
    let alpha1 = 1.0 - alpha;

    let mut count = *used as usize;
    let mut background = false;
    let mut fits = false;
    let mut total_weight = 0.0f32;

    for i in 0..count {
        let mut weight = alpha1 * modes[i].weight + prune;
        let mut slot = i;

        // Only the strongest matching mode absorbs the sample
        if !fits {
            let mode = &mut modes[i];
            let dist2 = squared_distance(&mode.mean, &sample);

            if total_weight < s.background_ratio && dist2 < s.var_threshold * mode.variance {
                background = true;
            }

            if dist2 < s.var_threshold_gen * mode.variance {
                fits = true;
                weight += alpha;

                let k = if weight > 0.0 { alpha / weight } else { 0.0 };
                for (mean, value) in mode.mean.iter_mut().zip(sample) {
                    *mean += k * (value - *mean);
                }
                mode.variance =
                    (mode.variance + k * (dist2 - mode.variance)).clamp(s.var_min, s.var_max);

                // Only this mode gained weight, so it can only move up
                while slot > 0 && weight >= modes[slot - 1].weight {
                    modes.swap(slot, slot - 1);
                    slot -= 1;
                }
            }
        }

        if weight < -prune {
            weight = 0.0;
        }
        modes[slot].weight = weight;
        total_weight += weight;
    }

    // Drop pruned modes, keeping the weight order
    let mut kept = 0;
    for i in 0..count {
        if modes[i].weight > 0.0 {
            modes[kept] = modes[i];
            kept += 1;
        }
    }
    count = kept;

    if total_weight > 0.0 {
        for mode in &mut modes[..count] {
            mode.weight /= total_weight;
        }
    }

    if !fits {
        // Add a mode, or replace the weakest one when the mixture is full
        if count < modes.len() {
            count += 1;
        }
        let mut slot = count - 1;

        let weight = if count == 1 {
            1.0
        } else {
            for mode in &mut modes[..slot] {
                mode.weight *= alpha1;
            }
            alpha
        };

        modes[slot] = Gaussian {
            weight,
            variance: s.var_init,
            mean: sample,
        };
        while slot > 0 && weight >= modes[slot - 1].weight {
            modes.swap(slot, slot - 1);
            slot -= 1;
        }
    }

    *used = count as u8;

    if background {
        Verdict::Background
    } else if s.detect_shadows && is_shadow(s, &modes[..count], sample) {
        Verdict::Shadow
    } else {
        Verdict::Foreground
    }
}

/// A shadow is a background colour scaled down by a factor in [tau, 1]
fn is_shadow(s: &Mog2Settings, modes: &[Gaussian], sample: [f32; CHANNELS]) -> bool {
    let mut total_weight = 0.0f32;

    for mode in modes {
        let numerator: f32 = mode.mean.iter().zip(sample).map(|(m, v)| m * v).sum();
        let denominator: f32 = mode.mean.iter().map(|m| m * m).sum();

        if denominator == 0.0 {
            return false;
        }

        if numerator <= denominator && numerator >= s.shadow_threshold * denominator {
            let a = numerator / denominator;
            let dist2a: f32 = mode
                .mean
                .iter()
                .zip(sample)
                .map(|(m, v)| (a * m - v) * (a * m - v))
                .sum();

            if dist2a < s.var_threshold * mode.variance * a * a {
                return true;
            }
        }

        total_weight += mode.weight;
        if total_weight > s.background_ratio {
            return false;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, value: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb(value))
    }

    fn count_where(mask: &Mask, f: impl Fn(u8) -> bool) -> usize {
        mask.pixels().filter(|p| f(p[0])).count()
    }

    #[test]
    fn first_frame_is_all_foreground() {
        let mut model = Mog2::default();
        let mask = model.apply(&solid(8, 6, [40, 90, 160])).unwrap();

        assert_eq!(mask.dimensions(), (8, 6));
        assert_eq!(count_where(&mask, |v| v != 0), 48);
        assert_eq!(model.frames_seen(), 1);
    }

    #[test]
    fn static_scene_becomes_background() {
        let mut model = Mog2::default();
        let frame = solid(10, 10, [120, 60, 30]);

        model.apply(&frame).unwrap();
        let mask = model.apply(&frame).unwrap();

        assert_eq!(count_where(&mask, |v| v == BACKGROUND), 100);
    }

    #[test]
    fn new_object_is_foreground() {
        let mut model = Mog2::default();
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

        assert_eq!(count_where(&mask, |v| v == FOREGROUND), 25);
        assert_eq!(mask.get_pixel(7, 7)[0], FOREGROUND);
        assert_eq!(mask.get_pixel(0, 0)[0], BACKGROUND);
    }

    #[test]
    fn darker_copy_of_background_is_shadow() {
        let mut model = Mog2::default();
        for _ in 0..10 {
            model.apply(&solid(4, 4, [200, 200, 200])).unwrap();
        }

        let mask = model.apply(&solid(4, 4, [150, 150, 150])).unwrap();
        assert_eq!(count_where(&mask, |v| v == 127), 16);
    }

    #[test]
    fn shadows_are_foreground_when_detection_is_off() {
        let mut model = Mog2::new(Mog2Settings {
            detect_shadows: false,
            ..Mog2Settings::default()
        });
        for _ in 0..10 {
            model.apply(&solid(4, 4, [200, 200, 200])).unwrap();
        }

        let mask = model.apply(&solid(4, 4, [150, 150, 150])).unwrap();
        assert_eq!(count_where(&mask, |v| v == FOREGROUND), 16);
    }

    #[test]
    fn rejects_dimension_change() {
        let mut model = Mog2::default();
        model.apply(&solid(10, 10, [0, 0, 0])).unwrap();

        let err = model.apply(&solid(12, 10, [0, 0, 0])).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(model.frame_size(), Some((10, 10)));
        assert_eq!(model.frames_seen(), 1);
    }

    #[test]
    fn rejects_empty_frame() {
        let mut model = Mog2::default();
        let err = model.apply(&RgbImage::new(0, 0)).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn background_image_tracks_static_scene() {
        let mut model = Mog2::default();
        assert!(model.background_image().is_none());

        let frame = solid(6, 6, [10, 200, 90]);
        for _ in 0..3 {
            model.apply(&frame).unwrap();
        }

        let background = model.background_image().unwrap();
        assert_eq!(background, frame);
    }

    #[test]
    fn zero_learning_rate_freezes_the_model() {
        let mut model = Mog2::default();
        model.apply(&solid(4, 4, [0, 0, 0])).unwrap();

        let white = solid(4, 4, [255, 255, 255]);
        for _ in 0..20 {
            let mask = model.apply_with_learning_rate(&white, Some(0.0)).unwrap();
            assert_eq!(count_where(&mask, |v| v == FOREGROUND), 16);
        }
    }

    #[test]
    fn mixture_never_exceeds_its_capacity() {
        let clamped = Mog2::new(Mog2Settings {
            mixtures: 0,
            ..Mog2Settings::default()
        });
        assert_eq!(clamped.settings().mixtures, 1);

        let mut model = Mog2::new(Mog2Settings {
            mixtures: 2,
            ..Mog2Settings::default()
        });
        let capacity = model.settings().mixtures;

        for value in [0u8, 60, 120, 180, 240] {
            model.apply(&solid(2, 2, [value, value, value])).unwrap();
            assert!(model.modes_used.iter().all(|&n| n as usize <= capacity));
        }
    }
}
