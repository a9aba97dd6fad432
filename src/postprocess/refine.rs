use crate::segmentation::Mask;
use image::{GrayImage, Luma};
use imageproc::morphology::{self, grayscale_open};

/// Side of the elliptical structuring element used for opening
pub const KERNEL_SIZE: u8 = 5;

/// Removes speckle noise from foreground masks with a morphological opening
///
/// The structuring element is built once and shared by every call.
pub struct MaskRefiner {
    element: morphology::Mask,
}

impl MaskRefiner {
    pub fn new(size: u8) -> Self {
        let size = size.max(1);
        let shape = ellipse_element(size as u32);
        let center = size / 2;

        tracing::debug!("Built {}x{} elliptical structuring element", size, size);

        Self {
            element: morphology::Mask::from_image(&shape, center, center),
        }
    }

    /// Erode then dilate; the result has the input's dimensions
    ///
    /// Isolated foreground pixels disappear. Larger regions keep their extent
    /// but may lose sharp corners.
    pub fn refine(&self, mask: &Mask) -> Mask {
        let _span = tracing::debug_span!("refine").entered();
        grayscale_open(mask, &self.element)
    }
}

impl Default for MaskRefiner {
    fn default() -> Self {
        Self::new(KERNEL_SIZE)
    }
}

/// Elliptical structuring element inscribed in a `size`x`size` square
///
/// Each row spans `round(c * sqrt((r^2 - dy^2) / r^2))` cells either side of
/// the centre column, which yields the familiar 5x5 shape
/// `00100 / 11111 / 11111 / 11111 / 00100`.
pub fn ellipse_element(size: u32) -> GrayImage {
    let r = (size / 2) as i32;
    let c = r;
    let inv_r2 = if r > 0 { 1.0 / (r * r) as f64 } else { 0.0 };

    let mut element = GrayImage::new(size, size);
    for row in 0..size as i32 {
        let dy = row - r;
        if dy.abs() > r {
            continue;
        }

        let dx = (c as f64 * (((r * r - dy * dy) as f64) * inv_r2).sqrt()).round() as i32;
        let start = (c - dx).max(0);
        let end = (c + dx + 1).min(size as i32);
        for col in start..end {
            element.put_pixel(col as u32, row as u32, Luma([255]));
        }
    }
    element
}
