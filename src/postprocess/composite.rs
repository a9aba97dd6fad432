use super::shapes::{find_shapes, Shape};
use crate::error::{check_dimensions, Result};
use crate::segmentation::Mask;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

/// Colour of drawn outlines
pub const OVERLAY_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
/// Stroke width of contour outlines
pub const CONTOUR_THICKNESS: u32 = 3;
/// Stroke width of bounding boxes
pub const BOX_THICKNESS: u32 = 2;

/// How a processed frame is derived from the source frame and its mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    /// Source frame untouched
    None,
    /// Source pixels under the mask, black elsewhere
    Masked,
    /// Source frame with the outline of each large region
    Contours,
    /// Source frame with the bounding box of each large region
    BoundingBoxes,
}

/// Build a display frame from `frame` and its mask; `frame` itself is never modified
pub fn composite(
    frame: &RgbImage,
    mask: &Mask,
    overlay: Overlay,
    min_area: f64,
) -> Result<RgbImage> {
    let _span = tracing::debug_span!("composite", ?overlay).entered();

    check_dimensions("mask", frame.dimensions(), mask.dimensions())?;

    let output = match overlay {
        Overlay::None => frame.clone(),
        Overlay::Masked => masked(frame, mask)?,
        Overlay::Contours => draw_contours(frame, &find_shapes(mask, min_area)),
        Overlay::BoundingBoxes => draw_bounding_boxes(frame, &find_shapes(mask, min_area)),
    };

    Ok(output)
}

/// Keep source pixels where the mask is non-zero, zero the rest
pub fn masked(frame: &RgbImage, mask: &Mask) -> Result<RgbImage> {
    check_dimensions("mask", frame.dimensions(), mask.dimensions())?;

    let mut output = RgbImage::new(frame.width(), frame.height());
    for ((out, src), m) in output.pixels_mut().zip(frame.pixels()).zip(mask.pixels()) {
        if m[0] != 0 {
            *out = *src;
        }
    }
    Ok(output)
}

/// Copy of `frame` with every shape's boundary stamped in `OVERLAY_COLOR`
pub fn draw_contours(frame: &RgbImage, shapes: &[Shape]) -> RgbImage {
    let mut output = frame.clone();
    let offset = (CONTOUR_THICKNESS as i32 - 1) / 2;

    for shape in shapes {
        for p in shape.points() {
            let stroke = Rect::at(p.x - offset, p.y - offset)
                .of_size(CONTOUR_THICKNESS, CONTOUR_THICKNESS);
            draw_filled_rect_mut(&mut output, stroke, OVERLAY_COLOR);
        }
    }
    output
}

/// Copy of `frame` with every shape's bounding box outlined in `OVERLAY_COLOR`
///
/// The innermost stroke lies exactly on the box; extra strokes grow outward.
pub fn draw_bounding_boxes(frame: &RgbImage, shapes: &[Shape]) -> RgbImage {
    let mut output = frame.clone();

    for bounds in shapes.iter().filter_map(Shape::bounding_box) {
        for grow in 0..BOX_THICKNESS {
            let stroke = Rect::at(bounds.left() - grow as i32, bounds.top() - grow as i32)
                .of_size(bounds.width() + 2 * grow, bounds.height() + 2 * grow);
            draw_hollow_rect_mut(&mut output, stroke, OVERLAY_COLOR);
        }
    }
    output
}
