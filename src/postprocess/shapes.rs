use crate::segmentation::Mask;
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;
use imageproc::rect::Rect;

/// Smallest enclosed area (in square pixels) a shape needs to be reported
pub const MIN_SHAPE_AREA: f64 = 750.0;

/// Outer boundary of one connected foreground region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    points: Vec<Point<i32>>,
}

impl Shape {
    pub fn new(points: Vec<Point<i32>>) -> Self {
        Self { points }
    }

    /// Boundary points in tracing order
    pub fn points(&self) -> &[Point<i32>] {
        &self.points
    }

    /// Area enclosed by the boundary polygon
    pub fn area(&self) -> f64 {
        polygon_area(&self.points)
    }

    /// Smallest axis-aligned rectangle containing every boundary point
    pub fn bounding_box(&self) -> Option<Rect> {
        let first = self.points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);

        for p in &self.points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        let (width, height) = ((max_x - min_x + 1) as u32, (max_y - min_y + 1) as u32);
        Some(Rect::at(min_x, min_y).of_size(width, height))
    }
}

/// Shoelace formula over a closed polygon
///
/// This is the area of the polygon through the boundary pixel centres, which
/// is smaller than the region's pixel count.
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let mut twice_area: i64 = 0;
    let mut prev = points[points.len() - 1];
    for &p in points {
        twice_area += prev.x as i64 * p.y as i64 - p.x as i64 * prev.y as i64;
        prev = p;
    }

    twice_area.abs() as f64 / 2.0
}

/// Find the external boundaries in a mask and keep those enclosing at least `min_area`
///
/// Regions nested inside holes of other regions are not reported. The order of
/// the returned shapes is unspecified.
pub fn find_shapes(mask: &Mask, min_area: f64) -> Vec<Shape> {
    let _span = tracing::debug_span!("find_shapes").entered();

    let contours = find_contours::<i32>(mask);
    let total = contours.len();

    let shapes: Vec<Shape> = contours
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .map(|c| Shape::new(c.points))
        .filter(|shape| shape.area() >= min_area)
        .collect();

    tracing::debug!("{} of {} borders kept", shapes.len(), total);
    shapes
}
