mod composite;
mod refine;
mod shapes;

pub use composite::{
    composite, draw_bounding_boxes, draw_contours, masked, Overlay, BOX_THICKNESS,
    CONTOUR_THICKNESS, OVERLAY_COLOR,
};
pub use refine::{ellipse_element, MaskRefiner, KERNEL_SIZE};
pub use shapes::{find_shapes, polygon_area, Shape, MIN_SHAPE_AREA};
