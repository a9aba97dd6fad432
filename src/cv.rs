//! Conversions between `image` buffers and OpenCV matrices.

use image::{GrayImage, RgbImage};
use opencv::core::{Mat, Scalar, CV_8UC1, CV_8UC3};
use opencv::prelude::*;

/// Convert an RGB frame into a BGR Mat
pub(crate) fn rgb_to_bgr_mat(frame: &RgbImage) -> opencv::Result<Mat> {
    let (width, height) = frame.dimensions();
    let mut mat = Mat::new_rows_cols_with_default(
        height as i32,
        width as i32,
        CV_8UC3,
        Scalar::all(0.0),
    )?;

    let bytes = mat.data_bytes_mut()?;
    for (dst, src) in bytes.chunks_exact_mut(3).zip(frame.pixels()) {
        dst[0] = src[2];
        dst[1] = src[1];
        dst[2] = src[0];
    }
    Ok(mat)
}

/// Convert a BGR Mat back into an RGB frame
pub(crate) fn bgr_mat_to_rgb(mat: &Mat) -> opencv::Result<RgbImage> {
    let (width, height) = (mat.cols() as u32, mat.rows() as u32);
    let mut frame = RgbImage::new(width, height);

    let bytes = mat.data_bytes()?;
    for (dst, src) in frame.pixels_mut().zip(bytes.chunks_exact(3)) {
        dst.0 = [src[2], src[1], src[0]];
    }
    Ok(frame)
}

/// Copy a single-channel 8-bit Mat into a gray image
pub(crate) fn mat_to_gray(mat: &Mat) -> opencv::Result<GrayImage> {
    if mat.typ() != CV_8UC1 {
        return Err(opencv::Error::new(
            opencv::core::StsBadArg,
            format!("expected an 8-bit single channel mat, got type {}", mat.typ()),
        ));
    }

    let (width, height) = (mat.cols() as u32, mat.rows() as u32);
    let bytes = mat.data_bytes()?.to_vec();
    GrayImage::from_raw(width, height, bytes).ok_or_else(|| {
        opencv::Error::new(
            opencv::core::StsUnmatchedSizes,
            format!("mask buffer does not fill {}x{}", width, height),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    #[test]
    fn frame_survives_bgr_round_trip() {
        let frame = RgbImage::from_fn(7, 5, |x, y| Rgb([x as u8 * 30, y as u8 * 40, 9]));
        let mat = rgb_to_bgr_mat(&frame).unwrap();

        assert_eq!(mat.typ(), CV_8UC3);
        assert_eq!(mat.data_bytes().unwrap()[..3], [9, 0, 0]);
        assert_eq!(bgr_mat_to_rgb(&mat).unwrap(), frame);
    }

    #[test]
    fn gray_mat_becomes_mask() {
        let mat = Mat::new_rows_cols_with_default(3, 4, CV_8UC1, Scalar::all(127.0)).unwrap();
        let mask = mat_to_gray(&mat).unwrap();

        assert_eq!(mask.dimensions(), (4, 3));
        assert!(mask.pixels().all(|&p| p == Luma([127])));
    }

    #[test]
    fn color_mat_is_not_a_mask() {
        let mat = rgb_to_bgr_mat(&RgbImage::new(2, 2)).unwrap();
        assert!(mat_to_gray(&mat).is_err());
    }
}
