//! Convenience helpers for loading PIV frames via the `image` crate.
//!
//! Available when the `image-io` feature is enabled. Grey levels are kept in
//! their native range: 16-bit grayscale stays in `0..=65535`, everything else
//! is converted to 8-bit luma.

use crate::image::Frame;
use crate::util::{PivError, PivResult};
use image::DynamicImage;
use std::path::Path;

/// Creates a frame from an 8-bit grayscale image buffer.
pub fn frame_from_gray_image(img: &image::GrayImage) -> PivResult<Frame> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    Frame::from_u8(img.as_raw(), width, height)
}

/// Creates a frame from a 16-bit grayscale image buffer.
pub fn frame_from_gray16_image(
    img: &image::ImageBuffer<image::Luma<u16>, Vec<u16>>,
) -> PivResult<Frame> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    Frame::from_u16(img.as_raw(), width, height)
}

/// Creates a frame from a dynamic image, converting colour to luma.
pub fn frame_from_dynamic_image(img: &DynamicImage) -> PivResult<Frame> {
    match img {
        DynamicImage::ImageLuma16(gray) => frame_from_gray16_image(gray),
        other => frame_from_gray_image(&other.to_luma8()),
    }
}

/// Loads an image from disk as a grayscale frame.
pub fn load_frame<P: AsRef<Path>>(path: P) -> PivResult<Frame> {
    let img = image::open(path).map_err(|err| PivError::ImageIo {
        reason: err.to_string(),
    })?;
    frame_from_dynamic_image(&img)
}

#[cfg(test)]
mod tests {
    use super::frame_from_dynamic_image;
    use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgb, RgbImage};

    #[test]
    fn gray16_keeps_native_range() {
        let img: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_raw(2, 1, vec![1000u16, 65535]).unwrap();
        let frame = frame_from_dynamic_image(&DynamicImage::ImageLuma16(img)).unwrap();
        assert_eq!(frame.data(), &[1000.0, 65535.0]);
    }

    #[test]
    fn rgb_is_converted_to_luma() {
        let mut img = RgbImage::new(1, 1);
        img.put_pixel(0, 0, Rgb([200, 200, 200]));
        let frame = frame_from_dynamic_image(&DynamicImage::ImageRgb8(img)).unwrap();
        assert_eq!(frame.data(), &[200.0]);

        let gray = GrayImage::from_raw(1, 1, vec![7]).unwrap();
        let frame = frame_from_dynamic_image(&DynamicImage::ImageLuma8(gray)).unwrap();
        assert_eq!(frame.data(), &[7.0]);
    }
}
