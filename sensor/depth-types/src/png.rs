//! KITTI depth PNG persistence.
//!
//! KITTI stores depth maps as single-channel 16-bit PNG files holding the
//! fixed-point values unchanged, so a file written here loads directly into
//! the KITTI devkit (`depth = png / 256.0`, valid where `png > 0`).

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageBuffer, ImageFormat, Luma};

use crate::error::{Result, SensorError};
use crate::DepthImage;

type Gray16Image = ImageBuffer<Luma<u16>, Vec<u16>>;

fn to_buffer(image: &DepthImage) -> Result<Gray16Image> {
    Gray16Image::from_raw(image.width(), image.height(), image.data().to_vec()).ok_or_else(|| {
        SensorError::buffer_mismatch(image.pixel_count(), image.data().len())
    })
}

fn from_dynamic(decoded: DynamicImage) -> Result<DepthImage> {
    match decoded {
        DynamicImage::ImageLuma16(buffer) => {
            let (width, height) = buffer.dimensions();
            DepthImage::from_raw(width, height, buffer.into_raw())
        }
        other => Err(SensorError::unsupported_layout(format!(
            "expected 16-bit grayscale, got {:?}",
            other.color()
        ))),
    }
}

/// Writes a depth image as a 16-bit grayscale PNG.
///
/// # Errors
///
/// Returns an error if the file cannot be created or encoding fails.
pub fn save_png<P: AsRef<Path>>(image: &DepthImage, path: P) -> Result<()> {
    to_buffer(image)?.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Reads a 16-bit grayscale PNG into a depth image.
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded, or
/// [`SensorError::UnsupportedLayout`] if it is not single-channel 16-bit.
pub fn load_png<P: AsRef<Path>>(path: P) -> Result<DepthImage> {
    from_dynamic(image::open(path)?)
}

/// Encodes a depth image as 16-bit grayscale PNG bytes.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn encode_png(image: &DepthImage) -> Result<Vec<u8>> {
    let mut bytes = Cursor::new(Vec::new());
    to_buffer(image)?.write_to(&mut bytes, ImageFormat::Png)?;
    Ok(bytes.into_inner())
}

/// Decodes 16-bit grayscale PNG bytes into a depth image.
///
/// # Errors
///
/// Returns an error if the bytes are not a PNG or not single-channel 16-bit.
pub fn decode_png(bytes: &[u8]) -> Result<DepthImage> {
    from_dynamic(image::load_from_memory_with_format(bytes, ImageFormat::Png)?)
}
