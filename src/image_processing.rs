//! Upload decoding and validated pixel access
//!
//! The matcher assumes validated input, so coordinate bounds are checked
//! here, against the decoded image's real dimensions, before any lookup.

use image::RgbImage;

use crate::error::AppError;
use crate::palette::Rgb;

/// Decode uploaded image bytes (png or jpeg) into an RGB pixel grid
pub fn decode_image(data: &[u8]) -> Result<RgbImage, AppError> {
    let img = image::load_from_memory(data)
        .map_err(|e| AppError::ImageDecode(format!("failed to decode image: {}", e)))?;
    Ok(img.to_rgb8())
}

/// Read the pixel at (x, y), rejecting coordinates outside the grid
pub fn pixel_at(img: &RgbImage, x: u32, y: u32) -> Result<Rgb, AppError> {
    let (width, height) = img.dimensions();
    if x >= width || y >= height {
        return Err(AppError::OutOfBoundsCoordinate {
            x,
            y,
            width,
            height,
        });
    }

    let p = img.get_pixel(x, y);
    Ok(Rgb::new(p[0], p[1], p[2]))
}
