//! Screen-to-image coordinate mapping
//!
//! Clients report the region of interest in their own screen pixels, which
//! rarely match the pixel grid of the captured image.

use super::types::OcrError;

/// Region of interest in client screen pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Region {
    pub left: i64,
    pub top: i64,
    pub width: i64,
    pub height: i64,
}

impl Region {
    pub fn new(left: i64, top: i64, width: i64, height: i64) -> Self {
        Self { left, top, width, height }
    }

    /// Zero-sized regions mean "whole image".
    pub fn is_unset(&self) -> bool {
        self.width == 0 && self.height == 0
    }
}

/// Screen-to-image scale; both factors are always positive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactor {
    pub sx: f64,
    pub sy: f64,
}

impl Default for ScaleFactor {
    fn default() -> Self {
        Self { sx: 1.0, sy: 1.0 }
    }
}

impl ScaleFactor {
    /// Unknown or non-positive screen dimensions scale by 1.0.
    pub fn from_sizes(image: (u32, u32), screen: (f64, f64)) -> Self {
        let factor = |image_dim: u32, screen_dim: f64| {
            if screen_dim > 0.0 && screen_dim.is_finite() {
                image_dim as f64 / screen_dim
            } else {
                1.0
            }
        };

        Self {
            sx: factor(image.0, screen.0),
            sy: factor(image.1, screen.1),
        }
    }
}

/// Region in source-image pixels, `left < right <= width`, `top < bottom <= height`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRegion {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl PixelRegion {
    pub fn full(width: u32, height: u32) -> Self {
        Self { left: 0, top: 0, right: width, bottom: height }
    }

    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    pub fn is_full(&self, width: u32, height: u32) -> bool {
        *self == Self::full(width, height)
    }
}

/// Map a client region onto the image grid.
///
/// Coordinates are truncated toward zero, never rounded, and out-of-bounds
/// regions are rejected rather than clamped.
pub fn map_region(
    region: Option<Region>,
    screen: (f64, f64),
    image: (u32, u32),
) -> Result<PixelRegion, OcrError> {
    let (image_width, image_height) = image;

    let region = match region {
        Some(region) if !region.is_unset() => region,
        _ => return Ok(PixelRegion::full(image_width, image_height)),
    };

    // Float casts saturate; the sums saturate too.
    let scale = ScaleFactor::from_sizes(image, screen);
    let left = (region.left as f64 * scale.sx) as i64;
    let top = (region.top as f64 * scale.sy) as i64;
    let right = left.saturating_add((region.width as f64 * scale.sx) as i64);
    let bottom = top.saturating_add((region.height as f64 * scale.sy) as i64);

    tracing::debug!(
        sx = scale.sx,
        sy = scale.sy,
        left, top, right, bottom,
        "Mapped region to image pixels"
    );

    if left < 0 || top < 0 || right > image_width as i64 || bottom > image_height as i64 {
        return Err(OcrError::CropOutOfBounds {
            left,
            top,
            right,
            bottom,
            width: image_width,
            height: image_height,
        });
    }

    if right <= left || bottom <= top {
        return Err(OcrError::EmptyRegion {
            width: right.saturating_sub(left),
            height: bottom.saturating_sub(top),
        });
    }

    Ok(PixelRegion {
        left: left as u32,
        top: top as u32,
        right: right as u32,
        bottom: bottom as u32,
    })
}
