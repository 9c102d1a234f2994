//! Image preparation for recognition
//!
//! Bounded resize, luminance conversion and CLAHE (contrast-limited adaptive
//! histogram equalization), re-expanded to three channels for the engine.

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, RgbImage};

use super::types::OcrError;

/// Default longest side after resizing
pub const DEFAULT_MAX_SIDE: u32 = 4000;

/// Default input limit: 50 megapixels
pub const DEFAULT_MAX_PIXELS: u64 = 50_000_000;

/// CLAHE clip limit, relative to a uniform histogram
pub const CLAHE_CLIP_LIMIT: f64 = 3.0;

/// CLAHE tile grid (tiles per axis)
pub const CLAHE_GRID: u32 = 8;

const BINS: usize = 256;

/// Reject inputs whose pixel count exceeds `max_pixels`.
pub fn ensure_within_pixel_limit(width: u32, height: u32, max_pixels: u64) -> Result<(), OcrError> {
    let pixels = width as u64 * height as u64;
    if pixels > max_pixels {
        return Err(OcrError::ImageTooLarge { pixels, max: max_pixels });
    }
    Ok(())
}

/// Target size so that neither side exceeds `max_side`. Never upscales.
pub fn scaled_dimensions(width: u32, height: u32, max_side: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }
    let max_side = max_side as f64;
    let scale = (max_side / width as f64)
        .min(max_side / height as f64)
        .min(1.0);
    ((width as f64 * scale) as u32, (height as f64 * scale) as u32)
}

/// Shrink the image so its longest side fits within `max_side`.
pub fn resize_to_max_side(image: &DynamicImage, max_side: u32) -> Result<DynamicImage, OcrError> {
    let (width, height) = (image.width(), image.height());
    let (new_width, new_height) = scaled_dimensions(width, height, max_side);

    if new_width == 0 || new_height == 0 {
        return Err(OcrError::PreprocessingFailed(format!(
            "Image preprocessing resulted in empty image ({}x{} -> {}x{})",
            width, height, new_width, new_height
        )));
    }

    if (new_width, new_height) == (width, height) {
        return Ok(image.clone());
    }

    Ok(image.resize_exact(new_width, new_height, FilterType::CatmullRom))
}

/// Luminance + CLAHE, returned as a 3-channel image with identical channels.
pub fn enhance_contrast(image: &DynamicImage) -> RgbImage {
    let gray = image.to_luma8();
    let enhanced = clahe(&gray, CLAHE_CLIP_LIMIT, CLAHE_GRID);
    DynamicImage::ImageLuma8(enhanced).to_rgb8()
}

/// Full preparation pipeline.
pub fn prepare(image: &DynamicImage, max_side: u32) -> Result<RgbImage, OcrError> {
    prepare_with(image, max_side, |_| {})
}

/// [`prepare`], handing the resized intermediate to `on_scaled` before
/// contrast enhancement.
pub fn prepare_with<F>(
    image: &DynamicImage,
    max_side: u32,
    on_scaled: F,
) -> Result<RgbImage, OcrError>
where
    F: FnOnce(&DynamicImage),
{
    let scaled = resize_to_max_side(image, max_side)?;
    on_scaled(&scaled);
    let prepared = enhance_contrast(&scaled);

    if prepared.width() == 0 || prepared.height() == 0 {
        return Err(OcrError::PreprocessingFailed(
            "Image preprocessing resulted in empty image".to_string(),
        ));
    }
    Ok(prepared)
}

/// Contrast-limited adaptive histogram equalization.
///
/// The image is split into a `grid x grid` set of tiles (fewer when the image
/// is smaller than the grid). Each tile gets a clipped, equalized lookup
/// table; pixels blend the tables of the four nearest tile centers.
pub fn clahe(image: &GrayImage, clip_limit: f64, grid: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let tiles_x = grid.clamp(1, width) as usize;
    let tiles_y = grid.clamp(1, height) as usize;

    let x_bounds = tile_bounds(width, tiles_x);
    let y_bounds = tile_bounds(height, tiles_y);

    let mut luts = vec![[0u8; BINS]; tiles_x * tiles_y];
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let (x0, x1) = (x_bounds[tx], x_bounds[tx + 1]);
            let (y0, y1) = (y_bounds[ty], y_bounds[ty + 1]);

            let mut hist = [0u32; BINS];
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[image.get_pixel(x, y)[0] as usize] += 1;
                }
            }

            let area = (x1 - x0) * (y1 - y0);
            luts[ty * tiles_x + tx] = tile_lut(&mut hist, area, clip_limit);
        }
    }

    let tile_w = width as f64 / tiles_x as f64;
    let tile_h = height as f64 / tiles_y as f64;

    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        let (ty1, ty2, ya) = neighbours(y, tile_h, tiles_y);
        for x in 0..width {
            let (tx1, tx2, xa) = neighbours(x, tile_w, tiles_x);
            let v = image.get_pixel(x, y)[0] as usize;

            let top = luts[ty1 * tiles_x + tx1][v] as f64 * (1.0 - xa)
                + luts[ty1 * tiles_x + tx2][v] as f64 * xa;
            let bottom = luts[ty2 * tiles_x + tx1][v] as f64 * (1.0 - xa)
                + luts[ty2 * tiles_x + tx2][v] as f64 * xa;
            let blended = top * (1.0 - ya) + bottom * ya;

            out.put_pixel(x, y, image::Luma([blended.round().clamp(0.0, 255.0) as u8]));
        }
    }
    out
}

fn tile_bounds(len: u32, tiles: usize) -> Vec<u32> {
    (0..=tiles)
        .map(|i| (i as u64 * len as u64 / tiles as u64) as u32)
        .collect()
}

/// Lower/upper tile index along one axis and the blend weight of the upper one.
fn neighbours(pos: u32, tile_len: f64, tiles: usize) -> (usize, usize, f64) {
    let f = (pos as f64 + 0.5) / tile_len - 0.5;
    let lower = f.floor();
    let weight = f - lower;

    let last = tiles as i64 - 1;
    let i1 = (lower as i64).clamp(0, last) as usize;
    let i2 = (lower as i64 + 1).clamp(0, last) as usize;
    (i1, i2, weight)
}

fn tile_lut(hist: &mut [u32; BINS], area: u32, clip_limit: f64) -> [u8; BINS] {
    let mut lut = [0u8; BINS];
    if area == 0 {
        return lut;
    }

    if clip_limit > 0.0 {
        let limit = ((clip_limit * area as f64 / BINS as f64) as u32).max(1);

        let mut clipped = 0u32;
        for bin in hist.iter_mut() {
            if *bin > limit {
                clipped += *bin - limit;
                *bin = limit;
            }
        }

        // Hand the clipped mass back evenly, the remainder spread by stride
        let batch = clipped / BINS as u32;
        let residual = (clipped - batch * BINS as u32) as usize;
        for bin in hist.iter_mut() {
            *bin += batch;
        }
        if residual > 0 {
            let step = (BINS / residual).max(1);
            for i in (0..BINS).step_by(step).take(residual) {
                hist[i] += 1;
            }
        }
    }

    let scale = (BINS - 1) as f64 / area as f64;
    let mut sum = 0u32;
    for (i, bin) in hist.iter().enumerate() {
        sum += bin;
        lut[i] = (sum as f64 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    #[test]
    fn test_downscale_preserves_aspect_ratio() {
        assert_eq!(scaled_dimensions(8000, 4000, 4000), (4000, 2000));
        assert_eq!(scaled_dimensions(2000, 8000, 4000), (1000, 4000));
    }

    #[test]
    fn test_never_upscales() {
        assert_eq!(scaled_dimensions(1200, 800, 4000), (1200, 800));
    }

    #[test]
    fn test_prepare_large_image() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(8000, 4000, Rgb([120, 30, 200])));
        let prepared = prepare(&image, 4000).unwrap();
        assert_eq!(prepared.dimensions(), (4000, 2000));
    }

    #[test]
    fn test_prepare_with_exposes_scaled_stage() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_fn(200, 100, |x, _| {
            Rgb([(x % 256) as u8, 40, 40])
        }));

        let mut scaled_size = None;
        let prepared = prepare_with(&image, 50, |scaled| {
            scaled_size = Some((scaled.width(), scaled.height()));
        })
        .unwrap();

        assert_eq!(scaled_size, Some((50, 25)));
        assert_eq!(prepared, prepare(&image, 50).unwrap());
    }

    #[test]
    fn test_prepared_channels_are_identical() {
        let image = RgbImage::from_fn(64, 48, |x, y| Rgb([(x * 3) as u8, (y * 5) as u8, 90]));
        let prepared = prepare(&DynamicImage::ImageRgb8(image), 4000).unwrap();

        assert_eq!(prepared.dimensions(), (64, 48));
        for pixel in prepared.pixels() {
            assert_eq!(pixel[0], pixel[1]);
            assert_eq!(pixel[1], pixel[2]);
        }
    }

    #[test]
    fn test_sliver_that_vanishes_is_rejected() {
        let image = DynamicImage::ImageLuma8(GrayImage::new(1, 10_000));
        let result = prepare(&image, 4000);
        assert!(matches!(result, Err(OcrError::PreprocessingFailed(_))));
    }

    #[test]
    fn test_pixel_limit() {
        assert!(ensure_within_pixel_limit(7000, 7000, DEFAULT_MAX_PIXELS).is_ok());
        assert!(matches!(
            ensure_within_pixel_limit(8000, 7000, DEFAULT_MAX_PIXELS),
            Err(OcrError::ImageTooLarge { pixels: 56_000_000, .. })
        ));
    }

    #[test]
    fn test_clahe_stretches_low_contrast_ramp() {
        // Values squeezed into 100..=131
        let image = GrayImage::from_fn(128, 128, |x, _| Luma([100 + (x / 4) as u8]));
        let enhanced = clahe(&image, CLAHE_CLIP_LIMIT, CLAHE_GRID);

        let range = |img: &GrayImage| {
            let min = img.pixels().map(|p| p[0]).min().unwrap();
            let max = img.pixels().map(|p| p[0]).max().unwrap();
            max - min
        };
        assert!(range(&enhanced) > range(&image));
    }

    #[test]
    fn test_clahe_uniform_tile_stays_uniform() {
        let image = GrayImage::from_pixel(40, 40, Luma([77]));
        let enhanced = clahe(&image, CLAHE_CLIP_LIMIT, CLAHE_GRID);
        let first = enhanced.get_pixel(0, 0)[0];
        assert!(enhanced.pixels().all(|p| p[0] == first));
    }

    #[test]
    fn test_clahe_handles_images_smaller_than_grid() {
        let image = GrayImage::from_fn(3, 2, |x, y| Luma([(x * 40 + y * 10) as u8]));
        let enhanced = clahe(&image, CLAHE_CLIP_LIMIT, CLAHE_GRID);
        assert_eq!(enhanced.dimensions(), (3, 2));
    }
}
