//! OCR Service
//!
//! Orchestrates the region pipeline: decode, map the client region, crop,
//! prepare, recognize under a deadline, normalize.

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use image::{DynamicImage, ImageReader, RgbImage};

use super::{
    debug::DebugArtifacts,
    engine::RecognitionEngine,
    geometry::{map_region, Region},
    normalize::normalize,
    preprocess::{self, DEFAULT_MAX_PIXELS, DEFAULT_MAX_SIDE},
    types::{DebugInfo, OcrError, OcrResponse},
};
use crate::executor::{BoundedExecutor, ExecutionError};

/// OCR service configuration
#[derive(Debug, Clone)]
pub struct OcrServiceConfig {
    /// Longest side of the prepared image
    pub max_side: u32,
    /// Largest accepted input, in pixels
    pub max_pixels: u64,
    /// Recognition deadline
    pub timeout: Duration,
    /// Save debug artifacts for every request
    pub debug_images: bool,
    /// Where debug artifacts go
    pub debug_dir: PathBuf,
}

impl Default for OcrServiceConfig {
    fn default() -> Self {
        Self {
            max_side: DEFAULT_MAX_SIDE,
            max_pixels: DEFAULT_MAX_PIXELS,
            timeout: Duration::from_secs(120),
            debug_images: false,
            debug_dir: PathBuf::from("debug_images"),
        }
    }
}

/// One OCR request's inputs
#[derive(Debug, Clone)]
pub struct RegionRequest {
    pub image: Vec<u8>,
    pub region: Region,
    pub screen: (f64, f64),
    pub debug: bool,
}

/// OCR service for screen-region recognition
pub struct OcrService {
    config: OcrServiceConfig,
    engine: Arc<dyn RecognitionEngine>,
    executor: BoundedExecutor,
}

impl OcrService {
    /// Create a new OCR service
    pub fn new(config: OcrServiceConfig, engine: Arc<dyn RecognitionEngine>) -> Self {
        let executor = BoundedExecutor::new(config.timeout);
        Self { config, engine, executor }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Recognize text in the requested region of a screen capture
    pub async fn recognize_region(&self, request: RegionRequest) -> Result<OcrResponse, OcrError> {
        let artifacts = DebugArtifacts::new(
            &self.config.debug_dir,
            self.config.debug_images || request.debug,
        );

        let config = self.config.clone();
        let stage_artifacts = artifacts.clone();
        let prepared = tokio::task::spawn_blocking(move || {
            prepare_region(&config, &stage_artifacts, &request)
        })
        .await
        .map_err(|e| OcrError::PreprocessingFailed(format!("Preparation task failed: {}", e)))??;

        let engine = Arc::clone(&self.engine);
        let output = self
            .executor
            .run(async move { engine.predict(prepared).await })
            .await
            .map_err(|e| match e {
                ExecutionError::TimedOut(_) => OcrError::Timeout,
                other => OcrError::Recognition(other.to_string()),
            })??;

        tracing::debug!(shape = output.kind(), engine = self.engine.name(), "Recognition finished");

        let result = normalize(output);
        let debug = artifacts.enabled().then(|| DebugInfo {
            tag: artifacts.tag().to_string(),
            saved_images: artifacts.enabled(),
        });

        Ok(OcrResponse { result, debug })
    }
}

/// Decode, validate, crop and prepare. CPU-bound; runs on the blocking pool.
fn prepare_region(
    config: &OcrServiceConfig,
    artifacts: &DebugArtifacts,
    request: &RegionRequest,
) -> Result<RgbImage, OcrError> {
    let full = decode_image(&request.image, config.max_pixels)?;
    tracing::debug!(width = full.width(), height = full.height(), "Image loaded");
    artifacts.save("full", &full);

    let pixel_region = map_region(
        Some(request.region),
        request.screen,
        (full.width(), full.height()),
    )?;

    let roi = if pixel_region.is_full(full.width(), full.height()) {
        full
    } else {
        full.crop_imm(
            pixel_region.left,
            pixel_region.top,
            pixel_region.width(),
            pixel_region.height(),
        )
    };
    tracing::debug!(width = roi.width(), height = roi.height(), "Region of interest");
    artifacts.save("crop", &roi);

    let prepared =
        preprocess::prepare_with(&roi, config.max_side, |scaled| artifacts.save("scaled", scaled))?;
    if artifacts.enabled() {
        artifacts.save("proc", &DynamicImage::ImageRgb8(prepared.clone()));
    }

    Ok(prepared)
}

/// Decode an uploaded image, checking the pixel budget from the header first
fn decode_image(bytes: &[u8], max_pixels: u64) -> Result<DynamicImage, OcrError> {
    let reader = || {
        ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| OcrError::ImageDecode(e.to_string()))
    };

    let (width, height) = reader()?
        .into_dimensions()
        .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
    preprocess::ensure_within_pixel_limit(width, height, max_pixels)?;

    reader()?
        .decode()
        .map_err(|e| OcrError::ImageDecode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::engine::{encode_png, MockEngine};
    use serde_json::json;
    use tempfile::TempDir;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        encode_png(&image).unwrap()
    }

    fn structured_output() -> serde_json::Value {
        json!([{
            "rec_texts": ["A", "B"],
            "rec_scores": [0.9, 0.5],
            "rec_boxes": [[0, 0, 1, 1], [0, 2, 1, 3]]
        }])
    }

    fn request(image: Vec<u8>, region: Region, screen: (f64, f64)) -> RegionRequest {
        RegionRequest { image, region, screen, debug: false }
    }

    #[tokio::test]
    async fn test_recognize_crops_scaled_region() {
        let engine = Arc::new(MockEngine::returning(structured_output()));
        let service = OcrService::new(OcrServiceConfig::default(), engine.clone());

        let response = service
            .recognize_region(request(png(200, 100), Region::new(10, 10, 20, 10), (100.0, 50.0)))
            .await
            .unwrap();

        assert_eq!(response.result.text, "A\nB");
        assert!(response.debug.is_none());
        assert_eq!(*engine.last_size.lock().unwrap(), Some((40, 20)));
    }

    #[tokio::test]
    async fn test_out_of_bounds_region_never_reaches_engine() {
        let engine = Arc::new(MockEngine::returning(structured_output()));
        let service = OcrService::new(OcrServiceConfig::default(), engine.clone());

        let result = service
            .recognize_region(request(png(100, 100), Region::new(50, 50, 80, 80), (0.0, 0.0)))
            .await;

        assert!(matches!(result, Err(OcrError::CropOutOfBounds { .. })));
        assert_eq!(engine.call_count(), 0);
    }

    #[tokio::test]
    async fn test_oversized_image_is_rejected_before_decode() {
        let engine = Arc::new(MockEngine::returning(structured_output()));
        let config = OcrServiceConfig {
            max_pixels: 1_000,
            ..Default::default()
        };
        let service = OcrService::new(config, engine);

        let result = service
            .recognize_region(request(png(50, 50), Region::default(), (0.0, 0.0)))
            .await;
        assert!(matches!(result, Err(OcrError::ImageTooLarge { pixels: 2_500, max: 1_000 })));
    }

    #[tokio::test]
    async fn test_garbage_bytes_are_a_decode_error() {
        let engine = Arc::new(MockEngine::returning(structured_output()));
        let service = OcrService::new(OcrServiceConfig::default(), engine);

        let result = service
            .recognize_region(request(
                b"definitely not an image".to_vec(),
                Region::default(),
                (0.0, 0.0),
            ))
            .await;
        assert!(matches!(result, Err(OcrError::ImageDecode(_))));
    }

    #[tokio::test]
    async fn test_slow_engine_times_out() {
        let engine = Arc::new(MockEngine::slow(structured_output(), Duration::from_secs(5)));
        let config = OcrServiceConfig {
            timeout: Duration::from_millis(100),
            ..Default::default()
        };
        let service = OcrService::new(config, engine);

        let result = service
            .recognize_region(request(png(20, 20), Region::default(), (0.0, 0.0)))
            .await;
        assert!(matches!(result, Err(OcrError::Timeout)));
    }

    #[tokio::test]
    async fn test_debug_mode_saves_every_stage() {
        let temp_dir = TempDir::new().unwrap();
        let engine = Arc::new(MockEngine::returning(json!([])));
        let config = OcrServiceConfig {
            debug_dir: temp_dir.path().to_path_buf(),
            ..Default::default()
        };
        let service = OcrService::new(config, engine);

        let mut req = request(png(30, 30), Region::default(), (0.0, 0.0));
        req.debug = true;
        let response = service.recognize_region(req).await.unwrap();

        let debug = response.debug.unwrap();
        assert!(debug.saved_images);
        for stage in ["full", "crop", "scaled", "proc"] {
            let path = temp_dir.path().join(format!("{}_{}.jpg", debug.tag, stage));
            assert!(path.exists(), "missing {}", path.display());
        }
    }
}
