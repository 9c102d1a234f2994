//! OCR Module
//!
//! Region OCR for screen captures.
//!
//! Pipeline: client region -> image pixels (`geometry`) -> crop -> bounded
//! resize + CLAHE (`preprocess`) -> recognition engine under a deadline
//! (`engine`, `crate::executor`) -> canonical lines (`normalize`).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docintel_server::ocr::{
//!     HttpRecognitionEngine, OcrService, OcrServiceConfig, Region, RegionRequest,
//! };
//!
//! let engine = Arc::new(HttpRecognitionEngine::default_url()?);
//! let service = OcrService::new(OcrServiceConfig::default(), engine);
//!
//! let response = service.recognize_region(RegionRequest {
//!     image: png_bytes,
//!     region: Region::new(10, 10, 100, 50),
//!     screen: (390.0, 844.0),
//!     debug: false,
//! }).await?;
//! println!("{}", response.result.text);
//! ```

mod debug;
mod engine;
mod geometry;
mod normalize;
pub mod preprocess;
mod service;
mod types;

pub use debug::DebugArtifacts;
pub use engine::{encode_png, HttpRecognitionEngine, RecognitionEngine};
pub use geometry::{map_region, PixelRegion, Region, ScaleFactor};
pub use normalize::{normalize, RecognitionOutput, StructuredOutput};
pub use service::{OcrService, OcrServiceConfig, RegionRequest};
pub use types::{
    DebugInfo, DetectionRecord, OcrError, OcrQuery, OcrResponse, RecognitionResponse, RegionForm,
};

#[cfg(test)]
pub use engine::MockEngine;
