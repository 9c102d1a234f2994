//! OCR Types
//!
//! Request, response and error types for region OCR of screen captures.

use serde::{Deserialize, Serialize};

use super::geometry::Region;

/// Raw region fields of an OCR request, exactly as the client sent them.
///
/// Every field is kept as text so that a malformed value can fall back to
/// "no region" instead of failing the request.
#[derive(Debug, Clone, Default)]
pub struct RegionForm {
    pub left: Option<String>,
    pub top: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    /// JSON object with the same four keys
    pub crop: Option<String>,
    pub screen_width: Option<String>,
    pub screen_height: Option<String>,
}

impl RegionForm {
    /// Resolve the region of interest.
    ///
    /// Plain fields win. When they are absent or both dimensions are zero the
    /// `crop` JSON is consulted. Anything unparsable yields the all-zero region,
    /// which the mapper treats as the whole image.
    pub fn region(&self) -> Region {
        let fields = [&self.left, &self.top, &self.width, &self.height];
        let parsed: Option<Vec<i64>> = fields
            .iter()
            .map(|field| match field {
                Some(raw) => raw.trim().parse::<i64>().ok(),
                None => Some(0),
            })
            .collect();

        let region = parsed
            .map(|v| Region::new(v[0], v[1], v[2], v[3]))
            .unwrap_or_default();

        if !region.is_unset() {
            return region;
        }

        match &self.crop {
            Some(raw) => parse_crop_json(raw).unwrap_or_default(),
            None => region,
        }
    }

    /// Client screen size; non-numeric values count as unknown (0).
    pub fn screen_size(&self) -> (f64, f64) {
        let parse = |field: &Option<String>| -> Option<f64> {
            match field {
                Some(raw) => raw.trim().parse::<f64>().ok(),
                None => Some(0.0),
            }
        };

        match (parse(&self.screen_width), parse(&self.screen_height)) {
            (Some(w), Some(h)) => (w, h),
            _ => (0.0, 0.0),
        }
    }
}

fn parse_crop_json(raw: &str) -> Option<Region> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;

    let field = |key: &str| -> Option<i64> {
        match object.get(key) {
            None | Some(serde_json::Value::Null) => Some(0),
            Some(serde_json::Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
            Some(serde_json::Value::String(s)) => s.trim().parse::<i64>().ok(),
            Some(_) => None,
        }
    };

    Some(Region::new(
        field("left")?,
        field("top")?,
        field("width")?,
        field("height")?,
    ))
}

/// One recognized text span
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionRecord {
    pub text: String,
    /// Recognition confidence (0-1)
    pub confidence: f64,
    /// Bounding polygon in prepared-image pixels
    #[serde(rename = "box")]
    pub polygon: Vec<[f64; 2]>,
}

/// Normalized recognition result
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecognitionResponse {
    pub lines: Vec<DetectionRecord>,
    /// Line texts joined with '\n', in engine order
    pub text: String,
}

impl RecognitionResponse {
    pub fn from_records(lines: Vec<DetectionRecord>) -> Self {
        let text = lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Self { lines, text }
    }
}

/// Debug artifact summary attached to a response
#[derive(Debug, Clone, Serialize)]
pub struct DebugInfo {
    pub tag: String,
    pub saved_images: bool,
}

/// HTTP body for `POST /ocr`
#[derive(Debug, Clone, Serialize)]
pub struct OcrResponse {
    #[serde(flatten)]
    pub result: RecognitionResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugInfo>,
}

/// Query flags for `POST /ocr`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OcrQuery {
    #[serde(default)]
    pub mode: Option<String>,
}

impl OcrQuery {
    pub fn is_debug(&self) -> bool {
        self.mode.as_deref() == Some("debug")
    }
}

/// OCR error types
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("No image uploaded")]
    MissingImage,

    #[error("Failed to load image: {0}")]
    ImageDecode(String),

    #[error("Image too large ({pixels} pixels, max {max})")]
    ImageTooLarge { pixels: u64, max: u64 },

    #[error(
        "Crop region exceeds image bounds: crop=({left},{top},{right},{bottom}), \
         image={width}x{height}"
    )]
    CropOutOfBounds {
        left: i64,
        top: i64,
        right: i64,
        bottom: i64,
        width: u32,
        height: u32,
    },

    #[error("Crop region is empty: {width}x{height}")]
    EmptyRegion { width: i64, height: i64 },

    #[error("Image preprocessing failed: {0}")]
    PreprocessingFailed(String),

    #[error("OCR failed: {0}")]
    Recognition(String),

    #[error("Unrecognized engine output: {0}")]
    UnrecognizedOutput(String),

    #[error("OCR processing timeout")]
    Timeout,
}

impl OcrError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::MissingImage
            | Self::ImageDecode(_)
            | Self::ImageTooLarge { .. }
            | Self::CropOutOfBounds { .. }
            | Self::EmptyRegion { .. } => StatusCode::BAD_REQUEST,
            // Timeouts are reported as plain processing failures on this route
            Self::PreprocessingFailed(_)
            | Self::Recognition(_)
            | Self::UnrecognizedOutput(_)
            | Self::Timeout => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
