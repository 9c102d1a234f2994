//! Recognition output normalization
//!
//! Engines emit one of two layouts:
//!
//! - **Structured**: one record of parallel arrays
//!   `{"rec_texts": [...], "rec_scores": [...], "rec_boxes": [...]}`, usually
//!   wrapped in a single-element list.
//! - **Nested** (legacy): a list of per-line blocks, each a list of
//!   `[polygon, [text, score]]` entries. Blocks and entries may be empty,
//!   null or malformed.
//!
//! Both are reduced to `RecognitionResponse`, keeping engine order.

use serde::Deserialize;
use serde_json::Value;

use super::types::{DetectionRecord, OcrError, RecognitionResponse};

/// Parallel-array engine output
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StructuredOutput {
    #[serde(default, rename = "rec_texts")]
    pub texts: Vec<String>,
    #[serde(default, rename = "rec_scores")]
    pub scores: Vec<f64>,
    #[serde(default, rename = "rec_boxes")]
    pub boxes: Vec<Value>,
}

/// Engine output, tagged by layout
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionOutput {
    Structured(StructuredOutput),
    /// Blocks are kept raw; entries are unpacked one by one during normalization
    Nested(Vec<Value>),
}

impl RecognitionOutput {
    /// Detect the layout from the top-level JSON structure.
    pub fn detect(value: Value) -> Result<Self, OcrError> {
        match value {
            Value::Object(map) => Self::structured(Value::Object(map)),
            Value::Array(mut items) => {
                if matches!(items.first(), Some(Value::Object(_))) {
                    Self::structured(items.swap_remove(0))
                } else {
                    Ok(Self::Nested(items))
                }
            }
            Value::Null => Ok(Self::Nested(Vec::new())),
            other => Err(OcrError::UnrecognizedOutput(format!(
                "expected a list or an object, got {}",
                json_kind(&other)
            ))),
        }
    }

    fn structured(value: Value) -> Result<Self, OcrError> {
        serde_json::from_value::<StructuredOutput>(value)
            .map(Self::Structured)
            .map_err(|e| {
                OcrError::UnrecognizedOutput(format!("malformed structured output: {}", e))
            })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Structured(_) => "structured",
            Self::Nested(_) => "nested",
        }
    }
}

/// Reduce engine output to the canonical response.
pub fn normalize(output: RecognitionOutput) -> RecognitionResponse {
    let records = match output {
        RecognitionOutput::Structured(structured) => normalize_structured(structured),
        RecognitionOutput::Nested(blocks) => normalize_nested(&blocks),
    };
    RecognitionResponse::from_records(records)
}

fn normalize_structured(output: StructuredOutput) -> Vec<DetectionRecord> {
    output
        .texts
        .into_iter()
        .zip(output.scores)
        .zip(output.boxes)
        .map(|((text, confidence), raw_box)| {
            let polygon = parse_box(&raw_box).unwrap_or_else(|| {
                tracing::debug!(text = %text, raw_box = %raw_box, "Unparsable box");
                Vec::new()
            });
            DetectionRecord { text, confidence, polygon }
        })
        .collect()
}

fn normalize_nested(blocks: &[Value]) -> Vec<DetectionRecord> {
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for block in blocks {
        let Some(entries) = block.as_array() else {
            continue;
        };
        for entry in entries {
            match parse_entry(entry) {
                Some(record) => records.push(record),
                None => skipped += 1,
            }
        }
    }

    if skipped > 0 {
        tracing::debug!(skipped, kept = records.len(), "Dropped malformed recognition entries");
    }
    records
}

/// `[polygon, [text, score]]`
fn parse_entry(entry: &Value) -> Option<DetectionRecord> {
    let parts = entry.as_array()?;
    let polygon = parse_points(parts.first()?)?;

    let recognized = parts.get(1)?.as_array()?;
    let text = recognized.first()?.as_str()?.to_string();
    let confidence = as_number(recognized.get(1)?)?;

    Some(DetectionRecord { text, confidence, polygon })
}

/// A box is either a list of points or a flat `[x1, y1, x2, y2]` rectangle.
fn parse_box(value: &Value) -> Option<Vec<[f64; 2]>> {
    let items = value.as_array()?;
    if items.len() == 4 && items.iter().all(Value::is_number) {
        let c: Vec<f64> = items.iter().filter_map(as_number).collect();
        return Some(vec![[c[0], c[1]], [c[2], c[1]], [c[2], c[3]], [c[0], c[3]]]);
    }
    parse_points(value)
}

fn parse_points(value: &Value) -> Option<Vec<[f64; 2]>> {
    value
        .as_array()?
        .iter()
        .map(|point| {
            let xy = point.as_array()?;
            match xy.as_slice() {
                [x, y] => Some([as_number(x)?, as_number(y)?]),
                _ => None,
            }
        })
        .collect()
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
