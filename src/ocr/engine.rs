//! Recognition engines
//!
//! The recognition model is an opaque collaborator: prepared image in,
//! engine-shaped detections out. Engines are built once at startup and
//! shared read-only between requests.

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use image::RgbImage;

use super::normalize::RecognitionOutput;
use super::types::OcrError;

/// Recognition engine trait
///
/// Implementations must tolerate concurrent `predict` calls; requests are not
/// serialized in front of the engine.
#[async_trait]
pub trait RecognitionEngine: Send + Sync {
    /// Engine name for logs
    fn name(&self) -> &str;

    /// Run detection + recognition on a prepared image
    async fn predict(&self, image: RgbImage) -> Result<RecognitionOutput, OcrError>;
}

/// Engine served over HTTP
///
/// Posts `{"image": "<base64 png>"}` to the inference endpoint and expects the
/// raw predict output as the JSON response body.
pub struct HttpRecognitionEngine {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRecognitionEngine {
    pub fn new(endpoint: &str) -> Result<Self, OcrError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| OcrError::Recognition(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn default_url() -> Result<Self, OcrError> {
        Self::new("http://localhost:8866/predict")
    }
}

#[async_trait]
impl RecognitionEngine for HttpRecognitionEngine {
    fn name(&self) -> &str {
        "http"
    }

    async fn predict(&self, image: RgbImage) -> Result<RecognitionOutput, OcrError> {
        use base64::Engine;

        let png = tokio::task::spawn_blocking(move || encode_png(&image))
            .await
            .map_err(|e| OcrError::Recognition(format!("PNG encoder task failed: {}", e)))??;

        let request = serde_json::json!({
            "image": base64::engine::general_purpose::STANDARD.encode(&png),
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                OcrError::Recognition(format!("Failed to call recognition engine: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::Recognition(format!(
                "Recognition engine returned {}: {}",
                status, body
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| OcrError::Recognition(format!("Failed to parse engine response: {}", e)))?;

        RecognitionOutput::detect(body)
    }
}

/// Encode an image as PNG bytes
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, OcrError> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
        .map_err(|e| OcrError::Recognition(format!("Failed to encode image: {}", e)))?;
    Ok(buffer)
}

/// Mock engine for testing
#[cfg(test)]
pub struct MockEngine {
    pub output: serde_json::Value,
    pub delay: Option<Duration>,
    pub calls: std::sync::atomic::AtomicUsize,
    pub last_size: std::sync::Mutex<Option<(u32, u32)>>,
}

#[cfg(test)]
impl MockEngine {
    pub fn returning(output: serde_json::Value) -> Self {
        Self {
            output,
            delay: None,
            calls: std::sync::atomic::AtomicUsize::new(0),
            last_size: std::sync::Mutex::new(None),
        }
    }

    pub fn slow(output: serde_json::Value, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::returning(output)
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl RecognitionEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn predict(&self, image: RgbImage) -> Result<RecognitionOutput, OcrError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        *self.last_size.lock().unwrap() = Some(image.dimensions());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        RecognitionOutput::detect(self.output.clone())
    }
}
