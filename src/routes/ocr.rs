//! OCR Routes
//!
//! Endpoints:
//! - POST /ocr - Recognize text in a region of an uploaded screen capture
//!
//! Multipart fields: `image` (required), `left`, `top`, `width`, `height` or a
//! JSON `crop` object with the same keys, `screenWidth`, `screenHeight`.
//! `?mode=debug` saves the intermediate images.

use axum::{
    extract::{multipart::Field, DefaultBodyLimit, Multipart, Query, State},
    routing::post,
    Json, Router,
};
use uuid::Uuid;

use crate::error::Result;
use crate::ocr::{OcrError, OcrQuery, OcrResponse, RegionForm, RegionRequest};
use crate::state::AppState;

/// Largest accepted multipart body: 64MB
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Create the OCR router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(recognize))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// POST /ocr
async fn recognize(
    State(state): State<AppState>,
    Query(query): Query<OcrQuery>,
    mut multipart: Multipart,
) -> Result<Json<OcrResponse>> {
    let request_id = Uuid::new_v4();

    let mut image: Option<Vec<u8>> = None;
    let mut form = RegionForm::default();
    let mut field_names = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => image = Some(field.bytes().await?.to_vec()),
            "left" => form.left = Some(field_text(field).await?),
            "top" => form.top = Some(field_text(field).await?),
            "width" => form.width = Some(field_text(field).await?),
            "height" => form.height = Some(field_text(field).await?),
            "crop" => form.crop = Some(field_text(field).await?),
            "screenWidth" => form.screen_width = Some(field_text(field).await?),
            "screenHeight" => form.screen_height = Some(field_text(field).await?),
            _ => {}
        }
        field_names.push(name);
    }

    tracing::info!(
        request_id = %request_id,
        fields = ?field_names,
        debug = query.is_debug(),
        "Processing OCR request"
    );

    let image = image.ok_or(OcrError::MissingImage)?;
    let region = form.region();
    let screen = form.screen_size();

    let response = state
        .ocr()
        .recognize_region(RegionRequest {
            image,
            region,
            screen,
            debug: query.is_debug(),
        })
        .await
        .map_err(|e| {
            tracing::warn!(request_id = %request_id, error = %e, "OCR request failed");
            e
        })?;

    tracing::info!(
        request_id = %request_id,
        lines = response.result.lines.len(),
        "OCR completed"
    );

    Ok(Json(response))
}

/// Read a region field as text. Invalid UTF-8 is kept lossily so it fails to
/// parse later and the region falls back to the whole image.
async fn field_text(field: Field<'_>) -> Result<String> {
    let bytes = field.bytes().await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use image::RgbImage;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::ocr::{encode_png, MockEngine};
    use crate::routes;
    use crate::sds::LopdfTextExtractor;
    use crate::state::AppState;

    const BOUNDARY: &str = "docintel-test-boundary";

    fn app_with(engine: Arc<MockEngine>, config: Config) -> axum::Router {
        let state =
            AppState::with_collaborators(config, engine, Arc::new(LopdfTextExtractor)).unwrap();
        routes::app(state)
    }

    fn structured() -> Value {
        json!([{
            "rec_texts": ["A", "B"],
            "rec_scores": [0.9, 0.5],
            "rec_boxes": [[0, 0, 4, 2], [0, 3, 4, 5]]
        }])
    }

    fn multipart_body(image: Option<&[u8]>, fields: &[(&str, &str)]) -> Vec<u8> {
        let fields: Vec<(&str, &[u8])> =
            fields.iter().map(|(name, value)| (*name, value.as_bytes())).collect();
        multipart_bytes(image, &fields)
    }

    fn multipart_bytes(image: Option<&[u8]>, fields: &[(&str, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        if let Some(bytes) = image {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"image\"; \
                     filename=\"capture.png\"\r\nContent-Type: image/png\r\n\r\n",
                    BOUNDARY
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    BOUNDARY, name
                )
                .as_bytes(),
            );
            body.extend_from_slice(value);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    async fn post_ocr(app: axum::Router, uri: &str, body: Vec<u8>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        encode_png(&RgbImage::from_pixel(width, height, image::Rgb([200, 200, 200]))).unwrap()
    }

    #[tokio::test]
    async fn test_ocr_returns_lines_and_text() {
        let engine = Arc::new(MockEngine::returning(structured()));
        let app = app_with(engine.clone(), Config::default());
        let image = png(100, 100);
        let body = multipart_body(
            Some(&image),
            &[
                ("left", "5"),
                ("top", "5"),
                ("width", "20"),
                ("height", "10"),
                ("screenWidth", "50"),
                ("screenHeight", "50"),
            ],
        );

        let (status, json) = post_ocr(app, "/ocr", body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["text"], "A\nB");
        assert_eq!(json["lines"][0]["text"], "A");
        assert_eq!(json["lines"][0]["box"][2], json!([4.0, 2.0]));
        assert!(json.get("debug").is_none());
        assert_eq!(*engine.last_size.lock().unwrap(), Some((40, 20)));
    }

    #[tokio::test]
    async fn test_missing_image_is_bad_request() {
        let app = app_with(Arc::new(MockEngine::returning(structured())), Config::default());
        let (status, json) = post_ocr(app, "/ocr", multipart_body(None, &[("left", "1")])).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "No image uploaded");
    }

    #[tokio::test]
    async fn test_out_of_bounds_crop_is_bad_request() {
        let app = app_with(Arc::new(MockEngine::returning(structured())), Config::default());
        let image = png(100, 100);
        let body = multipart_body(
            Some(&image),
            &[
                ("crop", r#"{"left": 10, "top": 10, "width": 100, "height": 50}"#),
                ("screenWidth", "50"),
                ("screenHeight", "50"),
            ],
        );

        let (status, json) = post_ocr(app, "/ocr", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("exceeds image bounds"));
    }

    #[tokio::test]
    async fn test_malformed_crop_falls_back_to_whole_image() {
        let engine = Arc::new(MockEngine::returning(structured()));
        let app = app_with(engine.clone(), Config::default());
        let image = png(64, 32);
        let body = multipart_body(Some(&image), &[("crop", "{oops")]);

        let (status, _) = post_ocr(app, "/api/v1/ocr", body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(*engine.last_size.lock().unwrap(), Some((64, 32)));
    }

    #[tokio::test]
    async fn test_engine_timeout_is_internal_error() {
        let engine = Arc::new(MockEngine::slow(structured(), Duration::from_secs(5)));
        let mut config = Config::default();
        config.ocr.timeout_secs = 0;
        let app = app_with(engine, config);

        let (status, json) = post_ocr(app, "/ocr", multipart_body(Some(&png(8, 8)), &[])).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "OCR processing timeout");
    }

    #[tokio::test]
    async fn test_unrecognized_engine_output_is_internal_error() {
        let app = app_with(Arc::new(MockEngine::returning(json!(42))), Config::default());

        let (status, _) = post_ocr(app, "/ocr", multipart_body(Some(&png(8, 8)), &[])).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_debug_mode_reports_tag() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.ocr.debug_dir = temp_dir.path().to_path_buf();
        let app = app_with(Arc::new(MockEngine::returning(json!([]))), config);

        let body = multipart_body(Some(&png(8, 8)), &[]);
        let (status, json) = post_ocr(app, "/ocr?mode=debug", body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["debug"]["saved_images"], true);
        assert!(json["debug"].get("savedImages").is_none());
        assert!(json["debug"]["tag"].as_str().is_some());
        assert_eq!(json["text"], "");
    }

    #[tokio::test]
    async fn test_non_utf8_region_fields_fall_back_to_whole_image() {
        let engine = Arc::new(MockEngine::returning(structured()));
        let app = app_with(engine.clone(), Config::default());
        let image = png(64, 32);
        let body = multipart_bytes(
            Some(&image),
            &[
                ("left", &b"\xff\xfe"[..]),
                ("width", &b"10"[..]),
                ("height", &b"10"[..]),
                ("crop", &b"{\"left\": \xc3}"[..]),
                ("screenWidth", &b"\x80"[..]),
            ],
        );

        let (status, _) = post_ocr(app, "/ocr", body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(*engine.last_size.lock().unwrap(), Some((64, 32)));
    }

    #[tokio::test]
    async fn test_extreme_region_values_are_bad_request() {
        let engine = Arc::new(MockEngine::returning(structured()));
        let app = app_with(engine.clone(), Config::default());
        let image = png(100, 100);
        let body = multipart_body(
            Some(&image),
            &[
                ("left", "9000000000000000000"),
                ("top", "0"),
                ("width", "9000000000000000000"),
                ("height", "10"),
            ],
        );

        let (status, json) = post_ocr(app.clone(), "/ocr", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("exceeds image bounds"));

        let body = multipart_body(
            Some(&image),
            &[
                ("width", "10"),
                ("height", "10"),
                ("screenWidth", "1e-300"),
                ("screenHeight", "100"),
            ],
        );
        let (status, _) = post_ocr(app, "/ocr", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(engine.call_count(), 0);
    }
}
