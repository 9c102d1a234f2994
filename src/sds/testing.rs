//! Test fixtures: a local document server and a scripted extractor

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};

use super::{extract::PdfTextExtractor, types::VerifyError};

const PDF_BYTES: &[u8] = b"%PDF-1.4\n% test document\n%%EOF";

/// Serves:
/// - `/sds.pdf`: small `application/pdf` body
/// - `/page.html`: `text/html`
/// - `/large.pdf`: 64KB PDF streamed in 1KB chunks, no Content-Length
/// - `/declared.pdf`: 64KB PDF with Content-Length
/// - `/missing.pdf`: 404
/// - `/slow.pdf`: answers after 5 seconds
pub async fn spawn_pdf_server() -> SocketAddr {
    let app = Router::new()
        .route("/sds.pdf", get(|| async { pdf(PDF_BYTES.to_vec()) }))
        .route(
            "/page.html",
            get(|| async {
                ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], "<html></html>")
            }),
        )
        .route("/large.pdf", get(large_streamed_pdf))
        .route("/declared.pdf", get(|| async { pdf(vec![b'x'; 64 * 1024]) }))
        .route("/missing.pdf", get(|| async { StatusCode::NOT_FOUND }))
        .route(
            "/slow.pdf",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                pdf(PDF_BYTES.to_vec())
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn pdf(body: Vec<u8>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/pdf")], body)
}

async fn large_streamed_pdf() -> impl IntoResponse {
    let chunks = futures::stream::iter(
        (0..64).map(|_| Ok::<_, std::io::Error>(Bytes::from(vec![b'x'; 1024]))),
    );
    ([(header::CONTENT_TYPE, "application/pdf")], Body::from_stream(chunks))
}

/// Returns canned text and counts invocations
pub struct CountingExtractor {
    text: Option<String>,
    calls: AtomicUsize,
}

impl CountingExtractor {
    pub fn new(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            text: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PdfTextExtractor for CountingExtractor {
    fn extract_text(&self, _pdf: &[u8], _max_pages: usize) -> Result<String, VerifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.text
            .clone()
            .ok_or_else(|| VerifyError::Extraction("scripted failure".to_string()))
    }
}
