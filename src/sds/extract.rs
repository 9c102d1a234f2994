//! PDF text extraction
//!
//! Plain text only; layout is ignored. Extraction is CPU-bound, so callers
//! run it on the blocking pool.

use lopdf::Document;

use super::types::VerifyError;

/// Extracts plain text from the first pages of a PDF
pub trait PdfTextExtractor: Send + Sync {
    fn extract_text(&self, pdf: &[u8], max_pages: usize) -> Result<String, VerifyError>;
}

/// Pure-Rust extractor backed by `lopdf`
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfTextExtractor;

impl PdfTextExtractor for LopdfTextExtractor {
    fn extract_text(&self, pdf: &[u8], max_pages: usize) -> Result<String, VerifyError> {
        let document = Document::load_mem(pdf)
            .map_err(|e| VerifyError::Extraction(format!("Failed to load PDF: {}", e)))?;

        let pages: Vec<u32> = document.get_pages().keys().copied().take(max_pages).collect();
        if pages.is_empty() {
            return Err(VerifyError::Extraction("PDF has no pages".to_string()));
        }

        let mut text = String::new();
        let mut failed = 0usize;
        for page in &pages {
            match document.extract_text(&[*page]) {
                Ok(page_text) => {
                    text.push_str(&page_text);
                    text.push('\n');
                }
                Err(e) => {
                    failed += 1;
                    tracing::debug!(page, error = %e, "Skipping page without extractable text");
                }
            }
        }

        if failed == pages.len() {
            return Err(VerifyError::Extraction(format!(
                "No text could be extracted from {} page(s)",
                pages.len()
            )));
        }
        Ok(text)
    }
}
