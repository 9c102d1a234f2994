//! SDS verification types

use serde::{Deserialize, Serialize};

/// Default cap on a downloaded PDF: 50MB
pub const DEFAULT_MAX_PDF_BYTES: u64 = 50 * 1024 * 1024;

/// Pages of text considered for scoring
pub const DEFAULT_MAX_PAGES: usize = 10;

/// Keyword hits needed to call a document an SDS
pub const DEFAULT_MIN_MATCHES: usize = 2;

/// Request body for `POST /verify-sds`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub url: Option<String>,
    /// Candidate product name; accepted but not used for scoring
    #[serde(default)]
    pub name: Option<String>,
}

/// Response body for `POST /verify-sds`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub verified: bool,
}

/// Result of one verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    pub verified: bool,
    pub matched_keyword_count: usize,
    pub total_keyword_count: usize,
}

impl VerificationOutcome {
    pub fn from_score(matched: usize, total: usize, min_matches: usize) -> Self {
        Self {
            verified: matched >= min_matches,
            matched_keyword_count: matched,
            total_keyword_count: total,
        }
    }

    /// Fail-closed outcome for documents that could not be scored
    pub fn rejected(total: usize) -> Self {
        Self {
            verified: false,
            matched_keyword_count: 0,
            total_keyword_count: total,
        }
    }
}

/// Reasons a document could not be scored. Logged, never returned to clients.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server returned {0}")]
    Status(reqwest::StatusCode),

    #[error("Not a PDF: {0:?}")]
    NotPdf(String),

    #[error("PDF too large: {size} bytes (max: {max})")]
    TooLarge { size: u64, max: u64 },

    #[error("Text extraction failed: {0}")]
    Extraction(String),
}
