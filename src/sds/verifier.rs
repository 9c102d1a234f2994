//! SDS Verifier
//!
//! Decides whether a remote PDF is plausibly a Safety Data Sheet by keyword
//! scoring. Verification fails closed: anything that prevents scoring is
//! logged and answered with `verified = false`.
//!
//! The product name is accepted but does not take part in scoring. Name
//! matching proved unreliable and was removed.

use std::sync::Arc;
use std::time::Duration;

use super::{
    extract::PdfTextExtractor,
    fetch::PdfFetcher,
    keywords::KeywordSet,
    types::{
        VerificationOutcome, VerifyError, DEFAULT_MAX_PAGES, DEFAULT_MAX_PDF_BYTES,
        DEFAULT_MIN_MATCHES,
    },
};
use crate::executor::{BoundedExecutor, ExecutionError};

/// Keywords listed in logs for a positive match
const LOGGED_MATCHES: usize = 10;

/// SDS verifier configuration
#[derive(Debug, Clone)]
pub struct SdsVerifierConfig {
    /// Connect and per-read timeout of the download
    pub fetch_timeout: Duration,
    /// Download cap in bytes
    pub max_bytes: u64,
    /// Pages of text to score
    pub max_pages: usize,
    /// Keyword hits needed for a positive outcome
    pub min_matches: usize,
    /// Deadline for a whole verification
    pub timeout: Duration,
}

impl Default for SdsVerifierConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(30),
            max_bytes: DEFAULT_MAX_PDF_BYTES,
            max_pages: DEFAULT_MAX_PAGES,
            min_matches: DEFAULT_MIN_MATCHES,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Safety Data Sheet verifier
#[derive(Clone)]
pub struct SdsVerifier {
    config: SdsVerifierConfig,
    fetcher: PdfFetcher,
    extractor: Arc<dyn PdfTextExtractor>,
    keywords: Arc<KeywordSet>,
    executor: BoundedExecutor,
}

impl SdsVerifier {
    pub fn new(
        config: SdsVerifierConfig,
        keywords: Arc<KeywordSet>,
        extractor: Arc<dyn PdfTextExtractor>,
    ) -> Result<Self, VerifyError> {
        let fetcher = PdfFetcher::new(config.fetch_timeout, config.max_bytes)?;
        let executor = BoundedExecutor::new(config.timeout);
        Ok(Self {
            config,
            fetcher,
            extractor,
            keywords,
            executor,
        })
    }

    /// Verify under the configured deadline.
    ///
    /// On timeout the verification keeps running in the background until its
    /// own download/read timeouts end it; its outcome is discarded.
    pub async fn verify_within_deadline(
        &self,
        url: String,
        product_name: String,
    ) -> Result<VerificationOutcome, ExecutionError> {
        let verifier = self.clone();
        self.executor
            .run(async move { verifier.verify(&url, &product_name).await })
            .await
    }

    /// Score the document at `url`. Never fails; errors yield `verified = false`.
    pub async fn verify(&self, url: &str, _product_name: &str) -> VerificationOutcome {
        match self.score_document(url).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(
                    url = %truncate(url, 100),
                    reason = %e,
                    "SDS verification failed closed"
                );
                VerificationOutcome::rejected(self.keywords.len())
            }
        }
    }

    async fn score_document(&self, url: &str) -> Result<VerificationOutcome, VerifyError> {
        let pdf = self.fetcher.fetch(url).await?;

        let extractor = Arc::clone(&self.extractor);
        let max_pages = self.config.max_pages;
        let text = tokio::task::spawn_blocking(move || extractor.extract_text(&pdf, max_pages))
            .await
            .map_err(|e| VerifyError::Extraction(format!("Extraction task failed: {}", e)))??
            .to_lowercase();
        tracing::debug!(chars = text.len(), max_pages, "Extracted PDF text");

        let matched = self.keywords.matches(&text);
        let outcome = VerificationOutcome::from_score(
            matched.len(),
            self.keywords.len(),
            self.config.min_matches,
        );

        tracing::info!(
            url = %truncate(url, 100),
            matched = outcome.matched_keyword_count,
            total = outcome.total_keyword_count,
            keywords = ?&matched[..matched.len().min(LOGGED_MATCHES)],
            verified = outcome.verified,
            "SDS keyword scoring complete"
        );

        Ok(outcome)
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
