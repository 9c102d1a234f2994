//! SDS Module
//!
//! Safety Data Sheet verification for remote PDFs: bounded streaming
//! download, text from the first pages, keyword scoring.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docintel_server::sds::{KeywordSet, LopdfTextExtractor, SdsVerifier, SdsVerifierConfig};
//!
//! let verifier = SdsVerifier::new(
//!     SdsVerifierConfig::default(),
//!     Arc::new(KeywordSet::default()),
//!     Arc::new(LopdfTextExtractor),
//! )?;
//!
//! let outcome = verifier.verify("https://example.com/acetone-sds.pdf", "Acetone").await;
//! println!("verified: {}", outcome.verified);
//! ```

mod extract;
mod fetch;
mod keywords;
mod types;
mod verifier;

#[cfg(test)]
pub(crate) mod testing;

pub use extract::{LopdfTextExtractor, PdfTextExtractor};
pub use fetch::PdfFetcher;
pub use keywords::KeywordSet;
pub use types::{
    VerificationOutcome, VerifyError, VerifyRequest, VerifyResponse, DEFAULT_MAX_PAGES,
    DEFAULT_MAX_PDF_BYTES, DEFAULT_MIN_MATCHES,
};
pub use verifier::{SdsVerifier, SdsVerifierConfig};
