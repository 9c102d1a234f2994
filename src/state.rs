//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::ocr::{HttpRecognitionEngine, OcrError, OcrService, RecognitionEngine};
use crate::sds::{KeywordSet, LopdfTextExtractor, PdfTextExtractor, SdsVerifier, VerifyError};

/// Error type for state initialization
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to initialize recognition engine: {0}")]
    Engine(#[from] OcrError),

    #[error("Failed to initialize SDS verifier: {0}")]
    Verifier(#[from] VerifyError),
}

/// Shared application state
///
/// Everything in here is read-only after startup; the configuration is
/// consumed when the services are built.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pub ocr: OcrService,
    pub verifier: SdsVerifier,
}

impl AppState {
    /// Create application state with the configured HTTP recognition engine
    pub fn new(config: Config) -> Result<Self, StateError> {
        let engine = Arc::new(HttpRecognitionEngine::new(&config.ocr.engine_url)?);
        Self::with_collaborators(config, engine, Arc::new(LopdfTextExtractor))
    }

    /// Create application state around explicit collaborators
    pub fn with_collaborators(
        config: Config,
        engine: Arc<dyn RecognitionEngine>,
        extractor: Arc<dyn PdfTextExtractor>,
    ) -> Result<Self, StateError> {
        let ocr = OcrService::new(config.ocr.service_config(), engine);
        let verifier = SdsVerifier::new(
            config.sds.verifier_config(),
            Arc::new(KeywordSet::default()),
            extractor,
        )?;

        Ok(Self {
            inner: Arc::new(AppStateInner { ocr, verifier }),
        })
    }

    /// Get the OCR service
    pub fn ocr(&self) -> &OcrService {
        &self.inner.ocr
    }

    /// Get the SDS verifier
    pub fn verifier(&self) -> &SdsVerifier {
        &self.inner.verifier
    }
}
