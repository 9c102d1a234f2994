//! Debug artifacts
//!
//! When enabled, each pipeline stage of an OCR request is written to the
//! debug directory as `<tag>_<stage>.jpg`. Failures to write are logged and
//! otherwise ignored.

use std::path::{Path, PathBuf};

use image::DynamicImage;

/// Per-request artifact writer
#[derive(Debug, Clone)]
pub struct DebugArtifacts {
    dir: PathBuf,
    tag: String,
    enabled: bool,
}

impl DebugArtifacts {
    pub fn new(dir: &Path, enabled: bool) -> Self {
        Self {
            dir: dir.to_path_buf(),
            tag: chrono::Utc::now().format("%Y%m%dT%H%M%S_%6f").to_string(),
            enabled,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Path an artifact for `stage` is written to
    pub fn path_for(&self, stage: &str) -> PathBuf {
        self.dir.join(format!("{}_{}.jpg", self.tag, stage))
    }

    pub fn save(&self, stage: &str, image: &DynamicImage) {
        if !self.enabled {
            return;
        }

        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            tracing::warn!(
                dir = %self.dir.display(),
                error = %e,
                "Failed to create debug directory"
            );
            return;
        }

        let path = self.path_for(stage);
        // JPEG has no alpha channel
        match image.to_rgb8().save(&path) {
            Ok(()) => tracing::debug!(path = %path.display(), "Saved debug image"),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to save debug image")
            }
        }
    }
}
