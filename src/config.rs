//! Configuration management for Docintel Server

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::ocr::OcrServiceConfig;
use crate::sds::SdsVerifierConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub ocr: OcrConfig,
    pub sds: SdsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    /// Inference endpoint of the recognition engine
    pub engine_url: String,
    pub max_side: u32,
    pub max_pixels: u64,
    pub timeout_secs: u64,
    pub debug_images: bool,
    pub debug_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SdsConfig {
    pub timeout_secs: u64,
    pub fetch_timeout_secs: u64,
    pub max_bytes: u64,
    pub max_pages: usize,
    pub min_keyword_matches: usize,
}

/// Error loading configuration
#[derive(Debug, thiserror::Error)]
#[error("Invalid value for {key}: {value:?}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5001,
            },
            ocr: OcrConfig {
                engine_url: "http://localhost:8866/predict".to_string(),
                max_side: 4000,
                max_pixels: 50_000_000,
                timeout_secs: 120,
                debug_images: false,
                debug_dir: PathBuf::from("debug_images"),
            },
            sds: SdsConfig {
                timeout_secs: 120,
                fetch_timeout_secs: 30,
                max_bytes: 50 * 1024 * 1024,
                max_pages: 10,
                min_keyword_matches: 2,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();
        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var("SERVER_PORT", defaults.server.port)?,
            },
            ocr: OcrConfig {
                engine_url: env::var("RECOGNITION_ENGINE_URL").unwrap_or(defaults.ocr.engine_url),
                max_side: parse_var("OCR_MAX_SIDE", defaults.ocr.max_side)?,
                max_pixels: parse_var("OCR_MAX_PIXELS", defaults.ocr.max_pixels)?,
                timeout_secs: parse_var("OCR_TIMEOUT_SECS", defaults.ocr.timeout_secs)?,
                debug_images: env::var("DEBUG_IMAGES").map(|v| v == "1").unwrap_or(false),
                debug_dir: env::var("DEBUG_IMAGE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.ocr.debug_dir),
            },
            sds: SdsConfig {
                timeout_secs: parse_var("SDS_TIMEOUT_SECS", defaults.sds.timeout_secs)?,
                fetch_timeout_secs: parse_var(
                    "SDS_FETCH_TIMEOUT_SECS",
                    defaults.sds.fetch_timeout_secs,
                )?,
                max_bytes: parse_var("SDS_MAX_BYTES", defaults.sds.max_bytes)?,
                max_pages: parse_var("SDS_MAX_PAGES", defaults.sds.max_pages)?,
                min_keyword_matches: parse_var(
                    "SDS_MIN_KEYWORD_MATCHES",
                    defaults.sds.min_keyword_matches,
                )?,
            },
        })
    }
}

impl OcrConfig {
    pub fn service_config(&self) -> OcrServiceConfig {
        OcrServiceConfig {
            max_side: self.max_side,
            max_pixels: self.max_pixels,
            timeout: Duration::from_secs(self.timeout_secs),
            debug_images: self.debug_images,
            debug_dir: self.debug_dir.clone(),
        }
    }
}

impl SdsConfig {
    pub fn verifier_config(&self) -> SdsVerifierConfig {
        SdsVerifierConfig {
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            max_bytes: self.max_bytes,
            max_pages: self.max_pages,
            min_matches: self.min_keyword_matches,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError { key, value }),
        Err(_) => Ok(default),
    }
}
