//! Configuration management for the Text Coordinates server

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::upload::{ImageKind, DEFAULT_MAX_UPLOAD_BYTES};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub upload: UploadConfig,
    pub ocr: OcrConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Largest accepted file, in bytes
    pub max_bytes: usize,
    /// Accepted declared MIME types
    pub allowed_types: Vec<ImageKind>,
    /// Largest decoded width or height, in pixels
    pub max_dimension: u32,
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub engine: EngineKind,
    pub language: String,
    pub timeout: Duration,
    pub max_concurrency: usize,
    pub tesseract_cmd: PathBuf,
    pub tessdata_dir: Option<PathBuf>,
}

/// Which Tesseract binding runs recognition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    /// Spawn the `tesseract` executable
    Cli,
    /// Linked libtesseract (`ocr-tesseract` feature)
    Native,
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cli" => Ok(Self::Cli),
            "native" => Ok(Self::Native),
            other => Err(format!("unknown engine '{}', expected 'cli' or 'native'", other)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3001,
            },
            upload: UploadConfig {
                max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
                allowed_types: ImageKind::ALL.to_vec(),
                max_dimension: 10_000,
            },
            ocr: OcrConfig {
                engine: EngineKind::Cli,
                language: "eng".to_string(),
                timeout: Duration::from_secs(30),
                max_concurrency: default_concurrency(),
                tesseract_cmd: PathBuf::from("tesseract"),
                tessdata_dir: None,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let allowed_types = match var("ALLOWED_MIME_TYPES") {
            Some(raw) => parse_mime_list(&raw)?,
            None => defaults.upload.allowed_types,
        };

        let language = var("OCR_LANGUAGE").unwrap_or(defaults.ocr.language);
        if !language
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '+')
        {
            return Err(ConfigError::Invalid {
                var: "OCR_LANGUAGE",
                value: language,
                reason: "expected a tesseract language code such as 'eng' or 'eng+deu'".to_string(),
            });
        }

        let max_concurrency: usize =
            parse_var(&var, "OCR_MAX_CONCURRENCY", defaults.ocr.max_concurrency)?;
        if max_concurrency == 0 {
            return Err(ConfigError::Invalid {
                var: "OCR_MAX_CONCURRENCY",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let timeout_secs: u64 =
            parse_var(&var, "OCR_TIMEOUT_SECS", defaults.ocr.timeout.as_secs())?;

        Ok(Config {
            server: ServerConfig {
                host: var("HOST").unwrap_or(defaults.server.host),
                port: parse_var(&var, "PORT", defaults.server.port)?,
            },
            upload: UploadConfig {
                max_bytes: parse_var(&var, "MAX_UPLOAD_BYTES", defaults.upload.max_bytes)?,
                allowed_types,
                max_dimension: parse_var(
                    &var,
                    "MAX_IMAGE_DIMENSION",
                    defaults.upload.max_dimension,
                )?,
            },
            ocr: OcrConfig {
                engine: parse_var(&var, "OCR_ENGINE", defaults.ocr.engine)?,
                language,
                timeout: Duration::from_secs(timeout_secs),
                max_concurrency,
                tesseract_cmd: var("TESSERACT_CMD")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.ocr.tesseract_cmd),
                tessdata_dir: var("TESSDATA_DIR").map(PathBuf::from),
            },
        })
    }
}

fn parse_var<T, F>(var: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var: name,
            value: raw,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_mime_list(raw: &str) -> Result<Vec<ImageKind>, ConfigError> {
    let mut kinds = Vec::new();
    for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let kind = ImageKind::from_mime(item).ok_or_else(|| ConfigError::Invalid {
            var: "ALLOWED_MIME_TYPES",
            value: raw.to_string(),
            reason: format!("'{}' is not one of image/jpeg, image/png, image/webp", item),
        })?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }

    if kinds.is_empty() {
        return Err(ConfigError::Invalid {
            var: "ALLOWED_MIME_TYPES",
            value: raw.to_string(),
            reason: "at least one type is required".to_string(),
        });
    }

    Ok(kinds)
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
}
