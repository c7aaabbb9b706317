//! Configuration for rubricly.
//!
//! Settings are layered: built-in defaults, then an optional config file
//! (`--config`, or a `rubricly` file discovered by `prefer`), then
//! environment variables. A `.env` file is loaded by `main` before any of
//! this runs.
//!
//! Env vars:
//! - RUBRICLY_BACKEND: cloud | local
//! - RUBRICLY_MAX_UPLOAD_MB, RUBRICLY_JOB_TTL_SECS, RUBRICLY_CORS_ORIGINS
//! - OCR_LANG, OCR_DPI, OCR_PSM, OCR_OEM, OCR_TARGET_HEIGHT
//! - TESSERACT_CMD, POPPLER_PATH
//! - AZURE_ENDPOINT, AZURE_API_KEY, AZURE_MODEL_ID, AZURE_API_VERSION,
//!   AZURE_FLAVOR, AZURE_POLL_INTERVAL_MS, AZURE_MAX_POLL_ATTEMPTS

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name `prefer` uses to discover the config file.
pub const CONFIG_NAME: &str = "rubricly";

/// Errors from loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Which extraction backend analyzes chunks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Azure Document Intelligence / Content Understanding
    Cloud,
    /// Tesseract + Poppler on this machine
    #[default]
    Local,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Cloud => "cloud",
            BackendKind::Local => "local",
        }
    }
}

impl FromStr for BackendKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cloud" | "azure" | "api" => Ok(BackendKind::Cloud),
            "local" | "ocr" | "tesseract" => Ok(BackendKind::Local),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which Azure service the cloud backend talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloudFlavor {
    /// Document Intelligence custom model (`documents[0].fields`).
    #[default]
    DocumentIntelligence,
    /// Content Understanding analyzer (`contents[0].fields`).
    ContentUnderstanding,
}

impl CloudFlavor {
    pub fn default_api_version(&self) -> &'static str {
        match self {
            CloudFlavor::DocumentIntelligence => "2024-11-30",
            CloudFlavor::ContentUnderstanding => "2024-12-01-preview",
        }
    }
}

impl FromStr for CloudFlavor {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "document_intelligence" | "di" | "form_recognizer" => {
                Ok(CloudFlavor::DocumentIntelligence)
            }
            "content_understanding" | "cu" => Ok(CloudFlavor::ContentUnderstanding),
            _ => Err(()),
        }
    }
}

/// Cloud analysis settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudSettings {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    /// Custom model id (Document Intelligence) or analyzer id (Content
    /// Understanding).
    pub model_id: Option<String>,
    pub api_version: Option<String>,
    pub flavor: CloudFlavor,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    pub request_timeout_secs: u64,
}

impl Default for CloudSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            model_id: None,
            api_version: None,
            flavor: CloudFlavor::default(),
            poll_interval_ms: 2000,
            max_poll_attempts: 60,
            request_timeout_secs: 60,
        }
    }
}

impl CloudSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn api_version(&self) -> &str {
        self.api_version
            .as_deref()
            .unwrap_or_else(|| self.flavor.default_api_version())
    }
}

/// Local OCR settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    pub language: String,
    pub dpi: u32,
    /// Tesseract page segmentation mode (`--psm`).
    pub psm: u32,
    /// Tesseract engine mode (`--oem`).
    pub oem: u32,
    /// Pages shorter than this (in pixels) are upscaled before OCR.
    pub target_height: u32,
    pub tesseract_cmd: Option<PathBuf>,
    /// Directory holding the Poppler binaries (`pdftoppm`).
    pub poppler_path: Option<PathBuf>,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            dpi: 300,
            psm: 6,
            oem: 1,
            target_height: 1500,
            tesseract_cmd: None,
            poppler_path: None,
        }
    }
}

impl OcrSettings {
    /// Tesseract binary to invoke.
    pub fn tesseract_command(&self) -> PathBuf {
        self.tesseract_cmd
            .clone()
            .unwrap_or_else(|| PathBuf::from("tesseract"))
    }

    /// pdftoppm binary to invoke.
    pub fn pdftoppm_command(&self) -> PathBuf {
        match &self.poppler_path {
            Some(dir) => dir.join(if cfg!(windows) { "pdftoppm.exe" } else { "pdftoppm" }),
            None => PathBuf::from("pdftoppm"),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub max_upload_mb: u64,
    /// Seconds an idle job stays pollable.
    pub job_ttl_secs: u64,
    /// Allowed CORS origins. Empty means any origin.
    pub cors_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            max_upload_mb: 10,
            job_ttl_secs: 3600,
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
                "http://localhost:5174".to_string(),
                "http://127.0.0.1:5174".to_string(),
            ],
        }
    }
}

impl ServerSettings {
    pub fn max_upload_bytes(&self) -> usize {
        (self.max_upload_mb as usize).saturating_mul(1024 * 1024)
    }

    pub fn job_ttl(&self) -> Duration {
        Duration::from_secs(self.job_ttl_secs)
    }
}

/// Complete runtime settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backend: BackendKind,
    pub cloud: CloudSettings,
    pub ocr: OcrSettings,
    pub server: ServerSettings,
}

impl Settings {
    /// Load settings from an explicit file, else a file discovered by
    /// `prefer`, then apply the process environment.
    pub async fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match config_path {
            Some(path) => Some(path.to_path_buf()),
            None => discover_config().await,
        };
        let mut settings = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Parse a config file. `.json` files are read as JSON, anything else as
    /// TOML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&raw).map_err(|e| e.to_string()),
            _ => Self::from_toml(&raw).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Override settings from environment-style lookups.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("RUBRICLY_BACKEND") {
            self.backend = v.parse().map_err(|_| ConfigError::Invalid {
                key: "RUBRICLY_BACKEND",
                value: v,
            })?;
        }
        if let Some(v) = get("RUBRICLY_MAX_UPLOAD_MB") {
            self.server.max_upload_mb = parse_num("RUBRICLY_MAX_UPLOAD_MB", v)?;
        }
        if let Some(v) = get("RUBRICLY_JOB_TTL_SECS") {
            self.server.job_ttl_secs = parse_num("RUBRICLY_JOB_TTL_SECS", v)?;
        }
        if let Some(v) = get("RUBRICLY_CORS_ORIGINS") {
            self.server.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty() && s != "*")
                .collect();
        }

        if let Some(v) = get("OCR_LANG") {
            self.ocr.language = v;
        }
        if let Some(v) = get("OCR_DPI") {
            self.ocr.dpi = parse_num("OCR_DPI", v)?;
        }
        if let Some(v) = get("OCR_PSM") {
            self.ocr.psm = parse_num("OCR_PSM", v)?;
        }
        if let Some(v) = get("OCR_OEM") {
            self.ocr.oem = parse_num("OCR_OEM", v)?;
        }
        if let Some(v) = get("OCR_TARGET_HEIGHT") {
            self.ocr.target_height = parse_num("OCR_TARGET_HEIGHT", v)?;
        }
        if let Some(v) = get("TESSERACT_CMD") {
            self.ocr.tesseract_cmd = Some(PathBuf::from(v));
        }
        if let Some(v) = get("POPPLER_PATH") {
            self.ocr.poppler_path = Some(PathBuf::from(v));
        }

        if let Some(v) = get("AZURE_ENDPOINT") {
            self.cloud.endpoint = Some(v);
        }
        if let Some(v) = get("AZURE_API_KEY") {
            self.cloud.api_key = Some(v);
        }
        if let Some(v) = get("AZURE_MODEL_ID").or_else(|| get("AZURE_ANALYZER_ID")) {
            self.cloud.model_id = Some(v);
        }
        if let Some(v) = get("AZURE_API_VERSION") {
            self.cloud.api_version = Some(v);
        }
        if let Some(v) = get("AZURE_FLAVOR") {
            self.cloud.flavor = v.parse().map_err(|_| ConfigError::Invalid {
                key: "AZURE_FLAVOR",
                value: v,
            })?;
        }
        if let Some(v) = get("AZURE_POLL_INTERVAL_MS") {
            self.cloud.poll_interval_ms = parse_num("AZURE_POLL_INTERVAL_MS", v)?;
        }
        if let Some(v) = get("AZURE_MAX_POLL_ATTEMPTS") {
            self.cloud.max_poll_attempts = parse_num("AZURE_MAX_POLL_ATTEMPTS", v)?;
        }

        Ok(())
    }

    /// Check that the selected backend has what it needs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.backend {
            BackendKind::Cloud => {
                if self.cloud.endpoint.is_none() {
                    return Err(ConfigError::Missing("AZURE_ENDPOINT"));
                }
                if self.cloud.api_key.is_none() {
                    return Err(ConfigError::Missing("AZURE_API_KEY"));
                }
                if self.cloud.model_id.is_none() {
                    return Err(ConfigError::Missing("AZURE_MODEL_ID"));
                }
                if self.cloud.max_poll_attempts == 0 {
                    return Err(ConfigError::Invalid {
                        key: "AZURE_MAX_POLL_ATTEMPTS",
                        value: "0".to_string(),
                    });
                }
            }
            BackendKind::Local => {
                if self.ocr.dpi == 0 {
                    return Err(ConfigError::Invalid {
                        key: "OCR_DPI",
                        value: "0".to_string(),
                    });
                }
                if self.ocr.language.trim().is_empty() {
                    return Err(ConfigError::Missing("OCR_LANG"));
                }
            }
        }
        if self.server.max_upload_mb == 0 {
            return Err(ConfigError::Invalid {
                key: "RUBRICLY_MAX_UPLOAD_MB",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

/// Use prefer for file discovery; parsing stays with serde.
async fn discover_config() -> Option<PathBuf> {
    match prefer::load(CONFIG_NAME).await {
        Ok(found) => {
            let path = found.source_path().map(|p| p.to_path_buf());
            if let Some(path) = &path {
                tracing::debug!("Using config file {}", path.display());
            }
            path
        }
        Err(_) => None,
    }
}

fn parse_num<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value })
}
