//! Extraction backends.
//!
//! A chunk (a standalone PDF of up to three pages) goes in, a [`RawResult`]
//! comes out. Two backends exist:
//! - **Cloud**: Azure Document Intelligence / Content Understanding over HTTP,
//!   with long-running operation polling.
//! - **Local**: Poppler `pdftoppm` + image preprocessing + Tesseract, with the
//!   embedded text layer as fallback.
//!
//! [`ExtractionClient`] selects one of them from [`Settings`].

mod cloud;
mod local;
pub mod preprocess;
mod result;
pub mod tools;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{BackendKind, Settings};
use crate::pdf::ChunkError;

pub use cloud::{analyze_url, CloudClient, SUBSCRIPTION_KEY_HEADER};
pub use local::{FileText, LocalOcr};
pub use result::{
    AnalyzeResult, AnalyzedContent, AnalyzedDocument, FieldValue, KeyValueElement, KeyValuePair,
    Line, Page, RawResult, Table, TableCell,
};

/// Errors from an extraction backend.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Extraction backend is not configured: {0}")]
    Configuration(String),

    #[error("{}", transport_message(.status, .message))]
    Transport {
        status: Option<u16>,
        message: String,
    },

    #[error("Analysis failed: {0}")]
    BackendFailure(String),

    #[error("Analysis did not finish after {attempts} status checks")]
    Timeout { attempts: u32 },

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("{0}")]
    ToolNotFound(String),

    #[error("Invalid chunk: {0}")]
    Chunk(#[from] ChunkError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn transport_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("Request failed with HTTP {}: {}", code, message),
        None => format!("Request failed: {}", message),
    }
}

impl From<reqwest::Error> for ExtractError {
    fn from(e: reqwest::Error) -> Self {
        ExtractError::Transport {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

/// A backend that turns chunk bytes into a raw analysis result.
#[async_trait]
pub trait Extractor: Send + Sync {
    fn backend(&self) -> BackendKind;

    async fn analyze(&self, chunk: &[u8]) -> Result<RawResult, ExtractError>;
}

/// The configured extraction backend.
pub enum ExtractionClient {
    CloudApi(CloudClient),
    LocalOcr(LocalOcr),
}

impl ExtractionClient {
    /// Build the backend selected by `settings.backend`.
    ///
    /// Missing cloud credentials are reported by the first `analyze` call.
    pub fn from_settings(settings: &Settings) -> Self {
        match settings.backend {
            BackendKind::Cloud => ExtractionClient::CloudApi(CloudClient::new(settings.cloud.clone())),
            BackendKind::Local => ExtractionClient::LocalOcr(LocalOcr::new(settings.ocr.clone())),
        }
    }
}

#[async_trait]
impl Extractor for ExtractionClient {
    fn backend(&self) -> BackendKind {
        match self {
            ExtractionClient::CloudApi(_) => BackendKind::Cloud,
            ExtractionClient::LocalOcr(_) => BackendKind::Local,
        }
    }

    async fn analyze(&self, chunk: &[u8]) -> Result<RawResult, ExtractError> {
        match self {
            ExtractionClient::CloudApi(client) => client.analyze(chunk).await,
            ExtractionClient::LocalOcr(ocr) => ocr.analyze(chunk).await,
        }
    }
}
