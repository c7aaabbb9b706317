//! Multipart upload handling and PDF validation.

use axum::extract::multipart::Field;
use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Most files accepted by a single `/extract` request.
pub const MAX_FILES_PER_REQUEST: usize = 20;

/// Upload validation failures.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file uploaded (expected form field '{0}')")]
    MissingFile(&'static str),

    #[error("Too many files: at most {0} per request")]
    TooManyFiles(usize),

    #[error("{filename} is too large: {size} bytes (limit {limit} bytes)")]
    TooLarge {
        filename: String,
        size: usize,
        limit: usize,
    },

    #[error("Only PDF files are accepted: {0}")]
    NotPdf(String),

    #[error("Invalid upload: {message}")]
    Multipart { status: StatusCode, message: String },
}

impl UploadError {
    pub fn status(&self) -> StatusCode {
        match self {
            UploadError::MissingFile(_) | UploadError::TooManyFiles(_) => StatusCode::BAD_REQUEST,
            UploadError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            UploadError::NotPdf(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            UploadError::Multipart { status, .. } => *status,
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for UploadError {
    fn from(e: axum::extract::multipart::MultipartError) -> Self {
        UploadError::Multipart {
            status: e.status(),
            message: e.body_text(),
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// One file part of a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Declared as PDF by content type or file extension.
    fn declared_pdf(&self) -> bool {
        let by_type = self
            .content_type
            .as_deref()
            .map(|ct| ct.eq_ignore_ascii_case("application/pdf"))
            .unwrap_or(false);
        by_type || self.filename.to_ascii_lowercase().ends_with(".pdf")
    }

    /// Check size, declared type and `%PDF` magic bytes.
    pub fn validate_pdf(&self, limit: usize) -> Result<(), UploadError> {
        if self.bytes.len() > limit {
            return Err(UploadError::TooLarge {
                filename: self.filename.clone(),
                size: self.bytes.len(),
                limit,
            });
        }
        if !self.declared_pdf() {
            return Err(UploadError::NotPdf(format!(
                "{} ({})",
                self.filename,
                self.content_type.as_deref().unwrap_or("unknown type")
            )));
        }
        let detected = infer::get(&self.bytes).map(|t| t.mime_type());
        if detected != Some("application/pdf") {
            return Err(UploadError::NotPdf(format!(
                "{} does not contain PDF data",
                self.filename
            )));
        }
        Ok(())
    }
}

/// Read every file part named `field` (or one of `aliases`), validating each
/// as a PDF of at most `limit` bytes.
pub async fn read_pdfs(
    multipart: &mut Multipart,
    field: &'static str,
    aliases: &[&str],
    limit: usize,
) -> Result<Vec<UploadedFile>, UploadError> {
    let mut files = Vec::new();
    while let Some(part) = multipart.next_field().await? {
        let name = part.name().unwrap_or_default().to_string();
        if name != field && !aliases.contains(&name.as_str()) {
            continue;
        }
        if files.len() == MAX_FILES_PER_REQUEST {
            return Err(UploadError::TooManyFiles(MAX_FILES_PER_REQUEST));
        }
        files.push(read_part(part, limit).await?);
    }

    if files.is_empty() {
        return Err(UploadError::MissingFile(field));
    }
    Ok(files)
}

/// Read the first PDF part named `field`. Later parts are left unread.
pub async fn read_pdf(
    multipart: &mut Multipart,
    field: &'static str,
    limit: usize,
) -> Result<UploadedFile, UploadError> {
    while let Some(part) = multipart.next_field().await? {
        if part.name() == Some(field) {
            return read_part(part, limit).await;
        }
    }
    Err(UploadError::MissingFile(field))
}

async fn read_part(part: Field<'_>, limit: usize) -> Result<UploadedFile, UploadError> {
    let filename = part.file_name().unwrap_or("upload.pdf").to_string();
    let content_type = part.content_type().map(str::to_string);
    let bytes = part.bytes().await?.to_vec();

    let file = UploadedFile {
        filename,
        content_type,
        bytes,
    };
    file.validate_pdf(limit)?;
    Ok(file)
}
