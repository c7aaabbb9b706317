//! Raw OCR text for one or more uploaded PDFs.

use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use super::super::upload::read_pdfs;
use super::super::AppState;
use crate::extraction::FileText;

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub results: Vec<FileText>,
}

/// `POST /extract` with one or more `files` parts. Always uses local OCR.
pub async fn extract_text(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let limit = state.settings.server.max_upload_bytes();
    let files = match read_pdfs(&mut multipart, "files", &["file"], limit).await {
        Ok(files) => files,
        Err(e) => return e.into_response(),
    };

    tracing::info!("Extracting text from {} uploaded files", files.len());
    let inputs = files.into_iter().map(|f| (f.filename, f.bytes)).collect();
    let results = state.local_ocr.extract_files(inputs).await;

    Json(ExtractResponse { results }).into_response()
}
