use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::super::upload::read_pdf;
use super::super::AppState;
use super::error_response;
use crate::pipeline::{process_pdf, NoProgress};

/// `POST /api/process`: run the whole pipeline and answer with the aggregate.
pub async fn api_process(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let limit = state.settings.server.max_upload_bytes();
    let file = match read_pdf(&mut multipart, "file", limit).await {
        Ok(file) => file,
        Err(e) => return e.into_response(),
    };

    tracing::info!("Processing {} ({} bytes)", file.filename, file.bytes.len());
    match process_pdf(state.extractor.as_ref(), &file.bytes, &NoProgress).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
    }
}
