//! CSV export of (possibly edited) rubric records.

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use super::error_response;
use crate::export::{csv_filename, to_csv};
use crate::models::RubricRecord;

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub rubrics: Vec<RubricRecord>,
    /// Source PDF name, used for the download filename.
    #[serde(default)]
    pub filename: Option<String>,
}

/// `POST /api/export/csv` with `{ "rubrics": [...] }`.
pub async fn api_export_csv(Json(request): Json<ExportRequest>) -> Response {
    csv_response(&request.rubrics, request.filename.as_deref())
}

pub(super) fn csv_response(records: &[RubricRecord], source: Option<&str>) -> Response {
    let body = to_csv(records);
    let disposition = format!("attachment; filename=\"{}\"", csv_filename(source));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(Body::from(body))
        .map(IntoResponse::into_response)
        .unwrap_or_else(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}
