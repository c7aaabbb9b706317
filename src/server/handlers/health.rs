use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::super::AppState;
use crate::extraction::tools;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: &'static str,
    #[serde(flatten)]
    pub tools: tools::ToolStatus,
}

/// Liveness plus OCR toolchain availability.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        backend: state.extractor.backend().as_str(),
        tools: tools::availability(&state.settings.ocr),
    })
}
