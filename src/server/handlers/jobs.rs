//! Asynchronous processing jobs.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use super::super::upload::read_pdf;
use super::super::AppState;
use super::error_response;
use super::export::csv_response;
use crate::jobs::JobStatus;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobResponse {
    pub job_id: String,
}

/// `POST /api/jobs`: validate the upload, start a background job and return
/// its id immediately.
pub async fn api_create_job(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let limit = state.settings.server.max_upload_bytes();
    let file = match read_pdf(&mut multipart, "file", limit).await {
        Ok(file) => file,
        Err(e) => return e.into_response(),
    };

    let job_id = state
        .jobs
        .spawn_job(state.extractor.clone(), file.bytes)
        .await;
    tracing::info!("Started job {} for {}", job_id, file.filename);

    (StatusCode::ACCEPTED, Json(CreateJobResponse { job_id })).into_response()
}

/// `GET /api/jobs/:id`
pub async fn api_job_status(State(state): State<AppState>, Path(job_id): Path<String>) -> Response {
    match state.jobs.get(&job_id).await {
        Some(job) => Json(job).into_response(),
        None => error_response(StatusCode::NOT_FOUND, format!("Unknown job: {}", job_id)),
    }
}

/// `GET /api/jobs/:id/csv`: CSV of a finished job.
pub async fn api_job_csv(State(state): State<AppState>, Path(job_id): Path<String>) -> Response {
    let Some(job) = state.jobs.get(&job_id).await else {
        return error_response(StatusCode::NOT_FOUND, format!("Unknown job: {}", job_id));
    };

    match (job.status, job.result) {
        (JobStatus::Done, Some(result)) => csv_response(&result.rubrics, None),
        (JobStatus::Error, _) => error_response(
            StatusCode::CONFLICT,
            format!(
                "Job failed: {}",
                job.error.unwrap_or_else(|| "unknown error".to_string())
            ),
        ),
        _ => error_response(
            StatusCode::CONFLICT,
            format!(
                "Job still processing ({}/{})",
                job.current_chunk, job.total_chunks
            ),
        ),
    }
}
