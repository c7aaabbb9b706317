//! HTTP request handlers.

mod export;
mod extract;
mod health;
mod jobs;
mod process;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

pub use export::api_export_csv;
pub use extract::extract_text;
pub use health::health;
pub use jobs::{api_create_job, api_job_csv, api_job_status};
pub use process::api_process;

/// JSON `{ "error": message }` with the given status.
pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}
