//! HTTP API for uploading rubric PDFs and collecting scores.
//!
//! Provides:
//! - Synchronous processing (`/api/process`) for small uploads
//! - Background jobs with progress polling (`/api/jobs`)
//! - CSV export of finished jobs and of edited records
//! - Raw OCR text extraction (`/extract`) and a health probe

mod handlers;
mod routes;
mod upload;

pub use routes::create_router;
pub use upload::{UploadError, UploadedFile, MAX_FILES_PER_REQUEST};

use std::sync::Arc;
use std::time::Duration;

use crate::config::Settings;
use crate::extraction::{ExtractionClient, Extractor, LocalOcr};
use crate::jobs::JobStore;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    /// Backend used for rubric processing.
    pub extractor: Arc<dyn Extractor>,
    /// Local OCR for `/extract`, regardless of the configured backend.
    pub local_ocr: Arc<LocalOcr>,
    pub jobs: JobStore,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let extractor: Arc<dyn Extractor> = Arc::new(ExtractionClient::from_settings(&settings));
        Self::with_extractor(settings, extractor)
    }

    pub fn with_extractor(settings: Settings, extractor: Arc<dyn Extractor>) -> Self {
        Self {
            local_ocr: Arc::new(LocalOcr::new(settings.ocr.clone())),
            jobs: JobStore::new(settings.server.job_ttl()),
            extractor,
            settings: Arc::new(settings),
        }
    }
}

/// Start the web server.
pub async fn serve(settings: Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings);

    let sweep_every = state
        .settings
        .server
        .job_ttl()
        .min(Duration::from_secs(60))
        .max(Duration::from_secs(1));
    state.jobs.spawn_sweeper(sweep_every);

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    tracing::info!("Starting server at http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use std::path::PathBuf;
    use tower::ServiceExt;

    use crate::config::OcrSettings;
    use crate::pdf::text_pdf;
    use crate::pipeline::tests::TextLayerExtractor;

    const BOUNDARY: &str = "rubricly-test-boundary";

    fn test_settings() -> Settings {
        Settings {
            ocr: OcrSettings {
                tesseract_cmd: Some(PathBuf::from("/nonexistent/bin/tesseract")),
                poppler_path: Some(PathBuf::from("/nonexistent/poppler")),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn setup_test_app() -> (axum::Router, AppState) {
        let state =
            AppState::with_extractor(test_settings(), Arc::new(TextLayerExtractor::new()));
        (create_router(state.clone()), state)
    }

    fn sample_pdf() -> Vec<u8> {
        text_pdf(&[
            &["Group Name: Falcon", "Project Motivation: 4.5"],
            &["Budget: 3"],
            &["Comments: Clear goals"],
            &["Group Name: Heron", "Budget: 5"],
        ])
    }

    /// (field, filename, content type, bytes)
    fn multipart_request(uri: &str, parts: &[(&str, &str, &str, &[u8])]) -> Request<Body> {
        let mut body = Vec::new();
        for (field, filename, content_type, bytes) in parts {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                    BOUNDARY, field, filename, content_type
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_backend_and_tools() {
        let (app, _) = setup_test_app();
        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["backend"], "local");
        assert_eq!(json["tesseractAvailable"], false);
        assert_eq!(json["popplerAvailable"], false);
    }

    #[tokio::test]
    async fn test_process_returns_aggregate() {
        let (app, _) = setup_test_app();
        let pdf = sample_pdf();
        let response = app
            .oneshot(multipart_request(
                "/api/process",
                &[("file", "rubrics.pdf", "application/pdf", &pdf)],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["totalChunks"], 2);
        assert_eq!(json["totalSucceeded"], 2);
        assert_eq!(json["rubrics"][0]["groupName"], "Falcon");
        assert_eq!(json["rubrics"][0]["projectMotivationScore"], "4.5");
        assert_eq!(json["rubrics"][0]["comments"], "Clear goals");
        assert_eq!(json["rubrics"][1]["startPage"], 4);
        assert_eq!(json["rubrics"][1]["budgetScore"], "5");
    }

    #[tokio::test]
    async fn test_process_reads_only_the_first_file() {
        let (app, _) = setup_test_app();
        let pdf = sample_pdf();
        let response = app
            .oneshot(multipart_request(
                "/api/process",
                &[
                    ("file", "rubrics.pdf", "application/pdf", &pdf),
                    ("file", "notes.txt", "text/plain", b"Budget: 5"),
                ],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["totalChunks"], 2);
    }

    #[tokio::test]
    async fn test_process_rejects_non_pdf() {
        let (app, _) = setup_test_app();
        let response = app
            .oneshot(multipart_request(
                "/api/process",
                &[("file", "notes.txt", "text/plain", b"Budget: 5")],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("PDF"));
    }

    #[tokio::test]
    async fn test_process_requires_file_field() {
        let (app, _) = setup_test_app();
        let pdf = sample_pdf();
        let response = app
            .oneshot(multipart_request(
                "/api/process",
                &[("attachment", "rubrics.pdf", "application/pdf", &pdf)],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_process_rejects_oversized_upload() {
        let mut settings = test_settings();
        settings.server.max_upload_mb = 1;
        let state = AppState::with_extractor(settings, Arc::new(TextLayerExtractor::new()));
        let app = create_router(state);

        let mut big = b"%PDF-1.5\n".to_vec();
        big.resize(1024 * 1024 + 1, b' ');
        let response = app
            .oneshot(multipart_request(
                "/api/process",
                &[("file", "big.pdf", "application/pdf", &big)],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_process_unreadable_pdf_is_unprocessable() {
        let (app, _) = setup_test_app();
        let response = app
            .oneshot(multipart_request(
                "/api/process",
                &[("file", "broken.pdf", "application/pdf", b"%PDF-1.5 truncated")],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_job_lifecycle() {
        let (app, _) = setup_test_app();
        let pdf = sample_pdf();
        let response = app
            .clone()
            .oneshot(multipart_request(
                "/api/jobs",
                &[("file", "rubrics.pdf", "application/pdf", &pdf)],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let job_id = body_json(response).await["jobId"]
            .as_str()
            .unwrap()
            .to_string();

        let mut status = serde_json::Value::Null;
        for _ in 0..200 {
            let response = app
                .clone()
                .oneshot(get(&format!("/api/jobs/{}", job_id)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            status = body_json(response).await;
            if status["status"] != "processing" {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(status["status"], "done");
        assert_eq!(status["currentChunk"], 2);
        assert_eq!(status["totalChunks"], 2);
        assert_eq!(status["result"]["rubrics"][0]["groupName"], "Falcon");

        let response = app
            .oneshot(get(&format!("/api/jobs/{}/csv", job_id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv"));
        let csv = body_text(response).await;
        assert_eq!(csv.lines().count(), 3);
        assert!(csv.starts_with("Chunk,Start Page,End Page,Group Name,Advisor Name,Project Motivation,"));
        assert!(csv.lines().nth(1).unwrap().starts_with("1,1,3,Falcon,,4.5,"));
    }

    #[tokio::test]
    async fn test_unknown_job_is_not_found() {
        let (app, _) = setup_test_app();
        let response = app.clone().oneshot(get("/api/jobs/nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = app.oneshot(get("/api/jobs/nope/csv")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_csv_of_running_job_conflicts() {
        let (app, state) = setup_test_app();
        let job_id = state.jobs.create().await;
        let response = app
            .oneshot(get(&format!("/api/jobs/{}/csv", job_id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_export_posted_records() {
        let (app, _) = setup_test_app();
        let body = serde_json::json!({
            "filename": "spring.pdf",
            "rubrics": [{
                "chunkNumber": 1, "startPage": 1, "endPage": 3,
                "groupName": "Falcon, Team",
                "budgetScore": "5", "timelineScore": "4.5",
                "comments": "Edited \"by hand\""
            }]
        });
        let request = Request::builder()
            .method("POST")
            .uri("/api/export/csv")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"spring-scores.csv\""
        );
        let csv = body_text(response).await;
        let row = csv.lines().nth(1).unwrap();
        assert!(row.starts_with("1,1,3,\"Falcon, Team\",,"));
        assert!(row.contains(",9.5,\"Edited \"\"by hand\"\"\","));
    }

    #[tokio::test]
    async fn test_extract_returns_text_per_file() {
        let (app, _) = setup_test_app();
        let typed = text_pdf(&[&["Budget: 4"]]);
        let other = text_pdf(&[&["Timeline: 2"]]);
        let response = app
            .oneshot(multipart_request(
                "/extract",
                &[
                    ("files", "a.pdf", "application/pdf", &typed),
                    ("files", "b.pdf", "application/pdf", &other),
                ],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let results = json["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["filename"], "a.pdf");
        assert!(results[0]["text"].as_str().unwrap().contains("Budget: 4"));
        assert_eq!(results[1]["filename"], "b.pdf");
        assert!(results[1]["text"].as_str().unwrap().contains("Timeline: 2"));
    }
}
