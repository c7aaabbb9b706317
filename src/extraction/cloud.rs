//! Azure document analysis client.
//!
//! Submits a chunk as base64 JSON and either reads the result from the
//! response or polls the `Operation-Location` handle until the operation
//! reaches a terminal state.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{AnalyzeResult, ExtractError, Extractor, RawResult};
use crate::config::{BackendKind, CloudFlavor, CloudSettings};

/// Azure API key header.
pub const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest {
    base64_source: String,
}

/// Body of a long-running operation status check.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationStatus {
    status: String,
    #[serde(default, alias = "result")]
    analyze_result: Option<AnalyzeResult>,
    #[serde(default)]
    error: Option<ServiceError>,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

enum PollState {
    Running,
    Succeeded(AnalyzeResult),
    Failed(String),
}

impl OperationStatus {
    fn into_state(self) -> PollState {
        match self.status.to_lowercase().as_str() {
            "succeeded" => PollState::Succeeded(self.analyze_result.unwrap_or_default()),
            "failed" | "canceled" | "cancelled" => {
                let message = match self.error {
                    Some(ServiceError {
                        message: Some(message),
                        code,
                    }) => match code {
                        Some(code) => format!("{}: {}", code, message),
                        None => message,
                    },
                    _ => format!("operation ended with status '{}'", self.status),
                };
                PollState::Failed(message)
            }
            _ => PollState::Running,
        }
    }
}

/// Build the analyze URL for a flavor, endpoint, model and API version.
pub fn analyze_url(flavor: CloudFlavor, endpoint: &str, model_id: &str, api_version: &str) -> String {
    let endpoint = endpoint.trim_end_matches('/');
    match flavor {
        CloudFlavor::DocumentIntelligence => format!(
            "{}/documentintelligence/documentModels/{}:analyze?api-version={}",
            endpoint, model_id, api_version
        ),
        CloudFlavor::ContentUnderstanding => format!(
            "{}/contentunderstanding/analyzers/{}:analyze?api-version={}",
            endpoint, model_id, api_version
        ),
    }
}

/// Client for the cloud analysis service.
pub struct CloudClient {
    settings: CloudSettings,
    client: Client,
}

struct Credentials<'a> {
    endpoint: &'a str,
    api_key: &'a str,
    model_id: &'a str,
}

impl CloudClient {
    pub fn new(settings: CloudSettings) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(settings.request_timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                warn!(
                    "Failed to build HTTP client ({}), continuing without a request timeout",
                    e
                );
                Client::new()
            });
        Self { settings, client }
    }

    pub fn settings(&self) -> &CloudSettings {
        &self.settings
    }

    fn credentials(&self) -> Result<Credentials<'_>, ExtractError> {
        let missing = |name: &str| ExtractError::Configuration(format!("{} is not set", name));
        Ok(Credentials {
            endpoint: self
                .settings
                .endpoint
                .as_deref()
                .ok_or_else(|| missing("AZURE_ENDPOINT"))?,
            api_key: self
                .settings
                .api_key
                .as_deref()
                .ok_or_else(|| missing("AZURE_API_KEY"))?,
            model_id: self
                .settings
                .model_id
                .as_deref()
                .ok_or_else(|| missing("AZURE_MODEL_ID"))?,
        })
    }

    /// Submit a chunk and wait for its analysis result.
    pub async fn analyze_document(&self, chunk: &[u8]) -> Result<AnalyzeResult, ExtractError> {
        let creds = self.credentials()?;
        let url = analyze_url(
            self.settings.flavor,
            creds.endpoint,
            creds.model_id,
            self.settings.api_version(),
        );

        let request = AnalyzeRequest {
            base64_source: STANDARD.encode(chunk),
        };

        debug!("Submitting {} bytes to {}", chunk.len(), url);
        let resp = self
            .client
            .post(&url)
            .header(SUBSCRIPTION_KEY_HEADER, creds.api_key)
            .json(&request)
            .send()
            .await?;
        let resp = check_status(resp).await?;

        let location = resp
            .headers()
            .get("operation-location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        match location {
            Some(location) => self.poll(&location, creds.api_key).await,
            None if resp.status() == StatusCode::ACCEPTED => Err(ExtractError::Transport {
                status: Some(StatusCode::ACCEPTED.as_u16()),
                message: "accepted without an Operation-Location header".to_string(),
            }),
            None => {
                let body = resp.text().await?;
                parse_immediate(&body)
            }
        }
    }

    async fn poll(&self, location: &str, api_key: &str) -> Result<AnalyzeResult, ExtractError> {
        let attempts = self.settings.max_poll_attempts;
        for attempt in 1..=attempts {
            tokio::time::sleep(self.settings.poll_interval()).await;

            let resp = self
                .client
                .get(location)
                .header(SUBSCRIPTION_KEY_HEADER, api_key)
                .send()
                .await?;
            let resp = check_status(resp).await?;
            let status = resp.status().as_u16();
            let op: OperationStatus = resp.json().await.map_err(|e| ExtractError::Transport {
                status: Some(status),
                message: format!("invalid operation status: {}", e),
            })?;

            match op.into_state() {
                PollState::Running => {
                    debug!("Analysis still running ({}/{})", attempt, attempts);
                }
                PollState::Succeeded(result) => {
                    info!("Analysis finished after {} status checks", attempt);
                    return Ok(result);
                }
                PollState::Failed(message) => return Err(ExtractError::BackendFailure(message)),
            }
        }
        Err(ExtractError::Timeout { attempts })
    }
}

/// Turn a non-success response into a transport error carrying its body.
async fn check_status(resp: Response) -> Result<Response, ExtractError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ExtractError::Transport {
        status: Some(status.as_u16()),
        message: if body.is_empty() {
            status.canonical_reason().unwrap_or("no response body").to_string()
        } else {
            body
        },
    })
}

/// A synchronous response is either an operation status envelope or a bare
/// analyze result.
fn parse_immediate(body: &str) -> Result<AnalyzeResult, ExtractError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| ExtractError::Transport {
            status: None,
            message: format!("invalid JSON from analysis service: {}", e),
        })?;

    let parse_err = |e: serde_json::Error| ExtractError::Transport {
        status: None,
        message: format!("unexpected analysis response: {}", e),
    };

    if value.get("status").is_some() {
        let op: OperationStatus = serde_json::from_value(value).map_err(parse_err)?;
        return match op.into_state() {
            PollState::Succeeded(result) => Ok(result),
            PollState::Failed(message) => Err(ExtractError::BackendFailure(message)),
            PollState::Running => Err(ExtractError::BackendFailure(
                "service reported a running operation without a handle".to_string(),
            )),
        };
    }

    serde_json::from_value(value).map_err(parse_err)
}

#[async_trait]
impl Extractor for CloudClient {
    fn backend(&self) -> BackendKind {
        BackendKind::Cloud
    }

    async fn analyze(&self, chunk: &[u8]) -> Result<RawResult, ExtractError> {
        self.analyze_document(chunk).await.map(RawResult::Document)
    }
}
