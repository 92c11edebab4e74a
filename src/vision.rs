//! Label detection against the Cloud Vision `images:annotate` REST endpoint.

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::config::VisionConfig;
use crate::error::{AppError, Result};

/// A label as shown to the user. Order is the service's order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelResult {
    pub description: String,
    /// Confidence in `[0, 1]`.
    pub score: f64,
}

#[async_trait]
pub trait LabelDetector: Send + Sync {
    /// Issue one detection call for `bytes`. Never retried, never cached.
    async fn detect_labels(&self, bytes: &[u8]) -> Result<Vec<LabelResult>>;
}

// Wire types for images:annotate.

#[derive(Debug, Serialize)]
struct AnnotateRequest<'a> {
    requests: Vec<AnnotateImageRequest<'a>>,
}

#[derive(Debug, Serialize)]
struct AnnotateImageRequest<'a> {
    image: ImageContent,
    features: Vec<Feature<'a>>,
}

#[derive(Debug, Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Feature<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    max_results: u32,
}

#[derive(Debug, Default, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Option<Vec<AnnotateImageResponse>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    label_annotations: Option<Vec<EntityAnnotation>>,
    #[serde(default)]
    error: Option<ServiceStatus>,
}

#[derive(Debug, Deserialize)]
struct EntityAnnotation {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    score: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ServiceStatus {
    #[serde(default)]
    code: Option<i32>,
    #[serde(default)]
    message: Option<String>,
}

impl ServiceStatus {
    fn into_error(self) -> AppError {
        let message = self
            .message
            .unwrap_or_else(|| "label detection failed".to_string());
        match self.code {
            Some(code) => AppError::ExternalService(format!("{} (code {})", message, code)),
            None => AppError::ExternalService(message),
        }
    }
}

impl From<EntityAnnotation> for LabelResult {
    fn from(annotation: EntityAnnotation) -> Self {
        LabelResult {
            description: annotation
                .description
                .as_deref()
                .unwrap_or_default()
                .trim()
                .to_string(),
            score: annotation.score.unwrap_or(0.0).clamp(0.0, 1.0),
        }
    }
}

/// Turn a decoded annotate response into labels. Missing annotations mean
/// "no labels"; an error object on the image response is a failure.
fn normalize(response: AnnotateResponse) -> Result<Vec<LabelResult>> {
    let first = response
        .responses
        .and_then(|responses| responses.into_iter().next())
        .unwrap_or_default();

    if let Some(status) = first.error {
        return Err(status.into_error());
    }

    Ok(first
        .label_annotations
        .unwrap_or_default()
        .into_iter()
        .map(LabelResult::from)
        .collect())
}

/// Client for the hosted vision service. Cheap to share behind an `Arc`;
/// the underlying HTTP client is built on first use and then reused.
pub struct CloudVisionClient {
    config: VisionConfig,
    http: OnceCell<reqwest::Client>,
}

impl CloudVisionClient {
    pub fn new(config: VisionConfig) -> Self {
        CloudVisionClient {
            config,
            http: OnceCell::new(),
        }
    }

    fn http(&self) -> Result<&reqwest::Client> {
        self.http.get_or_try_init(|| {
            tracing::debug!("building vision http client");
            reqwest::Client::builder().build().map_err(AppError::from)
        })
    }

    fn url(&self) -> String {
        match &self.config.api_key {
            Some(key) => format!("{}?key={}", self.config.endpoint, key),
            None => self.config.endpoint.clone(),
        }
    }
}

#[async_trait]
impl LabelDetector for CloudVisionClient {
    async fn detect_labels(&self, bytes: &[u8]) -> Result<Vec<LabelResult>> {
        let payload = AnnotateRequest {
            requests: vec![AnnotateImageRequest {
                image: ImageContent {
                    content: general_purpose::STANDARD.encode(bytes),
                },
                features: vec![Feature {
                    kind: "LABEL_DETECTION",
                    max_results: self.config.max_results,
                }],
            }],
        };

        tracing::info!(size_bytes = bytes.len(), "sending label detection request");

        let mut request = self.http()?.post(self.url()).json(&payload);
        if let Some(token) = &self.config.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // The service wraps failures as {"error": {...}}; fall back to the raw body.
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
                .unwrap_or(body);
            tracing::warn!(%status, "label detection rejected");
            return Err(AppError::ExternalService(format!(
                "Vision API error {}: {}",
                status, message
            )));
        }

        let decoded: AnnotateResponse = serde_json::from_str(&body).map_err(|e| {
            AppError::ExternalService(format!("invalid vision response: {}", e))
        })?;
        let labels = normalize(decoded)?;

        tracing::info!(count = labels.len(), "labels detected");
        Ok(labels)
    }
}
