//! Shared helpers for the HTTP integration tests.
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{body::Body, http::Request, Router};
use vision_labeler::{create_app, AppError, AppState, Config, LabelDetector, LabelResult};

pub const BOUNDARY: &str = "----visionlabelerboundary";

/// Detector that answers from a canned result and records what it was sent.
#[derive(Default)]
pub struct StubDetector {
    labels: Vec<LabelResult>,
    failure: Option<String>,
    calls: AtomicUsize,
    seen: Mutex<Vec<Vec<u8>>>,
}

impl StubDetector {
    pub fn returning(labels: &[(&str, f64)]) -> Arc<Self> {
        Arc::new(StubDetector {
            labels: labels
                .iter()
                .map(|(description, score)| LabelResult {
                    description: description.trim().to_string(),
                    score: *score,
                })
                .collect(),
            ..Default::default()
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(StubDetector {
            failure: Some(message.to_string()),
            ..Default::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<Vec<u8>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl LabelDetector for StubDetector {
    async fn detect_labels(&self, bytes: &[u8]) -> vision_labeler::Result<Vec<LabelResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(bytes.to_vec());
        match &self.failure {
            Some(message) => Err(AppError::ExternalService(message.clone())),
            None => Ok(self.labels.clone()),
        }
    }
}

pub fn test_config() -> Config {
    Config {
        static_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("public"),
        ..Config::default()
    }
}

pub fn app_with(detector: Arc<StubDetector>) -> Router {
    create_app(AppState::new(detector, test_config()))
}

/// One multipart part: (field name, optional filename + content type, body).
pub struct Part<'a> {
    pub name: &'a str,
    pub file: Option<(&'a str, &'a str)>,
    pub body: &'a [u8],
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part.file {
            Some((filename, content_type)) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        part.name, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name)
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(part.body);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn upload_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/uploadImage")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

pub fn file_upload(body: &[u8], content_type: &str) -> Request<Body> {
    upload_request(&[Part {
        name: "file",
        file: Some(("upload.bin", content_type)),
        body,
    }])
}

pub async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Lines inside the results `<pre>` block.
pub fn label_lines(html: &str) -> Vec<String> {
    let start = html.find("<pre class=\"labels\">").expect("labels block") + "<pre class=\"labels\">".len();
    let end = html[start..].find("</pre>").expect("end of labels block") + start;
    html[start..end]
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Value of the first `<img src="...">` attribute.
pub fn img_src(html: &str) -> String {
    let start = html.find("<img src=\"").expect("img tag") + "<img src=\"".len();
    let end = html[start..].find('"').expect("end of src") + start;
    html[start..end].to_string()
}
