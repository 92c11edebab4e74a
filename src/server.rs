//! HTTP surface: routes, static files, fallbacks and middleware.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    handler::HandlerWithoutStateExt,
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::upload::{receive_image, UploadedImage};
use crate::views;
use crate::vision::{LabelDetector, LabelResult};

#[derive(Clone)]
pub struct AppState {
    pub detector: Arc<dyn LabelDetector>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(detector: Arc<dyn LabelDetector>, config: Config) -> Self {
        AppState {
            detector,
            config: Arc::new(config),
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir)
        .call_fallback_on_method_not_allowed(true)
        .not_found_service(not_found.into_service());

    // A known path with the wrong method is reported as not found too.
    Router::new()
        .route("/", get(views::index).fallback(not_found))
        .route(
            "/uploadImage",
            post(upload_image)
                .fallback(not_found)
                .layer(DefaultBodyLimit::max(state.config.max_upload_bytes)),
        )
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(state.config.bind_addr()).await?;

    tracing::info!("Server is running on http://{}", listener.local_addr()?);

    axum::serve(listener, create_app(state)).await?;
    Ok(())
}

/// `POST /uploadImage`. Success and failure are both rendered as JSON when
/// the client prefers it, and as HTML otherwise.
async fn upload_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Response {
    let json = prefers_json(&headers);

    match detect_upload(&state, multipart).await {
        Ok((image, labels)) if json => views::results_json(&image, &labels).into_response(),
        Ok((image, labels)) => views::results(&image, &labels).into_response(),
        Err(err) if json => {
            err.trace();
            views::failure_json(&err)
        }
        Err(err) => err.into_response(),
    }
}

async fn detect_upload(
    state: &AppState,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<(UploadedImage, Vec<LabelResult>)> {
    let image = match multipart {
        Ok(mut multipart) => receive_image(&mut multipart).await?,
        Err(rejection) => {
            tracing::debug!(%rejection, "upload body is not multipart");
            None
        }
    };

    let Some(image) = image else {
        tracing::info!("upload without a file");
        return Err(AppError::NoFileProvided);
    };

    let labels = state.detector.detect_labels(&image.bytes).await?;
    Ok((image, labels))
}

async fn not_found() -> AppError {
    AppError::RouteNotFound
}

/// Weight the client gives `media_type`, taken from the most specific
/// matching range (`type/subtype`, then `type/*`, then `*/*`). Zero when
/// nothing matches.
fn quality(accept: &str, media_type: &str) -> f32 {
    let main_type = media_type.split('/').next().unwrap_or_default();
    let mut best: Option<(u8, f32)> = None;

    for range in accept.split(',') {
        let mut params = range.split(';');
        let range_type = params.next().unwrap_or_default().trim().to_ascii_lowercase();

        let specificity = if range_type == media_type {
            3
        } else if range_type.strip_suffix("/*") == Some(main_type) {
            2
        } else if range_type == "*/*" {
            1
        } else {
            continue;
        };

        let q = params
            .find_map(|p| p.trim().strip_prefix("q="))
            .and_then(|q| q.trim().parse::<f32>().ok())
            .unwrap_or(1.0);

        if best.map_or(true, |(s, _)| specificity > s) {
            best = Some((specificity, q));
        }
    }

    best.map_or(0.0, |(_, q)| q)
}

/// True when the client weights JSON above HTML.
fn prefers_json(headers: &HeaderMap) -> bool {
    let Some(accept) = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };

    quality(accept, "application/json") > quality(accept, "text/html")
}
