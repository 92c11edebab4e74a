use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use vision_labeler::{serve, AppState, CloudVisionClient, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("vision_labeler=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    if config.vision.api_key.is_none() && config.vision.access_token.is_none() {
        tracing::warn!("no VISION_API_KEY or VISION_ACCESS_TOKEN set; detection calls will be unauthenticated");
    }

    let detector = Arc::new(CloudVisionClient::new(config.vision.clone()));
    let state = AppState::new(detector, config);

    serve(state).await
}
