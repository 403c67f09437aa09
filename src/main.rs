use anyhow::{Context, Result};
use family_slides_api::{dataset, router, AppState, Config};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "family_slides_api=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    if config.admin_key_is_fallback {
        warn!("Admin reload is only reachable with the generated fallback key");
    }

    let dataset = dataset::load(&config.people_path, config.dataset_settings(), 1)
        .await
        .with_context(|| format!("loading people from {}", config.people_path.display()))?;

    let state = AppState::new(config.clone(), dataset);
    let app = router(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("family-slides-api listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
