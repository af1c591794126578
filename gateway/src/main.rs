use axum::middleware;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod auth;
mod config;
mod routes;

use config::Config;
use screening_job::{CannedNarrativeGenerator, FileSystemPdfRenderer, JobManager, XaiNarrativeGenerator};
use tle_catalog::{Catalog, CatalogClient, SpaceTrackClient};

#[derive(Clone)]
pub struct AppState {
    pub job_manager: Arc<JobManager>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "conjunction_gateway=info,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env());

    let catalog_client: Option<Arc<dyn CatalogClient>> = match (
        &config.spacetrack_user,
        &config.spacetrack_pass,
    ) {
        (Some(user), Some(pass)) => {
            tracing::info!("live catalog fetching enabled (space-track)");
            Some(Arc::new(SpaceTrackClient::new(user.clone(), pass.clone())))
        }
        _ => {
            tracing::warn!("SPACETRACK_USER/SPACETRACK_PASS not set: catalog stays upload-only");
            None
        }
    };

    let catalog = Arc::new(Catalog::new(catalog_client.clone(), config.catalog_ttl));

    let narrative: Arc<dyn screening_job::NarrativeGenerator> = match XaiNarrativeGenerator::from_env() {
        Some(gen) => {
            tracing::info!("narrative generation enabled (xAI)");
            Arc::new(gen)
        }
        None => {
            tracing::warn!("XAI_API_KEY not set: narrative falls back to canned text");
            Arc::new(CannedNarrativeGenerator)
        }
    };

    std::fs::create_dir_all(&config.report_dir).ok();
    let pdf_renderer = Arc::new(FileSystemPdfRenderer::new(config.report_dir.clone()));

    let job_manager = JobManager::new(catalog.clone(), catalog_client, narrative, pdf_renderer);

    let state = AppState {
        job_manager,
        config: config.clone(),
    };

    let screen_route = Router::new()
        .route("/screen", post(routes::submit_screen))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_bearer_token));

    let report_dir = config.report_dir.clone();
    let app = Router::new()
        .route("/health", get(health))
        .route("/screen_status/{job_id}", get(routes::screen_status))
        .route("/summary_pdf/{job_id}", get(routes::summary_pdf))
        .merge(screen_route)
        .with_state(state)
        .fallback_service(ServeDir::new(report_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("conjunction screening gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "conjunction-screening-gateway",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
