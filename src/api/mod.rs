use axum::{Router, routing::get};
use std::path::Path;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::clients::build_http_client;
use crate::config::Config;
use crate::error::Result;
use crate::fallback::{BrowserLauncher, FallbackScraper, ScraperSettings};

pub mod dispatch;
pub mod handlers;
pub mod models;

/// Read-only state shared by every request.
pub struct AppState {
    pub config: Config,
    pub http: reqwest::Client,
    pub scraper: FallbackScraper,
}

impl AppState {
    pub fn new(config: Config, launcher: Arc<dyn BrowserLauncher>) -> Result<AppState> {
        let http = build_http_client(config.http_timeout)?;
        let scraper = FallbackScraper::new(launcher, ScraperSettings::from_config(&config));
        Ok(AppState {
            config,
            http,
            scraper,
        })
    }
}

pub fn create_router(state: Arc<AppState>, static_dir: impl AsRef<Path>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // API routes
        .route("/api/health", get(handlers::health_handler))
        .route("/api/ebay", get(handlers::ebay_handler))
        .route("/api/luxury-bags", get(handlers::luxury_bags_handler))
        .route("/api/vinted", get(handlers::vinted_handler))
        .route("/api/vinted/scrape", get(handlers::vinted_scrape_handler))
        .route("/api/export", get(handlers::export_handler))
        .route("/api/marketplace/*path", get(dispatch::dispatch_handler))
        .with_state(state)
        // Static file serving for the UI
        .fallback_service(ServeDir::new(static_dir.as_ref()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
