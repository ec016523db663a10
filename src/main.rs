use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use listing_hub::api::{AppState, create_router};
use listing_hub::config::CONFIG;
use listing_hub::fallback::WebDriverLauncher;

#[derive(Debug, Parser)]
#[command(name = "listing-hub", about = "Marketplace listing aggregator")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:3000")]
    bind: String,

    /// Directory holding the search UI
    #[arg(long, default_value = "static")]
    static_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber (handles both tracing and log crate)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let args = Args::parse();
    let config = CONFIG.clone();

    if config.ebay_credentials().is_err() {
        tracing::warn!("eBay credentials not set; eBay routes will answer 400");
    }

    let launcher = Arc::new(WebDriverLauncher::new(config.webdriver_url.clone()));
    let state = Arc::new(AppState::new(config, launcher)?);
    let app = create_router(state, &args.static_dir);

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
