use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::AppState;
use super::handlers::{luxury_defaults, scrape_vinted, search_ebay, search_vinted};
use super::models::SearchQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Vinted,
    VintedScrape,
    Ebay,
    LuxuryBags,
}

/// Picks a backend from keywords in the path. Anything unrecognized is a Vinted query.
pub fn resolve_backend(path: &str) -> Backend {
    let path = path.to_ascii_lowercase();
    if path.contains("vinted") {
        if path.contains("scrape") {
            Backend::VintedScrape
        } else {
            Backend::Vinted
        }
    } else if path.contains("ebay") {
        Backend::Ebay
    } else if path.contains("luxury-bags") {
        Backend::LuxuryBags
    } else {
        Backend::Vinted
    }
}

pub async fn dispatch_handler(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    SearchQuery(params): SearchQuery,
) -> Response {
    let backend = resolve_backend(&path);
    tracing::debug!(path = %path, ?backend, "dispatching");

    let request = match params.to_request() {
        Ok(request) => request,
        Err(e) => return e.into_response(),
    };

    let result = match backend {
        Backend::Vinted => search_vinted(&state, &request).await,
        Backend::Ebay => search_ebay(&state, &request).await,
        Backend::LuxuryBags => search_ebay(&state, &luxury_defaults(request)).await,
        Backend::VintedScrape => return scrape_vinted(&state, &request).await,
    };

    match result {
        Ok(body) => Json(body).into_response(),
        Err(e) => e.into_response(),
    }
}
