use axum::{
    Json,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

use crate::aggregator::{self, Paginated};
use crate::clients::{ebay::EbayClient, vinted::VintedClient};
use crate::data_models::{ListingItem, SearchRequest, SearchResponse};
use crate::error::Result;
use crate::export;

use super::AppState;
use super::models::SearchQuery;

pub const DEGRADED_HEADER: &str = "x-degraded-mode";

/// Brands searched by the luxury-bags route when the caller picks none.
pub const LUXURY_BRANDS: &[&str] = &[
    "Louis Vuitton",
    "Chanel",
    "Hermès",
    "Dior",
    "Gucci",
    "Prada",
    "Saint Laurent",
    "Celine",
];

/// eBay "Women's Bags & Handbags".
pub const LUXURY_BAGS_CATEGORY: &str = "169291";

pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn ebay_handler(
    State(state): State<Arc<AppState>>,
    SearchQuery(params): SearchQuery,
) -> Result<Json<SearchResponse>> {
    let request = params.to_request()?;
    Ok(Json(search_ebay(&state, &request).await?))
}

pub async fn luxury_bags_handler(
    State(state): State<Arc<AppState>>,
    SearchQuery(params): SearchQuery,
) -> Result<Json<SearchResponse>> {
    let request = luxury_defaults(params.to_request()?);
    Ok(Json(search_ebay(&state, &request).await?))
}

pub async fn vinted_handler(
    State(state): State<Arc<AppState>>,
    SearchQuery(params): SearchQuery,
) -> Result<Json<SearchResponse>> {
    let request = params.to_request()?;
    Ok(Json(search_vinted(&state, &request).await?))
}

pub async fn vinted_scrape_handler(
    State(state): State<Arc<AppState>>,
    SearchQuery(params): SearchQuery,
) -> Result<Response> {
    let request = params.to_request()?;
    Ok(scrape_vinted(&state, &request).await)
}

pub async fn export_handler(
    State(state): State<Arc<AppState>>,
    SearchQuery(params): SearchQuery,
) -> Result<Response> {
    let request = params.to_request()?;
    let source = params
        .source
        .as_deref()
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "ebay".to_string());

    let mut items = match source.as_str() {
        "vinted" => search_vinted(&state, &request).await?.items,
        "vinted/scrape" | "vinted-scrape" | "scrape" => scrape_page(&state, &request).await.items,
        "luxury-bags" => search_ebay(&state, &luxury_defaults(request.clone())).await?.items,
        _ => search_ebay(&state, &request).await?.items,
    };

    if params.include_vinted() && !source.contains("vinted") && source != "scrape" {
        match search_vinted(&state, &request).await {
            Ok(vinted) => items.extend(vinted.items),
            Err(e) => tracing::warn!(error = %e, "skipping Vinted page in export"),
        }
    }

    let rows = export::to_rows(&items);
    let bytes = export::write_workbook(&rows)?;
    let disposition = format!("attachment; filename=\"{}\"", export::export_filename());

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, export::XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

pub fn luxury_defaults(mut request: SearchRequest) -> SearchRequest {
    if request.search_terms().is_empty() {
        request.brands = LUXURY_BRANDS.iter().map(|b| b.to_string()).collect();
    }
    if request.category.is_none() {
        request.category = Some(LUXURY_BAGS_CATEGORY.to_string());
    }
    request
}

/// Credentials are checked before anything else so a misconfigured deployment fails fast.
pub async fn search_ebay(state: &AppState, request: &SearchRequest) -> Result<SearchResponse> {
    let start = Instant::now();
    let client = EbayClient::from_config(state.http.clone(), &state.config)?;
    let session = client.authorize().await?;
    let page = aggregator::aggregate(&session, request).await?;

    tracing::info!(
        total = page.total_results,
        page = page.current_page,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "eBay search served"
    );
    let message = summary(&page);
    Ok(page.into_response(Some(message)))
}

/// When upstream reports totals its paging is trusted; otherwise the body is
/// treated as the full result set and paginated here.
pub async fn search_vinted(state: &AppState, request: &SearchRequest) -> Result<SearchResponse> {
    let client = VintedClient::from_config(state.http.clone(), &state.config)?;
    let upstream = client.search(request).await?;

    let page = match upstream.total_results {
        Some(total_results) => {
            let fetched = upstream.items.len();
            let items = aggregator::dedupe_by_id(upstream.items);
            let mut items = aggregator::filter_by_price(items, request);
            // Upstream totals still count duplicates and out-of-bounds items removed here.
            let dropped = fetched - items.len();
            aggregator::sort_items(&mut items, request.sort);
            items.truncate(request.page_size);

            let total_results = total_results.saturating_sub(dropped);
            let total_pages = match upstream.total_pages {
                Some(pages) if dropped == 0 => pages,
                _ => aggregator::total_pages(total_results, request.page_size),
            };
            Paginated {
                items,
                total_results,
                total_pages,
                current_page: request.page,
            }
        }
        None => aggregator::finalize(upstream.items, request),
    };

    let message = summary(&page);
    Ok(page.into_response(Some(message)))
}

pub async fn scrape_vinted(state: &AppState, request: &SearchRequest) -> Response {
    let body = scrape_page(state, request).await;
    let degraded = body.degraded;
    let mut response = Json(body).into_response();
    if degraded {
        response
            .headers_mut()
            .insert(DEGRADED_HEADER, HeaderValue::from_static("true"));
    }
    response
}

/// The scraped page as displayed: live results paginated, or the lone placeholder.
pub async fn scrape_page(state: &AppState, request: &SearchRequest) -> SearchResponse {
    let outcome = state.scraper.scrape(request).await;
    if outcome.degraded {
        return degraded_response(outcome.items);
    }

    let page = aggregator::finalize(outcome.items, request);
    let message = summary(&page);
    page.into_response(Some(message))
}

fn degraded_response(items: Vec<ListingItem>) -> SearchResponse {
    SearchResponse {
        success: true,
        total_results: items.len(),
        total_pages: 1,
        current_page: 1,
        items,
        message: Some(
            "Live listings could not be loaded right now; showing a placeholder instead."
                .to_string(),
        ),
        degraded: true,
    }
}

fn summary(page: &Paginated) -> String {
    format!(
        "Found {} listings (page {} of {})",
        page.total_results,
        page.current_page,
        page.total_pages.max(1)
    )
}
