use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;

use crate::data_models::{
    DEFAULT_PAGE_SIZE, EbayMarketplace, MAX_PAGE_SIZE, MarketSelection, SearchRequest, SortKey,
};
use crate::error::{AppError, Result};

/// Raw query string as sent by the UI. Numbers are kept as strings so a bad value
/// falls back to its default instead of rejecting the whole request.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
    pub search_term: Option<String>,
    pub brand: Option<String>,
    pub brands: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub country: Option<String>,
    pub page: Option<String>,
    pub items_per_page: Option<String>,
    #[serde(rename = "itemsPerPage")]
    pub items_per_page_camel: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,

    /// Export only: which backend produced the page being exported.
    pub source: Option<String>,
    /// Export only: also merge one Vinted page.
    pub include_vinted: Option<String>,
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_price(v: &Option<String>) -> Option<f64> {
    non_empty(v)
        .and_then(|s| s.replace(',', ".").parse::<f64>().ok())
        .filter(|p| p.is_finite() && *p >= 0.0)
}

fn parse_count(v: &Option<String>) -> Option<usize> {
    non_empty(v).and_then(|s| s.parse::<usize>().ok())
}

impl SearchParams {
    pub fn to_request(&self) -> Result<SearchRequest> {
        let query = non_empty(&self.search)
            .or_else(|| non_empty(&self.search_term))
            .map(str::to_string);

        let brands = non_empty(&self.brands)
            .or_else(|| non_empty(&self.brand))
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|b| !b.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let min_price = parse_price(&self.min_price);
        let max_price = parse_price(&self.max_price);
        if let (Some(min), Some(max)) = (min_price, max_price) {
            if min > max {
                return Err(AppError::BadRequest(
                    "Minimum price cannot be greater than maximum price.".to_string(),
                ));
            }
        }

        let country = non_empty(&self.country).map(str::to_ascii_lowercase);
        let markets = match country.as_deref() {
            Some("global") | Some("all") | Some("worldwide") => MarketSelection::Global,
            Some(code) => match EbayMarketplace::from_country_code(code) {
                Some(m) => MarketSelection::Single(m),
                None => {
                    tracing::warn!(country = code, "no eBay site for country, using default");
                    MarketSelection::Single(EbayMarketplace::Fr)
                }
            },
            None => MarketSelection::Single(EbayMarketplace::Fr),
        };

        let page = parse_count(&self.page).unwrap_or(1).max(1);
        let page_size = parse_count(&self.items_per_page)
            .or_else(|| parse_count(&self.items_per_page_camel))
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let sort = non_empty(&self.sort_by)
            .and_then(SortKey::parse)
            .unwrap_or_default();

        Ok(SearchRequest {
            query,
            brands,
            category: non_empty(&self.category).map(str::to_string),
            min_price,
            max_price,
            markets,
            country: country.filter(|c| !matches!(c.as_str(), "global" | "all" | "worldwide")),
            page,
            page_size,
            sort,
        })
    }

    pub fn include_vinted(&self) -> bool {
        matches!(
            non_empty(&self.include_vinted).map(str::to_ascii_lowercase).as_deref(),
            Some("true") | Some("1") | Some("yes") | Some("on")
        )
    }
}

/// Query-string extractor whose rejection goes through the usual error envelope.
pub struct SearchQuery(pub SearchParams);

pub const MALFORMED_QUERY_MESSAGE: &str = "The search parameters could not be read.";

#[async_trait]
impl<S> FromRequestParts<S> for SearchQuery
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        match Query::<SearchParams>::from_request_parts(parts, state).await {
            Ok(Query(params)) => Ok(SearchQuery(params)),
            Err(rejection) => {
                tracing::debug!(reason = %rejection.body_text(), "unreadable query string");
                Err(AppError::BadRequest(MALFORMED_QUERY_MESSAGE.to_string()))
            }
        }
    }
}
