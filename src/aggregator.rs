use std::collections::HashSet;

use futures::future::join_all;

use crate::clients::ListingSource;
use crate::data_models::{EbayMarketplace, ListingItem, SearchRequest, SearchResponse, SortKey};
use crate::error::{AppError, Result};

/// Upper bound the eBay Browse API accepts for `limit`.
pub const MAX_FETCH_PER_REQUEST: usize = 200;

#[derive(Debug, Clone, PartialEq)]
pub struct Paginated {
    pub items: Vec<ListingItem>,
    pub total_results: usize,
    pub total_pages: usize,
    pub current_page: usize,
}

impl Paginated {
    pub fn into_response(self, message: Option<String>) -> SearchResponse {
        SearchResponse {
            success: true,
            items: self.items,
            total_results: self.total_results,
            total_pages: self.total_pages,
            current_page: self.current_page,
            message,
            degraded: false,
        }
    }
}

/// Keeps the first occurrence of every id, preserving order.
pub fn dedupe_by_id(items: Vec<ListingItem>) -> Vec<ListingItem> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(item.id.clone()))
        .collect()
}

pub fn filter_by_price(items: Vec<ListingItem>, request: &SearchRequest) -> Vec<ListingItem> {
    items
        .into_iter()
        .filter(|item| request.price_in_bounds(item.price.value))
        .collect()
}

/// Stable sort: equal keys keep their insertion order.
pub fn sort_items(items: &mut [ListingItem], key: SortKey) {
    match key {
        SortKey::PriceAsc => items.sort_by(|a, b| a.price.value.total_cmp(&b.price.value)),
        SortKey::PriceDesc => items.sort_by(|a, b| b.price.value.total_cmp(&a.price.value)),
        SortKey::Title => items.sort_by_cached_key(|item| item.title.to_lowercase()),
    }
}

pub fn total_pages(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// Slices page `page` (1-based) of size `page_size`. Out-of-range pages are empty.
pub fn paginate(items: Vec<ListingItem>, page: usize, page_size: usize) -> Paginated {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total_results = items.len();
    let start = (page - 1).saturating_mul(page_size);

    let page_items = if start >= total_results {
        Vec::new()
    } else {
        items.into_iter().skip(start).take(page_size).collect()
    };

    Paginated {
        items: page_items,
        total_results,
        total_pages: total_pages(total_results, page_size),
        current_page: page,
    }
}

/// Dedupe, bound-filter, sort and paginate a merged result list.
pub fn finalize(items: Vec<ListingItem>, request: &SearchRequest) -> Paginated {
    let items = dedupe_by_id(items);
    let mut items = filter_by_price(items, request);
    sort_items(&mut items, request.sort);
    paginate(items, request.page, request.page_size)
}

/// How many listings each upstream call should ask for so page `page` can be filled.
pub fn fetch_limit(request: &SearchRequest) -> usize {
    request
        .page
        .max(1)
        .saturating_mul(request.page_size.max(1))
        .min(MAX_FETCH_PER_REQUEST)
}

/// Runs one search per (term, marketplace) pair concurrently and merges the successes.
///
/// Individual failures are logged and dropped. The first error is returned only
/// when no request succeeded at all.
pub async fn aggregate<S>(source: &S, request: &SearchRequest) -> Result<Paginated>
where
    S: ListingSource + ?Sized,
{
    let terms = request.search_terms();
    if terms.is_empty() {
        return Err(AppError::BadRequest(
            "Provide a search term or at least one brand.".to_string(),
        ));
    }
    let markets = request.markets.marketplaces();

    let pairs: Vec<(&str, EbayMarketplace)> = terms
        .iter()
        .flat_map(|term| markets.iter().map(move |m| (term.as_str(), *m)))
        .collect();

    tracing::info!(
        terms = terms.len(),
        marketplaces = markets.len(),
        "fanning out {} marketplace searches",
        pairs.len()
    );

    let results = join_all(
        pairs
            .iter()
            .map(|(term, market)| source.search(term, *market, request)),
    )
    .await;

    let mut merged = Vec::new();
    let mut first_error = None;
    let mut succeeded = 0usize;
    for ((term, market), result) in pairs.iter().zip(results) {
        match result {
            Ok(items) => {
                succeeded += 1;
                merged.extend(items);
            }
            Err(e) => {
                tracing::warn!(term, marketplace = market.id(), error = %e, "marketplace search dropped");
                first_error.get_or_insert(e);
            }
        }
    }

    if succeeded == 0 {
        if let Some(e) = first_error {
            return Err(e);
        }
    }

    let page = finalize(merged, request);
    tracing::info!(
        succeeded,
        failed = pairs.len() - succeeded,
        total = page.total_results,
        "aggregation finished"
    );
    Ok(page)
}
