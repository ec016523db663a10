use reqwest::{Client, Url};
use serde_json::Value;

use super::{ensure_success, parse_url};
use crate::config::Config;
use crate::data_models::{ListingItem, Marketplace, Price, SearchRequest, UNKNOWN_CONDITION};
use crate::error::{AppError, Result};

const DEFAULT_CURRENCY: &str = "EUR";

/// Client for the hosted Vinted scraping API.
#[derive(Debug, Clone)]
pub struct VintedClient {
    http: Client,
    url: String,
    api_key: String,
    key_header: String,
}

/// One page as reported by the hosted API. Totals are only present when upstream paginates.
#[derive(Debug, Clone, PartialEq)]
pub struct VintedPage {
    pub items: Vec<ListingItem>,
    pub total_results: Option<usize>,
    pub total_pages: Option<usize>,
}

impl VintedClient {
    pub fn from_config(http: Client, config: &Config) -> Result<VintedClient> {
        let api_key = config
            .vinted_api_key
            .clone()
            .ok_or(AppError::ConfigurationMissing("VINTED_API_KEY"))?;
        Ok(VintedClient {
            http,
            url: config.vinted_api_url.clone(),
            api_key,
            key_header: config.vinted_api_key_header.clone(),
        })
    }

    pub fn search_url(&self, request: &SearchRequest) -> Result<Url> {
        let mut url = parse_url(&self.url)?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(q) = request.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
                pairs.append_pair("search", q);
            }
            let brands = request.effective_brands();
            if !brands.is_empty() {
                pairs.append_pair("brand", &brands.join(","));
            }
            if let Some(category) = request.category.as_deref().filter(|c| !c.is_empty()) {
                pairs.append_pair("category", category);
            }
            if let Some(min) = request.min_price {
                pairs.append_pair("min_price", &min.to_string());
            }
            if let Some(max) = request.max_price {
                pairs.append_pair("max_price", &max.to_string());
            }
            if let Some(country) = request.country.as_deref().filter(|c| !c.is_empty()) {
                pairs.append_pair("country", country);
            }
            pairs.append_pair("page", &request.page.to_string());
            pairs.append_pair("items_per_page", &request.page_size.to_string());
        }
        Ok(url)
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<VintedPage> {
        let url = self.search_url(request)?;
        tracing::debug!(%url, "Vinted search");

        let resp = self
            .http
            .get(url)
            .header(self.key_header.as_str(), &self.api_key)
            .send()
            .await?;
        let body: Value = ensure_success(resp).await?.json().await?;
        parse_page(&body)
    }
}

/// Maps the hosted API's body onto a `VintedPage`. An explicit `success: false` is an upstream failure.
pub fn parse_page(body: &Value) -> Result<VintedPage> {
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        let message = body
            .get("message")
            .or_else(|| body.get("error"))
            .and_then(Value::as_str)
            .unwrap_or("upstream reported failure")
            .to_string();
        return Err(AppError::UpstreamUnavailable {
            status: 200,
            message,
        });
    }

    let raw_items = body
        .get("items")
        .or_else(|| body.get("data"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let items = raw_items.iter().filter_map(parse_item).collect();

    let pagination = body.get("pagination");
    let total_results = pagination
        .and_then(|p| p.get("total_entries").or_else(|| p.get("totalResults")))
        .or_else(|| body.get("totalResults"))
        .and_then(as_usize);
    let total_pages = pagination
        .and_then(|p| p.get("total_pages").or_else(|| p.get("totalPages")))
        .or_else(|| body.get("totalPages"))
        .and_then(as_usize);

    Ok(VintedPage {
        items,
        total_results,
        total_pages,
    })
}

fn parse_item(raw: &Value) -> Option<ListingItem> {
    let id = match raw.get("id")? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };

    let fallback_currency = raw
        .get("currency")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_CURRENCY);
    let price = match raw.get("price") {
        Some(Value::Object(obj)) => Price::new(
            obj.get("amount").and_then(as_f64).unwrap_or(0.0),
            obj.get("currency_code")
                .and_then(Value::as_str)
                .unwrap_or(fallback_currency),
        ),
        Some(other) => Price::new(as_f64(other).unwrap_or(0.0), fallback_currency),
        None => Price::new(0.0, fallback_currency),
    };

    let image_url = raw
        .pointer("/photo/url")
        .or_else(|| raw.pointer("/photos/0/url"))
        .or_else(|| raw.get("image"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Some(ListingItem {
        id,
        title: str_field(raw, "title").unwrap_or_default(),
        price,
        condition: str_field(raw, "status")
            .or_else(|| str_field(raw, "condition"))
            .unwrap_or_else(|| UNKNOWN_CONDITION.to_string()),
        seller: raw
            .pointer("/user/login")
            .and_then(Value::as_str)
            .map(str::to_string),
        image_url,
        item_url: str_field(raw, "url").unwrap_or_default(),
        source: Marketplace::Vinted,
    })
}

fn str_field(raw: &Value, key: &str) -> Option<String> {
    raw.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}

fn as_usize(v: &Value) -> Option<usize> {
    match v {
        Value::Number(n) => n.as_u64().map(|n| n as usize),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
