use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use super::{ListingSource, ensure_success, parse_url};
use crate::aggregator::fetch_limit;
use crate::config::Config;
use crate::data_models::{
    EbayMarketplace, ListingItem, Marketplace, Price, SearchRequest, UNKNOWN_CONDITION,
};
use crate::error::{AppError, Result};

const TOKEN_PATH: &str = "/identity/v1/oauth2/token";
const SEARCH_PATH: &str = "/buy/browse/v1/item_summary/search";
const OAUTH_SCOPE: &str = "https://api.ebay.com/oauth/api_scope";

/// Client for the eBay Browse API. Built only when both credentials are configured.
#[derive(Debug, Clone)]
pub struct EbayClient {
    http: Client,
    base: String,
    client_id: String,
    client_secret: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchPagedCollection {
    #[serde(default)]
    item_summaries: Vec<ItemSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemSummary {
    item_id: String,
    #[serde(default)]
    title: String,
    price: Option<Amount>,
    condition: Option<String>,
    seller: Option<Seller>,
    image: Option<Image>,
    item_web_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Amount {
    value: String,
    currency: String,
}

#[derive(Debug, Deserialize)]
struct Seller {
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Image {
    image_url: Option<String>,
}

impl EbayClient {
    pub fn from_config(http: Client, config: &Config) -> Result<EbayClient> {
        let (id, secret) = config
            .ebay_credentials()
            .map_err(AppError::ConfigurationMissing)?;
        Ok(EbayClient {
            http,
            base: config.ebay_api_base.trim_end_matches('/').to_string(),
            client_id: id.to_string(),
            client_secret: secret.to_string(),
        })
    }

    /// Exchanges the client credentials for an application token.
    /// Tokens are scoped to one inbound search; nothing is cached.
    pub async fn authorize(&self) -> Result<EbaySession<'_>> {
        let url = format!("{}{}", self.base, TOKEN_PATH);
        let resp = self
            .http
            .post(&url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials"), ("scope", OAUTH_SCOPE)])
            .send()
            .await?;
        let token: TokenResponse = ensure_success(resp).await?.json().await?;
        log::debug!("obtained eBay application token");
        Ok(EbaySession {
            client: self,
            token: token.access_token,
        })
    }

    pub fn search_url(
        &self,
        term: &str,
        marketplace: EbayMarketplace,
        request: &SearchRequest,
    ) -> Result<Url> {
        let mut url = parse_url(&format!("{}{}", self.base, SEARCH_PATH))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", term);
            if let Some(category) = request.category.as_deref().filter(|c| !c.is_empty()) {
                pairs.append_pair("category_ids", category);
            }
            if let Some(filter) = price_filter(request, marketplace) {
                pairs.append_pair("filter", &filter);
            }
            pairs.append_pair("limit", &fetch_limit(request).to_string());
            pairs.append_pair("offset", "0");
        }
        Ok(url)
    }
}

/// `price:[min..max],priceCurrency:CUR`, with either bound left open when absent.
fn price_filter(request: &SearchRequest, marketplace: EbayMarketplace) -> Option<String> {
    if request.min_price.is_none() && request.max_price.is_none() {
        return None;
    }
    let min = request.min_price.map(|v| v.to_string()).unwrap_or_default();
    let max = request.max_price.map(|v| v.to_string()).unwrap_or_default();
    Some(format!(
        "price:[{min}..{max}],priceCurrency:{}",
        marketplace.currency()
    ))
}

/// An authorized handle, valid for the duration of one aggregated search.
pub struct EbaySession<'a> {
    client: &'a EbayClient,
    token: String,
}

#[async_trait]
impl ListingSource for EbaySession<'_> {
    async fn search(
        &self,
        term: &str,
        marketplace: EbayMarketplace,
        request: &SearchRequest,
    ) -> Result<Vec<ListingItem>> {
        let url = self.client.search_url(term, marketplace, request)?;
        tracing::debug!(%url, marketplace = marketplace.id(), "eBay search");

        let resp = self
            .client
            .http
            .get(url)
            .bearer_auth(&self.token)
            .header("X-EBAY-C-MARKETPLACE-ID", marketplace.id())
            .send()
            .await?;
        let body: SearchPagedCollection = ensure_success(resp).await?.json().await?;

        Ok(body
            .item_summaries
            .into_iter()
            .map(|summary| summary.into_listing(marketplace))
            .collect())
    }
}

impl ItemSummary {
    fn into_listing(self, marketplace: EbayMarketplace) -> ListingItem {
        let price = match self.price {
            Some(amount) => Price::new(amount.value.parse().unwrap_or(0.0), amount.currency),
            None => Price::new(0.0, marketplace.currency()),
        };
        ListingItem {
            id: self.item_id,
            title: self.title,
            price,
            condition: self
                .condition
                .unwrap_or_else(|| UNKNOWN_CONDITION.to_string()),
            seller: self.seller.and_then(|s| s.username),
            image_url: self.image.and_then(|i| i.image_url).unwrap_or_default(),
            item_url: self.item_web_url.unwrap_or_default(),
            source: Marketplace::Ebay,
        }
    }
}
