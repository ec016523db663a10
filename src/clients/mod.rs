use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};

use crate::data_models::{EbayMarketplace, ListingItem, SearchRequest};
use crate::error::{AppError, Result};

pub mod ebay;
pub mod vinted;

pub const USER_AGENT: &str = concat!("listing-hub/", env!("CARGO_PKG_VERSION"));

/// One upstream search for a single term on a single marketplace.
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn search(
        &self,
        term: &str,
        marketplace: EbayMarketplace,
        request: &SearchRequest,
    ) -> Result<Vec<ListingItem>>;
}

pub fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::Internal(format!("http client: {e}")))
}

/// Turns a non-2xx response into `UpstreamUnavailable`, keeping a short excerpt of the body for logs.
pub(crate) async fn ensure_success(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let excerpt: String = body.chars().take(300).collect();
    Err(AppError::UpstreamUnavailable {
        status: status.as_u16(),
        message: excerpt,
    })
}

pub(crate) fn parse_url(raw: &str) -> Result<reqwest::Url> {
    reqwest::Url::parse(raw).map_err(|e| AppError::Internal(format!("invalid url {raw}: {e}")))
}
