use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;

use crate::config::Config;
use crate::data_models::{ListingItem, Marketplace, Price, SearchRequest};

pub mod browser;
pub mod extract;

pub use browser::{BrowserError, BrowserLauncher, BrowserSession, WebDriverLauncher};
use extract::{Strategy, extract_listings};

pub const PLACEHOLDER_ID_PREFIX: &str = "placeholder-";
pub const DEFAULT_MAX_RETRIES: usize = 2;
const CATALOG_HOME: &str = "https://www.vinted.fr/catalog";

#[derive(Debug, Clone)]
pub struct ScraperSettings {
    pub nav_timeout: Duration,
    pub max_retries: usize,
    pub retry_backoff: Duration,
}

impl ScraperSettings {
    pub fn from_config(config: &Config) -> ScraperSettings {
        ScraperSettings {
            nav_timeout: config.scraper_nav_timeout,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: config.scraper_retry_backoff,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Launch,
    Navigate,
    ExtractPrimary,
    ExtractAlternate,
}

/// How a single attempt ended.
#[derive(Debug)]
enum Attempt {
    Success(Vec<ListingItem>),
    Retry(BrowserError),
    FallbackPlaceholder(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeOutcome {
    pub items: Vec<ListingItem>,
    /// True when `items` holds the single placeholder instead of live data.
    pub degraded: bool,
    pub attempts: usize,
}

/// Best-effort catalog scraper driving a real browser.
pub struct FallbackScraper {
    launcher: Arc<dyn BrowserLauncher>,
    settings: ScraperSettings,
}

impl FallbackScraper {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, settings: ScraperSettings) -> FallbackScraper {
        FallbackScraper { launcher, settings }
    }

    /// Never fails: after the retry budget is spent the outcome carries one placeholder item.
    pub async fn scrape(&self, request: &SearchRequest) -> ScrapeOutcome {
        let url = match catalog_url(request) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(error = %e, "cannot build catalog url, serving placeholder");
                return ScrapeOutcome {
                    items: vec![placeholder_item(CATALOG_HOME)],
                    degraded: true,
                    attempts: 0,
                };
            }
        };
        let mut attempts = 0usize;

        loop {
            attempts += 1;
            match self.attempt(&url).await {
                Attempt::Success(items) => {
                    tracing::info!(%url, attempts, found = items.len(), "catalog scraped");
                    return ScrapeOutcome {
                        items,
                        degraded: false,
                        attempts,
                    };
                }
                Attempt::Retry(err) if attempts <= self.settings.max_retries => {
                    tracing::warn!(%url, attempts, error = %err, "transient scrape failure, retrying");
                    tokio::time::sleep(self.settings.retry_backoff).await;
                }
                Attempt::Retry(err) => {
                    tracing::error!(%url, attempts, error = %err, "scrape retries exhausted");
                    return degraded(&url, attempts);
                }
                Attempt::FallbackPlaceholder(reason) => {
                    tracing::error!(%url, attempts, reason = %reason, "scrape failed, serving placeholder");
                    return degraded(&url, attempts);
                }
            }
        }
    }

    async fn attempt(&self, url: &Url) -> Attempt {
        let session = match self.launcher.launch().await {
            Ok(session) => session,
            Err(e) => return classify(Step::Launch, e),
        };

        let result = self.run(&*session, url).await;

        // Close on every path; a failing close must not mask the primary outcome.
        if let Err(e) = session.close().await {
            tracing::warn!(error = %e, "failed to close browser session");
        }

        match result {
            Ok(items) if items.is_empty() => Attempt::FallbackPlaceholder(
                "no listings matched any selector strategy".to_string(),
            ),
            Ok(items) => Attempt::Success(items),
            Err((step, e)) => classify(step, e),
        }
    }

    async fn run(
        &self,
        session: &dyn BrowserSession,
        url: &Url,
    ) -> Result<Vec<ListingItem>, (Step, BrowserError)> {
        let timeout = self.settings.nav_timeout;
        match tokio::time::timeout(timeout, session.navigate(url.as_str())).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err((Step::Navigate, e)),
            Err(_) => return Err((Step::Navigate, BrowserError::NavigationTimeout(timeout))),
        }

        let html = session
            .page_source()
            .await
            .map_err(|e| (Step::ExtractPrimary, e))?;

        let items = extract_listings(&html, url, Strategy::Primary);
        if !items.is_empty() {
            return Ok(items);
        }
        tracing::debug!(step = ?Step::ExtractAlternate, "primary selectors found nothing");
        Ok(extract_listings(&html, url, Strategy::Alternate))
    }
}

fn classify(step: Step, err: BrowserError) -> Attempt {
    tracing::debug!(?step, error = %err, "scrape step failed");
    if err.is_transient() {
        Attempt::Retry(err)
    } else {
        Attempt::FallbackPlaceholder(format!("{step:?}: {err}"))
    }
}

fn degraded(url: &Url, attempts: usize) -> ScrapeOutcome {
    ScrapeOutcome {
        items: vec![placeholder_item(url.as_str())],
        degraded: true,
        attempts,
    }
}

pub fn placeholder_item(catalog_url: &str) -> ListingItem {
    let mut item = ListingItem::new(
        format!("{PLACEHOLDER_ID_PREFIX}{}", nanoid::nanoid!(10)),
        "Live Vinted listings are temporarily unavailable".to_string(),
        Price::new(0.0, "EUR"),
        Marketplace::Vinted,
    );
    item.item_url = catalog_url.to_string();
    item
}

fn vinted_domain(country: Option<&str>) -> &'static str {
    match country.map(|c| c.trim().to_ascii_lowercase()).as_deref() {
        Some("de") => "www.vinted.de",
        Some("it") => "www.vinted.it",
        Some("es") => "www.vinted.es",
        Some("be") => "www.vinted.be",
        Some("nl") => "www.vinted.nl",
        Some("pl") => "www.vinted.pl",
        Some("uk") | Some("gb") => "www.vinted.co.uk",
        Some("us") => "www.vinted.com",
        _ => "www.vinted.fr",
    }
}

/// Public catalog search page for the request's query (or brands) and price bounds.
pub fn catalog_url(request: &SearchRequest) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(&format!(
        "https://{}/catalog",
        vinted_domain(request.country.as_deref())
    ))?;
    {
        let mut pairs = url.query_pairs_mut();
        let text = request.search_terms().join(" ");
        if !text.is_empty() {
            pairs.append_pair("search_text", &text);
        }
        if let Some(min) = request.min_price {
            pairs.append_pair("price_from", &min.to_string());
        }
        if let Some(max) = request.max_price {
            pairs.append_pair("price_to", &max.to_string());
        }
        pairs.append_pair("order", "newest_first");
    }
    Ok(url)
}
