use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv().ok(); // Load .env file if present
    Config::from_env()
});

pub const DEFAULT_EBAY_API_BASE: &str = "https://api.ebay.com";
pub const DEFAULT_VINTED_API_URL: &str = "https://vinted-api.p.rapidapi.com/search";
pub const DEFAULT_VINTED_KEY_HEADER: &str = "X-API-Key";
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";

#[derive(Debug, Clone)]
pub struct Config {
    /// Marketplace credentials. Either one missing disables the eBay routes.
    pub ebay_client_id: Option<String>,
    pub ebay_client_secret: Option<String>,
    pub ebay_api_base: String,

    pub vinted_api_url: String,
    pub vinted_api_key: Option<String>,
    pub vinted_api_key_header: String,

    pub webdriver_url: String,
    pub http_timeout: Duration,
    pub scraper_nav_timeout: Duration,
    pub scraper_retry_backoff: Duration,
}

impl Config {
    pub fn from_env() -> Config {
        Config {
            ebay_client_id: get_env_opt("EBAY_CLIENT_ID"),
            ebay_client_secret: get_env_opt("EBAY_CLIENT_SECRET"),
            ebay_api_base: get_env_or_default("EBAY_API_BASE", DEFAULT_EBAY_API_BASE),
            vinted_api_url: get_env_or_default("VINTED_API_URL", DEFAULT_VINTED_API_URL),
            vinted_api_key: get_env_opt("VINTED_API_KEY"),
            vinted_api_key_header: get_env_or_default(
                "VINTED_API_KEY_HEADER",
                DEFAULT_VINTED_KEY_HEADER,
            ),
            webdriver_url: get_env_or_default("WEBDRIVER_URL", DEFAULT_WEBDRIVER_URL),
            http_timeout: Duration::from_secs(get_env_parsed("HTTP_TIMEOUT_SECS", 15)),
            scraper_nav_timeout: Duration::from_secs(get_env_parsed(
                "SCRAPER_NAV_TIMEOUT_SECS",
                12,
            )),
            scraper_retry_backoff: Duration::from_millis(get_env_parsed(
                "SCRAPER_RETRY_BACKOFF_MS",
                2000,
            )),
        }
    }

    /// Returns the eBay client id/secret pair, or the name of the first missing variable.
    pub fn ebay_credentials(&self) -> Result<(&str, &str), &'static str> {
        let id = self.ebay_client_id.as_deref().ok_or("EBAY_CLIENT_ID")?;
        let secret = self
            .ebay_client_secret
            .as_deref()
            .ok_or("EBAY_CLIENT_SECRET")?;
        Ok((id, secret))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            ebay_client_id: None,
            ebay_client_secret: None,
            ebay_api_base: DEFAULT_EBAY_API_BASE.to_string(),
            vinted_api_url: DEFAULT_VINTED_API_URL.to_string(),
            vinted_api_key: None,
            vinted_api_key_header: DEFAULT_VINTED_KEY_HEADER.to_string(),
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            http_timeout: Duration::from_secs(15),
            scraper_nav_timeout: Duration::from_secs(12),
            scraper_retry_backoff: Duration::from_millis(2000),
        }
    }
}

fn get_env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn get_env_parsed(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
