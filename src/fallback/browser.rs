use std::time::Duration;

use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use thiserror::Error;

/// Fixed desktop user agent presented to the catalog pages.
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("browser session closed: {0}")]
    SessionClosed(String),

    #[error("navigation timed out after {0:?}")]
    NavigationTimeout(Duration),

    #[error("failed to launch browser session: {0}")]
    Launch(String),

    #[error("browser command failed: {0}")]
    Command(String),
}

impl BrowserError {
    /// Transient failures are worth another attempt with a fresh session.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BrowserError::SessionClosed(_) | BrowserError::NavigationTimeout(_)
        )
    }
}

/// A single rendering session. Dropping it does not release the remote browser; call `close`.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), BrowserError>;
    async fn page_source(&self) -> Result<String, BrowserError>;
    async fn close(self: Box<Self>) -> Result<(), BrowserError>;
}

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, BrowserError>;
}

/// Launches headless Chrome sessions through a WebDriver server.
#[derive(Debug, Clone)]
pub struct WebDriverLauncher {
    webdriver_url: String,
    user_agent: String,
}

impl WebDriverLauncher {
    pub fn new(webdriver_url: impl Into<String>) -> WebDriverLauncher {
        WebDriverLauncher {
            webdriver_url: webdriver_url.into(),
            user_agent: DESKTOP_USER_AGENT.to_string(),
        }
    }

    fn capabilities(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut caps = serde_json::Map::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({
                "args": [
                    "--headless=new",
                    "--no-sandbox",
                    "--disable-dev-shm-usage",
                    "--disable-gpu",
                    "--window-size=1366,768",
                    format!("--user-agent={}", self.user_agent),
                ]
            }),
        );
        caps
    }
}

#[async_trait]
impl BrowserLauncher for WebDriverLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        let mut builder = ClientBuilder::native();
        builder.capabilities(self.capabilities());
        let client = builder
            .connect(&self.webdriver_url)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;
        tracing::debug!(webdriver = %self.webdriver_url, "browser session started");
        Ok(Box::new(WebDriverSession { client }))
    }
}

struct WebDriverSession {
    client: Client,
}

fn classify(err: fantoccini::error::CmdError) -> BrowserError {
    let msg = err.to_string();
    let lower = msg.to_lowercase();
    if lower.contains("session") || lower.contains("closed") || lower.contains("disconnected") {
        BrowserError::SessionClosed(msg)
    } else if lower.contains("timeout") || lower.contains("timed out") {
        BrowserError::NavigationTimeout(Duration::ZERO)
    } else {
        BrowserError::Command(msg)
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        self.client.goto(url).await.map_err(classify)
    }

    async fn page_source(&self) -> Result<String, BrowserError> {
        self.client.source().await.map_err(classify)
    }

    async fn close(self: Box<Self>) -> Result<(), BrowserError> {
        self.client.close().await.map_err(classify)
    }
}
