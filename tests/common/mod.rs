#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use listing_hub::config::Config;
use listing_hub::fallback::{BrowserError, BrowserLauncher, BrowserSession, ScraperSettings};

/// What the next launched session does.
#[derive(Debug, Clone)]
pub enum Script {
    Page(String),
    SessionClosed,
    Hang,
    CommandFails,
    LaunchFails,
}

/// Hands out scripted sessions in order; the last script repeats once the list runs out.
pub struct FakeLauncher {
    script: Mutex<Vec<Script>>,
    close_fails: bool,
    pub launches: AtomicUsize,
    pub closes: Arc<AtomicUsize>,
}

impl FakeLauncher {
    pub fn new(script: Vec<Script>) -> Arc<FakeLauncher> {
        Arc::new(FakeLauncher {
            script: Mutex::new(script),
            close_fails: false,
            launches: AtomicUsize::new(0),
            closes: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn with_failing_close(script: Vec<Script>) -> Arc<FakeLauncher> {
        Arc::new(FakeLauncher {
            script: Mutex::new(script),
            close_fails: true,
            launches: AtomicUsize::new(0),
            closes: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    fn next(&self) -> Script {
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.remove(0)
        } else {
            script.first().cloned().unwrap_or(Script::LaunchFails)
        }
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        let step = self.next();
        if let Script::LaunchFails = step {
            return Err(BrowserError::Launch("webdriver unreachable".into()));
        }
        Ok(Box::new(FakeSession {
            step,
            close_fails: self.close_fails,
            closes: self.closes.clone(),
        }))
    }
}

struct FakeSession {
    step: Script,
    close_fails: bool,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&self, _url: &str) -> Result<(), BrowserError> {
        match &self.step {
            Script::SessionClosed => Err(BrowserError::SessionClosed("target closed".into())),
            Script::CommandFails => Err(BrowserError::Command("javascript error".into())),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    async fn page_source(&self) -> Result<String, BrowserError> {
        match &self.step {
            Script::Page(html) => Ok(html.clone()),
            _ => Ok(String::new()),
        }
    }

    async fn close(self: Box<Self>) -> Result<(), BrowserError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.close_fails {
            return Err(BrowserError::SessionClosed("already gone".into()));
        }
        Ok(())
    }
}

pub fn fast_settings() -> ScraperSettings {
    ScraperSettings {
        nav_timeout: Duration::from_millis(50),
        max_retries: 2,
        retry_backoff: Duration::from_millis(1),
    }
}

/// Config pointing every upstream at `base_url` (an httpmock server).
pub fn test_config(base_url: &str) -> Config {
    Config {
        ebay_client_id: Some("client-id".into()),
        ebay_client_secret: Some("client-secret".into()),
        ebay_api_base: base_url.to_string(),
        vinted_api_url: format!("{base_url}/vinted/search"),
        vinted_api_key: Some("vinted-key".into()),
        http_timeout: Duration::from_secs(5),
        scraper_nav_timeout: Duration::from_millis(50),
        scraper_retry_backoff: Duration::from_millis(1),
        ..Default::default()
    }
}

pub const CATALOG_PAGE: &str = r#"
<html><body>
  <div data-testid="grid-item">
    <a href="/items/10-sac"><img src="https://img/10.jpg" alt="Sac Dior"></a>
    <p data-testid="item-10--price-text">120,00 €</p>
  </div>
  <div data-testid="grid-item">
    <a href="/items/11-pochette"><img src="https://img/11.jpg" alt="Pochette Dior"></a>
    <p data-testid="item-11--price-text">45,00 €</p>
  </div>
  <div data-testid="grid-item">
    <a href="/items/10-sac"><img src="https://img/10.jpg" alt="Sac Dior (dup)"></a>
    <p data-testid="item-10--price-text">120,00 €</p>
  </div>
</body></html>
"#;
