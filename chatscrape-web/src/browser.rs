use std::time::Duration;

use anyhow::Result;
use chatscrape_config::BrowserSettings;
use chatscrape_drivers::browser::driver::{NavigationTimeout, ScrapeDriver};
use chatscrape_drivers::browser::page::ScrapePage;
use tracing::{debug, warn};
use url::Url;

/// Rendered HTML of one page, as the browser saw it.
#[derive(Debug, Clone)]
pub struct PageCapture {
    /// Final URL after redirects.
    pub url: Url,
    pub html: String,
    pub html_checksum: String,
}

impl PageCapture {
    pub fn new(url: Url, html: String) -> Self {
        let html_checksum = blake3::hash(html.as_bytes()).to_hex().to_string();
        Self {
            url,
            html,
            html_checksum,
        }
    }
}

#[async_trait::async_trait]
pub trait BrowserCapturer: Send + Sync {
    async fn capture(&self, url: &Url) -> Result<PageCapture>;
}

/// Concrete capturer backed by the fantoccini-based driver. Opens a fresh
/// WebDriver session per capture.
pub struct FantocciniCapturer {
    settings: BrowserSettings,
}

impl FantocciniCapturer {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    /// Upper bound for navigation plus the settle period.
    fn budget(&self) -> Duration {
        Duration::from_secs(self.settings.navigation_timeout_secs) + self.settle()
    }

    fn settle(&self) -> Duration {
        Duration::from_millis(self.settings.settle_millis)
    }

    async fn load(&self, driver: &ScrapeDriver, url: &Url) -> Result<PageCapture> {
        let page: ScrapePage = driver.goto(url.as_str()).await?;
        page.settle(self.settle()).await;

        let html = page.content().await?;
        let final_url = page.url().await.unwrap_or_else(|_| url.clone());

        debug!(target: "web.capture", url = %final_url, bytes = html.len(), "page captured");
        Ok(PageCapture::new(final_url, html))
    }
}

#[async_trait::async_trait]
impl BrowserCapturer for FantocciniCapturer {
    async fn capture(&self, url: &Url) -> Result<PageCapture> {
        let driver = ScrapeDriver::new(&self.settings).await?;
        let budget = self.budget();

        let result = match tokio::time::timeout(budget, self.load(&driver, url)).await {
            Ok(result) => result,
            Err(_) => Err(NavigationTimeout {
                url: url.to_string(),
                timeout: budget,
            }
            .into()),
        };

        // Always attempt to close the driver before returning
        if let Err(err) = driver.close().await {
            warn!(target: "web.capture", error = %err, "failed to close webdriver session");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_is_blake3_hex_of_html() {
        let url = Url::parse("https://chatgpt.com/share/abc").unwrap();
        let capture = PageCapture::new(url, "<html></html>".into());
        assert_eq!(capture.html_checksum.len(), 64);
        assert_eq!(
            capture.html_checksum,
            blake3::hash(b"<html></html>").to_hex().to_string()
        );
    }

    #[test]
    fn budget_covers_navigation_and_settle() {
        let capturer = FantocciniCapturer::new(BrowserSettings {
            navigation_timeout_secs: 5,
            settle_millis: 250,
            ..BrowserSettings::default()
        });
        assert_eq!(capturer.budget(), Duration::from_millis(5_250));
    }
}
