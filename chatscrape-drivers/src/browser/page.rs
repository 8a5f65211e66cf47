use std::time::Duration;

use anyhow::Result;
use fantoccini::Client;
use tracing::debug;

/// A navigated page inside a live [`ScrapeDriver`](super::driver::ScrapeDriver)
/// session.
pub struct ScrapePage {
    pub(crate) client: Client,
}

impl ScrapePage {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// Give client-side rendering a fixed amount of time to finish.
    pub async fn settle(&self, wait: Duration) {
        if wait.is_zero() {
            return;
        }
        debug!(target: "browser.page", wait_ms = wait.as_millis() as u64, "settling page");
        tokio::time::sleep(wait).await;
    }

    /// Return the full page HTML source as currently rendered.
    pub async fn content(&self) -> Result<String> {
        self.client.source().await.map_err(anyhow::Error::from)
    }

    /// Return the current page URL (after any redirects).
    pub async fn url(&self) -> Result<url::Url> {
        self.client.current_url().await.map_err(anyhow::Error::from)
    }
}
