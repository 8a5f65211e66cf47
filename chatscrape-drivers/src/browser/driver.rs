use std::time::Duration;

use anyhow::{Context, Result};
use chatscrape_config::BrowserSettings;
use fantoccini::error::{CmdError, ErrorStatus};
use fantoccini::wd::TimeoutConfiguration;
use fantoccini::{Client, ClientBuilder};
use tracing::{debug, info};

use crate::browser::launch::build_capabilities;
use crate::browser::page::ScrapePage;

/// Navigation did not reach DOMContentLoaded within the page-load timeout.
#[derive(Debug, thiserror::Error)]
#[error("navigation to {url} timed out after {timeout:?}")]
pub struct NavigationTimeout {
    pub url: String,
    pub timeout: Duration,
}

/// Thin wrapper around a `fantoccini` WebDriver session configured for
/// scraping: one session per capture, closed by the caller when done.
pub struct ScrapeDriver {
    client: Client,
    page_load_timeout: Duration,
}

impl ScrapeDriver {
    /// Open a new session on the WebDriver endpoint in `settings`
    /// (Chromedriver at `http://localhost:9515` by default).
    pub async fn new(settings: &BrowserSettings) -> Result<Self> {
        let caps = build_capabilities(settings);
        debug!(
            target: "browser.driver",
            webdriver = %settings.webdriver_url,
            headless = settings.headless,
            "opening webdriver session"
        );

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&settings.webdriver_url)
            .await
            .with_context(|| {
                format!(
                    "failed to open webdriver session at {}",
                    settings.webdriver_url
                )
            })?;

        Ok(Self {
            client,
            page_load_timeout: Duration::from_secs(settings.navigation_timeout_secs),
        })
    }

    /// Navigate to `url` under the page-load timeout and return the page.
    pub async fn goto(&self, url: &str) -> Result<ScrapePage> {
        self.client
            .update_timeouts(TimeoutConfiguration::new(
                None,
                Some(self.page_load_timeout),
                None,
            ))
            .await
            .context("failed to apply page-load timeout")?;

        info!(target: "browser.driver", %url, "navigating");
        match self.client.goto(url).await {
            Ok(()) => Ok(ScrapePage::new(self.client.clone())),
            Err(err) if is_timeout(&err) => Err(NavigationTimeout {
                url: url.to_string(),
                timeout: self.page_load_timeout,
            }
            .into()),
            Err(err) => Err(anyhow::Error::from(err).context(format!("navigation to {url} failed"))),
        }
    }

    /// Close the underlying browser session.
    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }
}

fn is_timeout(err: &CmdError) -> bool {
    matches!(err, CmdError::Standard(wd) if matches!(wd.error, ErrorStatus::Timeout))
}
