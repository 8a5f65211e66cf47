//! One scrape request, end to end: validate, capture, extract.

use std::sync::Arc;
use std::time::Instant;

use chatscrape_common::time::now_iso;
use chatscrape_drivers::browser::driver::NavigationTimeout;
use chatscrape_extract::assemble::EXTRACTION_FAILED;
use chatscrape_extract::{Conversation, ExtractionError, Extractor, HtmlDocument};
use serde::Serialize;
use tracing::{error, info, warn};
use url::Url;

use crate::browser::BrowserCapturer;

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("URL is required")]
    MissingUrl,

    #[error("invalid URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("{0}")]
    Timeout(String),

    #[error("{0:#}")]
    Capture(anyhow::Error),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

/// Extracted conversation plus request provenance.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeResponse {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub source_url: String,
    pub scraped_at: String,
}

/// Accept only absolute `http`/`https` URLs.
pub fn parse_target_url(raw: &str) -> Result<Url, ScrapeError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ScrapeError::MissingUrl);
    }
    let url = Url::parse(raw).map_err(|e| ScrapeError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ScrapeError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme `{other}`"),
        }),
    }
}

pub struct ScrapeService<C> {
    capturer: C,
    extractor: Arc<Extractor<HtmlDocument>>,
}

impl<C: BrowserCapturer> ScrapeService<C> {
    pub fn new(capturer: C) -> Self {
        Self::with_extractor(capturer, Extractor::new())
    }

    pub fn with_extractor(capturer: C, extractor: Extractor<HtmlDocument>) -> Self {
        Self {
            capturer,
            extractor: Arc::new(extractor),
        }
    }

    pub async fn scrape(&self, raw_url: &str) -> Result<ScrapeResponse, ScrapeError> {
        let url = parse_target_url(raw_url)?;
        let started = Instant::now();

        let capture = self.capturer.capture(&url).await.map_err(|err| {
            if err.chain().any(|cause| cause.is::<NavigationTimeout>()) {
                warn!(target: "web.scrape", %url, error = %err, "capture timed out");
                ScrapeError::Timeout(err.to_string())
            } else {
                error!(target: "web.scrape", %url, error = %format!("{err:#}"), "capture failed");
                ScrapeError::Capture(err)
            }
        })?;

        let extractor = Arc::clone(&self.extractor);
        let html = capture.html;
        let conversation = tokio::task::spawn_blocking(move || {
            let document = HtmlDocument::parse(&html);
            extractor.extract(&document)
        })
        .await
        .map_err(|join| {
            error!(target: "web.scrape", %url, error = %join, "extraction task aborted");
            ExtractionError {
                error: EXTRACTION_FAILED.to_string(),
            }
        })??;

        info!(
            target: "web.scrape",
            %url,
            final_url = %capture.url,
            checksum = %capture.html_checksum,
            messages = conversation.messages.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "scrape complete"
        );

        Ok(ScrapeResponse {
            conversation,
            source_url: raw_url.trim().to_string(),
            scraped_at: now_iso(),
        })
    }
}
