//! Driver layer for browser automation.
//!
//! This crate exposes the WebDriver session and page helpers the scrape
//! pipeline uses to load a chat page and read back its rendered HTML.
//!
//! - [`browser::driver::ScrapeDriver`]: WebDriver client wrapper
//! - [`browser::page::ScrapePage`]: rendered-page accessors
//! - [`browser::launch`]: Chrome launch arguments and session capabilities
pub mod browser;
