//! Page acquisition and the scrape pipeline.
//!
//! - Browser capture trait and Fantoccini-backed implementation (`browser`)
//! - URL validation, capture, and off-thread extraction (`service`)
//!
//! The HTTP layer depends only on [`service::ScrapeService`]; tests swap the
//! capturer for a canned one.

pub mod browser;
pub mod service;
