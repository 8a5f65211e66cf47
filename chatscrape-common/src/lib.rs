//! Common types and utilities shared across chatscrape crates.
//!
//! Kept deliberately small so every crate in the workspace can depend on it.
//!
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`time`]: the single ISO-8601 rendering used for every timestamp we emit
//!
//! # Examples
//!
//! ```rust
//! use chatscrape_common::time::iso_millis_from_unix_seconds;
//!
//! let iso = iso_millis_from_unix_seconds(1_700_000_000.5).unwrap();
//! assert_eq!(iso, "2023-11-14T22:13:20.500Z");
//! ```

pub mod observability;
pub mod time;
