//! Timestamp rendering shared by the extractor and the HTTP envelope.
//!
//! Every timestamp leaves the system as RFC 3339 in UTC with millisecond
//! precision and a `Z` suffix, e.g. `2024-05-01T12:00:00.000Z`.

use chrono::{DateTime, SecondsFormat, Utc};

/// Render a UTC instant as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn iso_millis(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Render the current instant.
pub fn now_iso() -> String {
    iso_millis(Utc::now())
}

/// Convert unix milliseconds. `None` when outside chrono's representable range.
pub fn iso_millis_from_unix_millis(ms: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(ms).map(iso_millis)
}

/// Convert fractional unix seconds, keeping millisecond precision.
///
/// Returns `None` for NaN, infinities and out-of-range values.
pub fn iso_millis_from_unix_seconds(secs: f64) -> Option<String> {
    if !secs.is_finite() {
        return None;
    }
    let ms = (secs * 1000.0).round();
    if ms < i64::MIN as f64 || ms > i64::MAX as f64 {
        return None;
    }
    iso_millis_from_unix_millis(ms as i64)
}
