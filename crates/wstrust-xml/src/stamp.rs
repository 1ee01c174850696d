#![forbid(unsafe_code)]

//! Message timestamps and identifiers.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;
use wstrust_core::Error;

/// Default validity window of a message timestamp, in seconds.
pub const DEFAULT_VALIDITY_SECS: i64 = 300;

/// Prefix of WS-Addressing message ids.
pub const DEFAULT_GUID_PREFIX: &str = "urn:uuid:";

/// UTC with exactly three fractional digits, e.g. `2024-05-01T10:00:00.123Z`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

pub fn format_timestamp(t: DateTime<Utc>) -> String {
    t.format(TIMESTAMP_FORMAT).to_string()
}

/// `(created, expires)` for a `u:Timestamp`, `expires` being `offset_secs`
/// after `now`.  Sub-millisecond precision is truncated.
pub fn timestamp(now: DateTime<Utc>, offset_secs: i64) -> Result<(String, String), Error> {
    let expires = Duration::try_seconds(offset_secs)
        .and_then(|offset| now.checked_add_signed(offset))
        .ok_or_else(|| Error::InvalidParameter(format!("timestamp offset out of range: {offset_secs}")))?;
    Ok((format_timestamp(now), format_timestamp(expires)))
}

/// A random lowercase 8-4-4-4-12 hex identifier wrapped in `prefix`/`suffix`.
///
/// Only used to keep message and token ids unique.
pub fn generate_guid(prefix: &str, suffix: &str) -> String {
    format!("{prefix}{}{suffix}", Uuid::new_v4().hyphenated())
}
