// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules. One module per table family.

pub mod delivery;
pub mod jobs;
pub mod retries;

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use faxgate_core::CanonicalStatus;

/// Timestamps are stored as RFC 3339 TEXT with millisecond precision so
/// lexicographic and chronological order agree.
pub(crate) fn to_ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Truncate to stored precision. Comparisons against persisted timestamps
/// must happen at the same precision, or an exact replay of an event
/// would sneak past the staleness guard on its sub-millisecond remainder.
pub(crate) fn truncate_millis(dt: DateTime<Utc>) -> DateTime<Utc> {
    let sub_ms_nanos = i64::from(dt.timestamp_subsec_nanos() % 1_000_000);
    dt - chrono::Duration::nanoseconds(sub_ms_nanos)
}

pub(crate) fn parse_ts(idx: usize, raw: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

pub(crate) fn parse_status(idx: usize, raw: &str) -> Result<CanonicalStatus, rusqlite::Error> {
    CanonicalStatus::from_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
