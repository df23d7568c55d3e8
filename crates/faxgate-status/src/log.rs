// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-job delivery log.
//!
//! Two formats coexist in the stored `log` column because the system
//! switched gateway providers mid-life: the legacy provider accumulated
//! free-text blocks, the current provider keeps one structured JSON record
//! of the latest event. The stored string is tagged lazily at read time
//! rather than re-parsed ambiguously throughout the codebase.

use std::sync::LazyLock;

use chrono::{DateTime, SecondsFormat, Utc};
use faxgate_core::{CanonicalStatus, FaxgateError, ProviderEvent, ProviderKind};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Callback fields never written to the log: credentials and large binary
/// payload URLs.
const EXCLUDED_LOG_FIELDS: &[&str] = &["AccountSid", "MediaUrl", "OriginalMediaUrl"];

/// The latest structured event retained in a structured log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub status: CanonicalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fax_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_duration_secs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl EventRecord {
    /// Build a record from a parsed webhook and its canonical status.
    pub fn from_event(event: &ProviderEvent, status: CanonicalStatus) -> Self {
        Self {
            status,
            fax_id: event.fax_id.clone(),
            from: event.metadata.from.clone(),
            to: event.metadata.to.clone(),
            page_count: event.metadata.page_count,
            call_duration_secs: event.metadata.call_duration_secs,
            failure_reason: event.metadata.failure_reason.clone(),
            occurred_at: event.occurred_at,
        }
    }
}

/// Stored form of a structured log: the latest event record, plus any
/// free-text blocks carried over from the legacy provider era.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredLog {
    pub event: EventRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<String>,
}

/// Tagged view of the raw stored log string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryLog {
    Empty,
    /// Legacy free-text accumulation, opaque.
    Text(String),
    /// Structured JSON record of the latest event.
    Structured(StructuredLog),
}

impl DeliveryLog {
    /// Tag a raw stored string. Anything that does not parse as a
    /// structured record is treated as opaque legacy text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return DeliveryLog::Empty;
        }
        match serde_json::from_str::<StructuredLog>(trimmed) {
            Ok(structured) => DeliveryLog::Structured(structured),
            Err(_) => DeliveryLog::Text(trimmed.to_string()),
        }
    }
}

/// Fold a new provider event into the existing stored log.
///
/// Structured logs keep replace-latest semantics: only the most recent
/// event record is retained verbatim. Free-text content is never lost --
/// it survives in the `history` field (blank-line separated) when a log
/// upgrades to structured, and legacy events keep appending text blocks.
pub fn merge(
    existing: &str,
    event: &ProviderEvent,
    status: CanonicalStatus,
) -> Result<String, FaxgateError> {
    let record = EventRecord::from_event(event, status);

    let merged = match DeliveryLog::parse(existing) {
        DeliveryLog::Structured(mut structured) => {
            if event.provider == ProviderKind::Legacy {
                let block = render_text_block(event);
                structured.history = Some(match structured.history.take() {
                    Some(history) => format!("{history}\n\n{block}"),
                    None => block,
                });
            }
            structured.event = record;
            serialize_structured(&structured)?
        }
        DeliveryLog::Text(text) => match event.provider {
            ProviderKind::Current => serialize_structured(&StructuredLog {
                event: record,
                history: Some(text),
            })?,
            ProviderKind::Legacy => {
                format!("{text}\n\n{}", render_text_block(event)).trim().to_string()
            }
        },
        DeliveryLog::Empty => match event.provider {
            ProviderKind::Current => serialize_structured(&StructuredLog {
                event: record,
                history: None,
            })?,
            ProviderKind::Legacy => render_text_block(event),
        },
    };

    Ok(merged)
}

fn serialize_structured(log: &StructuredLog) -> Result<String, FaxgateError> {
    serde_json::to_string(log)
        .map_err(|e| FaxgateError::Internal(format!("failed to serialize delivery log: {e}")))
}

/// Render one legacy callback as a text block: an ISO-8601 timestamp line
/// followed by one `Key: value` line per callback field, minus fields that
/// leak credentials or media URLs.
fn render_text_block(event: &ProviderEvent) -> String {
    let mut lines = Vec::with_capacity(event.raw_fields.len() + 1);
    lines.push(
        event
            .occurred_at
            .to_rfc3339_opts(SecondsFormat::Secs, true),
    );
    for (key, value) in &event.raw_fields {
        if EXCLUDED_LOG_FIELDS.contains(&key.as_str()) {
            continue;
        }
        lines.push(format!("{key}: {value}"));
    }
    lines.join("\n").trim().to_string()
}

/// Best-effort parsed view of a legacy text log, for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLegacyLog {
    pub fax_id: Option<String>,
    pub remote_station_id: Option<String>,
    pub bit_rate: Option<u32>,
    pub page_count: Option<u32>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

static RE_FAX_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"FaxSid:\s*(\S+)").expect("static regex"));
static RE_STATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"RemoteStationId:\s*(.+)").expect("static regex"));
static RE_BIT_RATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"BitRate:\s*(\d+)").expect("static regex"));
static RE_PAGES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"NumPages:\s*(\d+)").expect("static regex"));
static RE_FROM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"From:\s*(\S+)").expect("static regex"));
static RE_TO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"To:\s*(\S+)").expect("static regex"));
static RE_TIMESTAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Timestamp:\s*(\S+)").expect("static regex"));

/// Regex-extract known fields from a legacy free-text log.
///
/// The log accumulates blocks oldest-first, so the last occurrence of each
/// field reflects the latest event. Returns `None` when no recognizable
/// marker is present at all.
pub fn parse_legacy_text(text: &str) -> Option<ParsedLegacyLog> {
    let last_capture = |re: &Regex| -> Option<String> {
        re.captures_iter(text)
            .last()
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
    };

    let fax_id = last_capture(&RE_FAX_ID);
    let remote_station_id = last_capture(&RE_STATION);
    let bit_rate = last_capture(&RE_BIT_RATE).and_then(|v| v.parse().ok());
    let page_count = last_capture(&RE_PAGES).and_then(|v| v.parse().ok());

    if fax_id.is_none() && remote_station_id.is_none() && bit_rate.is_none() && page_count.is_none()
    {
        return None;
    }

    Some(ParsedLegacyLog {
        fax_id,
        remote_station_id,
        bit_rate,
        page_count,
        from: last_capture(&RE_FROM),
        to: last_capture(&RE_TO),
        timestamp: last_capture(&RE_TIMESTAMP)
            .and_then(|v| DateTime::parse_from_rfc3339(&v).ok())
            .map(|dt| dt.with_timezone(&Utc)),
    })
}
