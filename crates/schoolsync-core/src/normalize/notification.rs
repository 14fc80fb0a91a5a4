//! Convert raw notification records into display form.
//!
//! Formatting runs through [`crate::chunked::map_chunked`] so large lists do
//! not monopolize the runtime. If that pass fails, a synchronous best-effort
//! pass formats the whole set instead of isolating the bad record.

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use super::fields::{as_flag, as_text, first_present, first_text};
use super::timestamp;
use crate::chunked::map_chunked;
use crate::models::notification::sort_recent_first;
use crate::models::{NotificationVariant, NotificationView, RawRecord, JUST_NOW_LABEL};
use crate::utils::format_datetime;

const ID_KEYS: &[&str] = &["id", "_id", "notificationId", "notification_id", "uuid"];

const TITLE_KEYS: &[&str] = &["title", "subject", "heading"];

const MESSAGE_KEYS: &[&str] = &["message", "body", "text", "content", "description"];

const READ_KEYS: &[&str] = &["read", "isRead", "is_read", "seen"];

const STATUS_KEYS: &[&str] = &["status", "state", "success", "result"];

const ACTION_KEYS: &[&str] = &["action", "type", "event", "kind"];

const TIME_KEYS: &[&str] = &[
    "createdAt",
    "created_at",
    "timestamp",
    "time",
    "date",
    "sentAt",
    "updatedAt",
];

const FAILURE_TERMS: &[&str] = &["fail", "error", "unsuccessful", "not sent", "not delivered"];

const DELETE_TERMS: &[&str] = &["delete", "removed", "remove"];

const CREATE_TERMS: &[&str] = &["create", "created", "added", "new", "joined", "registered"];

const DEFAULT_TITLE: &str = "Notification";

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("notification record is not an object: {0}")]
    NotAnObject(String),
}

/// Format, tag and sort a notification list through the chunked transformer.
pub async fn format(raw: &[RawRecord], chunk_size: usize) -> Vec<NotificationView> {
    match map_chunked(raw, format_record, chunk_size).await {
        Ok(mut views) => {
            sort_recent_first(&mut views);
            views
        }
        Err(e) => {
            warn!(error = %e, count = raw.len(), "Chunked notification formatting failed, using best-effort pass");
            format_best_effort(raw)
        }
    }
}

/// One-pass synchronous formatting that accepts any record shape.
pub fn format_best_effort(raw: &[RawRecord]) -> Vec<NotificationView> {
    let mut views: Vec<NotificationView> = raw
        .iter()
        .map(|record| format_record(record).unwrap_or_else(|_| minimal_view(record)))
        .collect();
    sort_recent_first(&mut views);
    views
}

/// Format a single notification record.
pub fn format_record(record: &Value) -> Result<NotificationView, FormatError> {
    if !record.is_object() {
        return Err(FormatError::NotAnObject(kind_of(record).to_string()));
    }

    let resolved = timestamp::resolve_from_keys(record, TIME_KEYS);
    let display_time = resolved
        .as_ref()
        .map(format_datetime)
        .unwrap_or_else(|| JUST_NOW_LABEL.to_string());

    Ok(NotificationView {
        id: first_text(record, ID_KEYS).unwrap_or_else(fallback_id),
        title: first_text(record, TITLE_KEYS).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        message: first_text(record, MESSAGE_KEYS).unwrap_or_default(),
        display_time,
        read: first_present(record, READ_KEYS)
            .and_then(as_flag)
            .unwrap_or(false),
        variant: classify_variant(record),
        timestamp_ms: resolved.map(|dt| dt.timestamp_millis()),
        source_record: record.clone(),
    })
}

/// Decide the display variant. Rules are evaluated in order; first match wins.
pub fn classify_variant(record: &Value) -> NotificationVariant {
    let status = first_present(record, STATUS_KEYS);
    let status_text = status
        .and_then(Value::as_str)
        .map(normalize_text)
        .unwrap_or_default();
    let action_text = first_text(record, ACTION_KEYS)
        .map(|s| normalize_text(&s))
        .unwrap_or_default();
    let free_text = [
        first_text(record, TITLE_KEYS),
        first_text(record, MESSAGE_KEYS),
        Some(action_text.clone()),
    ]
    .into_iter()
    .flatten()
    .map(|s| normalize_text(&s))
    .collect::<Vec<_>>()
    .join(" ");

    if matches_any(&status_text, FAILURE_TERMS) || matches_any(&free_text, FAILURE_TERMS) {
        return NotificationVariant::Failed;
    }
    if matches_any(&action_text, DELETE_TERMS) || matches_any(&free_text, DELETE_TERMS) {
        return NotificationVariant::Delete;
    }
    if matches_any(&action_text, CREATE_TERMS) || matches_any(&free_text, CREATE_TERMS) {
        return NotificationVariant::Create;
    }
    match status.and_then(status_literal) {
        Some(false) => NotificationVariant::Failed,
        Some(true) if matches_any(&free_text, CREATE_TERMS) => NotificationVariant::Create,
        _ => NotificationVariant::Default,
    }
}

/// Boolean-ish status literals: `false`/`0` and `true`/`1`/`ok`/`success`.
fn status_literal(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f == 0.0 => Some(false),
            Some(f) if f == 1.0 => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "false" | "0" => Some(false),
            "true" | "1" | "ok" | "success" => Some(true),
            _ => None,
        },
        _ => None,
    }
}

fn normalize_text(text: &str) -> String {
    text.to_lowercase().replace(['_', '-'], " ")
}

fn matches_any(text: &str, terms: &[&str]) -> bool {
    !text.is_empty() && terms.iter().any(|term| text.contains(term))
}

/// Random id for records that carry none. Such notifications will not match
/// a later fetch of the same event that does carry a real id.
fn fallback_id() -> String {
    format!("local-{:016x}", rand::random::<u64>())
}

fn minimal_view(record: &Value) -> NotificationView {
    NotificationView {
        id: fallback_id(),
        title: DEFAULT_TITLE.to_string(),
        message: as_text(record).unwrap_or_default(),
        display_time: JUST_NOW_LABEL.to_string(),
        read: false,
        variant: NotificationVariant::Default,
        timestamp_ms: None,
        source_record: record.clone(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
