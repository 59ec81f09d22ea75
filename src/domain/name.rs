use crate::domain::SessionKind;
use std::collections::BTreeMap;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

const SHORT_DATE: &[BorrowedFormatItem<'_>] =
    format_description!("[month repr:short] [day padding:none] [hour]:[minute]");

/// Resolve a session's display name: explicit label, then the cron registry
/// for cron sessions, then a synthesized fallback per kind. Total — the
/// result is always non-empty.
pub fn resolve_session_name(
    kind: &SessionKind,
    label: Option<&str>,
    cron_names: &BTreeMap<String, String>,
    session_id: &str,
    updated_at_ms: i64,
    offset: UtcOffset,
) -> String {
    if let Some(label) = label.filter(|label| !label.is_empty()) {
        return label.to_string();
    }

    if let SessionKind::Cron { job_id: Some(job_id) } = kind {
        if let Some(name) = cron_names.get(job_id) {
            return name.clone();
        }
    }

    match kind {
        SessionKind::Main => format_short_date(updated_at_ms, offset),
        SessionKind::Cron { .. } => format!("cron-{}", id_prefix(session_id, 8)),
        SessionKind::Subagent => id_prefix(session_id, 12),
    }
}

fn format_short_date(unix_ms: i64, offset: UtcOffset) -> String {
    let formatted = OffsetDateTime::from_unix_timestamp_nanos(i128::from(unix_ms) * 1_000_000)
        .ok()
        .and_then(|timestamp| timestamp.to_offset(offset).format(SHORT_DATE).ok());
    // Unrepresentable timestamps degrade to the raw value; the name must
    // stay non-empty.
    formatted.unwrap_or_else(|| unix_ms.to_string())
}

fn id_prefix(session_id: &str, count: usize) -> String {
    session_id.chars().take(count).collect()
}
