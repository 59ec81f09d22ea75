use crate::domain::{
    DashboardSnapshot, HourlyActivity, HourlyBucket, IndexedSession, SessionKind, SessionRecord,
    fold_message_events, resolve_session_name, start_of_day_ms, unix_ms,
};
use crate::infra::{MessageEvents, SessionFile, SessionStore, StoreError};
use std::collections::BTreeMap;
use time::{OffsetDateTime, UtcOffset};

const ACTIVE_WINDOW_MS: i64 = 30 * 60 * 1000;

/// One full aggregation pass over the store: one record per transcript
/// file, ordered by `updated_at` descending, plus grand totals. The
/// reference `now` is captured by the caller and threads through naming,
/// the today boundary and the activity flag. Stateless and idempotent; the
/// only surfaced error is a failed directory enumeration.
pub fn build_dashboard(
    store: &SessionStore,
    now: OffsetDateTime,
) -> Result<DashboardSnapshot, StoreError> {
    let files = store.list_session_files()?;
    let index = store.load_session_index();
    let cron_names = store.load_cron_job_names();

    let now_ms = unix_ms(now);
    let today_start_ms = start_of_day_ms(now);

    let mut sessions = Vec::with_capacity(files.len());
    for file in &files {
        sessions.push(assemble_record(
            file,
            index.get(&file.session_id),
            &cron_names,
            now_ms,
            today_start_ms,
            now.offset(),
        ));
    }

    // Stable sort: equal timestamps keep enumeration (file name) order.
    sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    let total_cost = sessions.iter().map(|record| record.total_cost).sum();
    let today_cost = sessions.iter().map(|record| record.today_cost).sum();
    Ok(DashboardSnapshot {
        total_count: sessions.len(),
        total_cost,
        today_cost,
        sessions,
    })
}

fn assemble_record(
    file: &SessionFile,
    meta: Option<&IndexedSession>,
    cron_names: &BTreeMap<String, String>,
    now_ms: i64,
    today_start_ms: i64,
    offset: UtcOffset,
) -> SessionRecord {
    let mut kind = SessionKind::Main;
    let mut label: Option<&str> = None;
    let mut model = String::new();
    let mut updated_at = file.modified_ms;

    if let Some(meta) = meta {
        kind = meta.kind.clone();
        label = meta.label.as_deref();
        model = meta.model.clone().unwrap_or_default();
        if meta.updated_at_ms > 0 {
            updated_at = meta.updated_at_ms;
        }
    }

    let name = resolve_session_name(
        &kind,
        label,
        cron_names,
        &file.session_id,
        updated_at,
        offset,
    );
    let totals = fold_message_events(MessageEvents::open(&file.path), today_start_ms);

    SessionRecord {
        session_id: file.session_id.clone(),
        name,
        kind,
        model,
        message_count: totals.message_count,
        total_cost: totals.total_cost,
        today_cost: totals.today_cost,
        updated_at,
        is_active: now_ms - updated_at < ACTIVE_WINDOW_MS,
    }
}

/// The 24-hour histogram pass. Re-scans every transcript independently of
/// `build_dashboard`; the two passes share no parsed state.
pub fn build_hourly_activity(
    store: &SessionStore,
    now: OffsetDateTime,
) -> Result<Vec<HourlyBucket>, StoreError> {
    let files = store.list_session_files()?;
    let mut activity = HourlyActivity::new(now);
    for file in &files {
        for event in MessageEvents::open(&file.path) {
            activity.record(&event);
        }
    }
    Ok(activity.into_buckets())
}
