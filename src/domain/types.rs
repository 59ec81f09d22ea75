use serde::{Serialize, Serializer};

/// Session classification derived from the composite key in the session
/// index. Parsed once at the index-load boundary; call sites never re-split
/// the key string.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SessionKind {
    Main,
    Subagent,
    Cron { job_id: Option<String> },
}

impl SessionKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Subagent => "subagent",
            Self::Cron { .. } => "cron",
        }
    }
}

impl Serialize for SessionKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// One `message` line of a transcript. Exists only while a scan is running.
/// `timestamp_ms == 0` means the line carried no timestamp.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MessageEvent {
    pub timestamp_ms: i64,
    pub cost: f64,
}

/// One raw row of `sessions.json`, before the composite key is interpreted.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionIndexEntry {
    pub session_id: String,
    pub updated_at_ms: i64,
    pub label: Option<String>,
    pub model: Option<String>,
}

/// Index metadata for one session, keyed by session id, with the composite
/// key already reduced to a kind.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexedSession {
    pub kind: SessionKind,
    pub label: Option<String>,
    pub model: Option<String>,
    pub updated_at_ms: i64,
}

/// Aggregated view of one transcript file for one pass.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub session_id: String,
    pub name: String,
    pub kind: SessionKind,
    pub model: String,
    pub message_count: usize,
    pub total_cost: f64,
    pub today_cost: f64,
    pub updated_at: i64,
    pub is_active: bool,
}

/// The engine's session-view output: records ordered by `updated_at`
/// descending, plus grand totals.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub sessions: Vec<SessionRecord>,
    pub total_count: usize,
    pub total_cost: f64,
    pub today_cost: f64,
}

/// One slot of the trailing 24-hour activity histogram. `hour` is the
/// wall-clock time at the slot's upper edge.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HourlyBucket {
    pub hour: String,
    pub messages: usize,
    pub cost: f64,
}

/// One message of a transcript, parsed for display.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptMessage {
    pub role: String,
    pub timestamp_ms: i64,
    pub model: String,
    pub total_tokens: Option<u64>,
    pub cost: f64,
    pub is_error: bool,
    pub error_message: Option<String>,
    pub text: String,
    pub tool_calls: Vec<String>,
    pub has_thinking: bool,
}

/// Full display view of one session's transcript.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptDetail {
    pub messages: Vec<TranscriptMessage>,
    pub cwd: Option<String>,
    pub model: Option<String>,
    pub provider: Option<String>,
}
