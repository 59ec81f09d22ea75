use crate::domain::{
    IndexedSession, MessageEvent, SessionIndexEntry, SessionKind, TranscriptMessage,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Classify a composite session key. Total: every string maps to exactly
/// one kind. Keys with fewer than 3 `:`-segments are `main`.
pub fn parse_session_kind(key: &str) -> SessionKind {
    let segments = key.split(':').collect::<Vec<_>>();
    if segments.len() < 3 {
        return SessionKind::Main;
    }
    match segments[2] {
        "cron" => SessionKind::Cron {
            job_id: segments
                .get(3)
                .filter(|segment| !segment.is_empty())
                .map(|segment| (*segment).to_string()),
        },
        "subagent" => SessionKind::Subagent,
        _ => SessionKind::Main,
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptLine {
    #[serde(rename = "type")]
    line_type: String,
    message: Option<MessagePayload>,
}

#[derive(Debug, Deserialize)]
struct MessagePayload {
    #[serde(default)]
    timestamp: i64,
    usage: Option<UsagePayload>,
}

#[derive(Debug, Deserialize)]
struct UsagePayload {
    cost: Option<CostPayload>,
}

#[derive(Debug, Deserialize)]
struct CostPayload {
    #[serde(default)]
    total: f64,
}

/// Fallible parse of one transcript line into a message event. Returns
/// `None` for empty lines, invalid JSON, and lines that are not message
/// entries — the discard-on-failure policy is the contract, not an error.
pub fn parse_message_event(line: &str) -> Option<MessageEvent> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed: TranscriptLine = serde_json::from_str(trimmed).ok()?;
    if parsed.line_type != "message" {
        return None;
    }
    let message = parsed.message?;
    let cost = message
        .usage
        .and_then(|usage| usage.cost)
        .map(|cost| cost.total)
        .unwrap_or(0.0);
    Some(MessageEvent {
        timestamp_ms: message.timestamp,
        cost,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionIndexFileEntry {
    session_id: String,
    #[serde(default)]
    updated_at: i64,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    model: Option<String>,
}

/// Parse `sessions.json`: a JSON object mapping composite key strings to
/// session entries.
pub fn parse_sessions_index(text: &str) -> Result<BTreeMap<String, SessionIndexEntry>, ParseError> {
    let raw: BTreeMap<String, SessionIndexFileEntry> = serde_json::from_str(text)?;
    Ok(raw
        .into_iter()
        .map(|(key, entry)| {
            (
                key,
                SessionIndexEntry {
                    session_id: entry.session_id,
                    updated_at_ms: entry.updated_at,
                    label: entry.label,
                    model: entry.model,
                },
            )
        })
        .collect())
}

/// Re-key the index by session id, interpreting each composite key exactly
/// once. Empty labels and models are normalized to absent. When two keys
/// name the same session id, the lexicographically last key wins.
pub fn index_sessions_by_id(
    entries: BTreeMap<String, SessionIndexEntry>,
) -> BTreeMap<String, IndexedSession> {
    let mut by_id: BTreeMap<String, IndexedSession> = BTreeMap::new();
    for (key, entry) in entries {
        by_id.insert(
            entry.session_id,
            IndexedSession {
                kind: parse_session_kind(&key),
                label: entry.label.filter(|label| !label.is_empty()),
                model: entry.model.filter(|model| !model.is_empty()),
                updated_at_ms: entry.updated_at_ms,
            },
        );
    }
    by_id
}

#[derive(Debug, Deserialize)]
struct CronJobsFile {
    #[serde(default)]
    jobs: Vec<CronJobEntry>,
}

#[derive(Debug, Deserialize)]
struct CronJobEntry {
    id: String,
    name: String,
}

/// Parse `jobs.json` into the cron job id → display name table.
pub fn parse_cron_job_names(text: &str) -> Result<BTreeMap<String, String>, ParseError> {
    let parsed: CronJobsFile = serde_json::from_str(text)?;
    Ok(parsed
        .jobs
        .into_iter()
        .map(|job| (job.id, job.name))
        .collect())
}

/// One interpreted transcript line in the detail view.
#[derive(Clone, Debug, PartialEq)]
pub enum TranscriptLineItem {
    Message(TranscriptMessage),
    SessionInfo {
        cwd: Option<String>,
    },
    ModelChange {
        model_id: Option<String>,
        provider: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
struct DetailLine {
    #[serde(rename = "type")]
    line_type: String,
    message: Option<DetailMessagePayload>,
    #[serde(default)]
    cwd: Option<String>,
    #[serde(rename = "modelId", default)]
    model_id: Option<String>,
    #[serde(default)]
    provider: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetailMessagePayload {
    #[serde(default)]
    role: String,
    #[serde(default)]
    content: Option<ContentShape>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    timestamp: i64,
    usage: Option<DetailUsagePayload>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetailUsagePayload {
    #[serde(default)]
    total_tokens: Option<u64>,
    cost: Option<CostPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentShape {
    Text(String),
    Blocks(Vec<ContentBlock>),
    Other(Value),
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type", default)]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Fallible parse of one transcript line for the detail view. Message,
/// `session` and `model_change` lines are interpreted; everything else,
/// including invalid JSON, yields `None`.
pub fn parse_transcript_line(line: &str) -> Option<TranscriptLineItem> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed: DetailLine = serde_json::from_str(trimmed).ok()?;
    match parsed.line_type.as_str() {
        "session" => Some(TranscriptLineItem::SessionInfo {
            cwd: parsed.cwd.filter(|cwd| !cwd.is_empty()),
        }),
        "model_change" => Some(TranscriptLineItem::ModelChange {
            model_id: parsed.model_id.filter(|model| !model.is_empty()),
            provider: parsed.provider.filter(|provider| !provider.is_empty()),
        }),
        "message" => {
            let message = parsed.message?;
            let (total_tokens, cost) = message
                .usage
                .map(|usage| {
                    (
                        usage.total_tokens,
                        usage.cost.map(|cost| cost.total).unwrap_or(0.0),
                    )
                })
                .unwrap_or((None, 0.0));
            let is_error = message.stop_reason.as_deref() == Some("error");
            let (text, tool_calls, has_thinking) = flatten_content(message.content);
            Some(TranscriptLineItem::Message(TranscriptMessage {
                role: message.role,
                timestamp_ms: message.timestamp,
                model: message.model.unwrap_or_default(),
                total_tokens,
                cost,
                is_error,
                error_message: is_error.then_some(message.error_message).flatten(),
                text,
                tool_calls,
                has_thinking,
            }))
        }
        _ => None,
    }
}

fn flatten_content(content: Option<ContentShape>) -> (String, Vec<String>, bool) {
    match content {
        None => (String::new(), Vec::new(), false),
        Some(ContentShape::Text(text)) => (text, Vec::new(), false),
        Some(ContentShape::Blocks(blocks)) => {
            let mut texts: Vec<String> = Vec::new();
            let mut tool_calls: Vec<String> = Vec::new();
            let mut has_thinking = false;
            for block in blocks {
                match block.block_type.as_str() {
                    "text" => {
                        if let Some(text) = block.text {
                            texts.push(text);
                        }
                    }
                    "toolCall" => {
                        if let Some(name) = block.name {
                            tool_calls.push(name);
                        }
                    }
                    "thinking" => has_thinking = true,
                    _ => {}
                }
            }
            (texts.join("\n"), tool_calls, has_thinking)
        }
        Some(ContentShape::Other(value)) => (value.to_string(), Vec::new(), false),
    }
}
