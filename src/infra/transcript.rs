use crate::domain::{TranscriptDetail, TranscriptLineItem, parse_transcript_line};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Parse one transcript for display: every message line in order, plus the
/// working-directory, model and provider hints carried by `session` and
/// `model_change` lines. Malformed lines are skipped silently; an
/// unopenable file yields an empty detail.
pub fn load_transcript_detail(path: &Path) -> TranscriptDetail {
    let Ok(file) = File::open(path) else {
        return TranscriptDetail::default();
    };
    let reader = BufReader::new(file);

    let mut detail = TranscriptDetail::default();
    for line_result in reader.lines() {
        let Ok(line) = line_result else {
            break;
        };
        match parse_transcript_line(&line) {
            Some(TranscriptLineItem::Message(message)) => detail.messages.push(message),
            Some(TranscriptLineItem::SessionInfo { cwd }) => {
                if cwd.is_some() {
                    detail.cwd = cwd;
                }
            }
            Some(TranscriptLineItem::ModelChange { model_id, provider }) => {
                if let Some(model_id) = model_id {
                    if detail.model.is_none() {
                        detail.model = Some(model_id);
                    }
                    if provider.is_some() {
                        detail.provider = provider;
                    }
                }
            }
            None => {}
        }
    }

    detail
}
