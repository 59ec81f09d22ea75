use crate::domain::{MessageEvent, parse_message_event};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

/// Lazy stream of message events from one transcript file.
///
/// Lines that are empty, malformed JSON, or not message entries are skipped
/// silently — one corrupt record must not invalidate a session's
/// statistics. A file that cannot be opened yields an empty stream, the
/// same as a session with no messages yet. A read error mid-file ends the
/// stream. No partial-line state is kept, so a scan can be abandoned
/// between lines and restarted by re-opening.
pub struct MessageEvents {
    lines: Option<Lines<BufReader<File>>>,
}

impl MessageEvents {
    pub fn open(path: &Path) -> Self {
        let lines = File::open(path)
            .ok()
            .map(|file| BufReader::new(file).lines());
        Self { lines }
    }
}

impl Iterator for MessageEvents {
    type Item = MessageEvent;

    fn next(&mut self) -> Option<MessageEvent> {
        loop {
            match self.lines.as_mut()?.next() {
                Some(Ok(line)) => {
                    if let Some(event) = parse_message_event(&line) {
                        return Some(event);
                    }
                }
                Some(Err(_)) | None => {
                    self.lines = None;
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn yields_message_events_in_line_order() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("s1.jsonl");
        fs::write(
            &path,
            concat!(
                r#"{"type":"message","message":{"timestamp":1,"usage":{"cost":{"total":0.5}}}}"#,
                "\n",
                r#"{"type":"session","cwd":"/tmp"}"#,
                "\n",
                r#"{"type":"message","message":{"timestamp":2}}"#,
                "\n",
            ),
        )
        .expect("write");

        let events = MessageEvents::open(&path).collect::<Vec<_>>();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].timestamp_ms, 1);
        assert_eq!(events[0].cost, 0.5);
        assert_eq!(events[1].timestamp_ms, 2);
        assert_eq!(events[1].cost, 0.0);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("s1.jsonl");
        fs::write(
            &path,
            concat!(
                "{broken\n",
                "\n",
                r#"{"type":"message","message":{"timestamp":1}}"#,
                "\n",
            ),
        )
        .expect("write");

        assert_eq!(MessageEvents::open(&path).count(), 1);
    }

    #[test]
    fn missing_file_is_an_empty_stream() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("missing.jsonl");
        assert_eq!(MessageEvents::open(&path).count(), 0);
    }

    #[test]
    fn stream_is_restartable() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("s1.jsonl");
        fs::write(
            &path,
            concat!(r#"{"type":"message","message":{"timestamp":1}}"#, "\n"),
        )
        .expect("write");

        let first = MessageEvents::open(&path).collect::<Vec<_>>();
        let second = MessageEvents::open(&path).collect::<Vec<_>>();
        assert_eq!(first, second);
    }
}
