use crate::domain::TranscriptMessage;
use crate::infra::{SessionStore, StoreError, build_dashboard, build_hourly_activity, load_transcript_detail};
use std::io::{self, Write};
use thiserror::Error;
use time::OffsetDateTime;

const DEFAULT_TRANSCRIPT_LIMIT: usize = 10;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliInvocation {
    PrintHelp,
    PrintVersion,
    Command(CliCommand),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliCommand {
    Dashboard {
        json: bool,
        limit: Option<usize>,
    },
    Activity {
        json: bool,
    },
    Transcript {
        session_id: String,
        json: bool,
        offset: usize,
        limit: usize,
    },
}

#[derive(Debug, Error)]
pub enum CliParseError {
    #[error("unknown subcommand: {0}")]
    UnknownSubcommand(String),

    #[error("unknown flag: {0}")]
    UnknownFlag(String),

    #[error("missing value for flag: {0}")]
    MissingFlagValue(String),

    #[error("invalid value for {flag}: {value}")]
    InvalidFlagValue { flag: String, value: String },

    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),

    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),
}

pub fn parse_invocation(args: &[String]) -> Result<CliInvocation, CliParseError> {
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        return Ok(CliInvocation::PrintHelp);
    }
    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        return Ok(CliInvocation::PrintVersion);
    }

    let mut iter = args.iter().skip(1);

    // Bare invocation and bare flags both mean the dashboard view.
    let Some(subcommand) = iter.next() else {
        return Ok(CliInvocation::Command(CliCommand::Dashboard {
            json: false,
            limit: None,
        }));
    };
    if subcommand.starts_with('-') {
        return parse_dashboard(std::iter::once(subcommand).chain(iter));
    }

    match subcommand.as_str() {
        "dashboard" => parse_dashboard(iter),
        "activity" => {
            let mut json = false;
            for arg in iter {
                match arg.as_str() {
                    "--json" => json = true,
                    _ if arg.starts_with('-') => {
                        return Err(CliParseError::UnknownFlag(arg.to_string()));
                    }
                    _ => return Err(CliParseError::UnexpectedArgument(arg.to_string())),
                }
            }
            Ok(CliInvocation::Command(CliCommand::Activity { json }))
        }
        "transcript" => {
            let mut session_id: Option<String> = None;
            let mut json = false;
            let mut offset = 0usize;
            let mut limit = DEFAULT_TRANSCRIPT_LIMIT;

            let mut args = iter;
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--json" => json = true,
                    "--limit" | "-l" => {
                        let value = args.next().ok_or_else(|| {
                            CliParseError::MissingFlagValue("--limit".to_string())
                        })?;
                        limit = parse_usize_flag("--limit", value)?;
                    }
                    "--offset" | "-o" => {
                        let value = args.next().ok_or_else(|| {
                            CliParseError::MissingFlagValue("--offset".to_string())
                        })?;
                        offset = parse_usize_flag("--offset", value)?;
                    }
                    _ if arg.starts_with('-') => {
                        return Err(CliParseError::UnknownFlag(arg.to_string()));
                    }
                    _ => {
                        if session_id.is_some() {
                            return Err(CliParseError::UnexpectedArgument(arg.to_string()));
                        }
                        session_id = Some(arg.to_string());
                    }
                }
            }

            let session_id = session_id.ok_or(CliParseError::MissingArgument("session-id"))?;
            Ok(CliInvocation::Command(CliCommand::Transcript {
                session_id,
                json,
                offset,
                limit,
            }))
        }
        other => Err(CliParseError::UnknownSubcommand(other.to_string())),
    }
}

fn parse_dashboard(
    args: impl Iterator<Item = impl AsRef<str>>,
) -> Result<CliInvocation, CliParseError> {
    let mut json = false;
    let mut limit: Option<usize> = None;

    let mut args = args.peekable();
    while let Some(arg) = args.next() {
        match arg.as_ref() {
            "--json" => json = true,
            "--limit" | "-l" => {
                let value = args
                    .next()
                    .ok_or_else(|| CliParseError::MissingFlagValue("--limit".to_string()))?;
                limit = Some(parse_usize_flag("--limit", value.as_ref())?);
            }
            other if other.starts_with('-') => {
                return Err(CliParseError::UnknownFlag(other.to_string()));
            }
            other => return Err(CliParseError::UnexpectedArgument(other.to_string())),
        }
    }

    Ok(CliInvocation::Command(CliCommand::Dashboard { json, limit }))
}

fn parse_usize_flag(flag: &str, value: &str) -> Result<usize, CliParseError> {
    value
        .parse::<usize>()
        .map_err(|_| CliParseError::InvalidFlagValue {
            flag: flag.to_string(),
            value: value.to_string(),
        })
}

#[derive(Debug, Error)]
pub enum CliRunError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(
        "session not found: {0}\nHint: run `antenna dashboard` and copy the session id column."
    )]
    SessionNotFound(String),

    #[error(transparent)]
    WriteOutput(#[from] io::Error),
}

pub fn run(
    command: CliCommand,
    store: &SessionStore,
    now: OffsetDateTime,
) -> Result<(), CliRunError> {
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    match command {
        CliCommand::Dashboard { json, limit } => {
            let snapshot = build_dashboard(store, now)?;
            if json {
                let rendered = serde_json::to_string_pretty(&snapshot)
                    .unwrap_or_else(|_| "{}".to_string());
                write_line(&mut out, &rendered)?;
                return Ok(());
            }

            let summary = format!(
                "sessions: {}\ttotal: {}\ttoday: {}",
                snapshot.total_count,
                format_cost(snapshot.total_cost),
                format_cost(snapshot.today_cost),
            );
            if !write_line(&mut out, &summary)? {
                return Ok(());
            }

            let now_ms = crate::domain::unix_ms(now);
            let shown = limit.unwrap_or(snapshot.sessions.len());
            for record in snapshot.sessions.iter().take(shown) {
                let line = format!(
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    record.session_id,
                    record.kind.label(),
                    record.name,
                    record.message_count,
                    format_cost(record.today_cost),
                    format_cost(record.total_cost),
                    format_age(now_ms, record.updated_at),
                    if record.is_active { "active" } else { "idle" },
                );
                if !write_line(&mut out, &line)? {
                    return Ok(());
                }
            }
            Ok(())
        }
        CliCommand::Activity { json } => {
            let buckets = build_hourly_activity(store, now)?;
            if json {
                let rendered = serde_json::to_string_pretty(&buckets)
                    .unwrap_or_else(|_| "[]".to_string());
                write_line(&mut out, &rendered)?;
                return Ok(());
            }

            for bucket in &buckets {
                let line = format!(
                    "{}\t{}\t{}",
                    bucket.hour,
                    bucket.messages,
                    format_cost(bucket.cost)
                );
                if !write_line(&mut out, &line)? {
                    return Ok(());
                }
            }
            Ok(())
        }
        CliCommand::Transcript {
            session_id,
            json,
            offset,
            limit,
        } => {
            let Some(file) = store.find_session_file(&session_id)? else {
                return Err(CliRunError::SessionNotFound(session_id));
            };
            let detail = load_transcript_detail(&file.path);

            if json {
                let rendered = serde_json::to_string_pretty(&detail)
                    .unwrap_or_else(|_| "{}".to_string());
                write_line(&mut out, &rendered)?;
                return Ok(());
            }

            if let Some(cwd) = &detail.cwd {
                if !write_line(&mut out, &format!("cwd:\t{cwd}"))? {
                    return Ok(());
                }
            }
            if let Some(model) = &detail.model {
                let provider = detail.provider.as_deref().unwrap_or("unknown");
                if !write_line(&mut out, &format!("model:\t{model} ({provider})"))? {
                    return Ok(());
                }
            }
            for message in detail.messages.iter().skip(offset).take(limit) {
                if !write_line(&mut out, &format_transcript_row(message))? {
                    return Ok(());
                }
            }
            Ok(())
        }
    }
}

fn format_transcript_row(message: &TranscriptMessage) -> String {
    let mut line = format!(
        "{}\t{}\t{}\t{}",
        message.timestamp_ms,
        message.role,
        format_cost(message.cost),
        first_line(&message.text),
    );
    if !message.tool_calls.is_empty() {
        line.push_str(&format!(" [tools: {}]", message.tool_calls.join(",")));
    }
    if message.has_thinking {
        line.push_str(" [thinking]");
    }
    if message.is_error {
        let detail = message.error_message.as_deref().unwrap_or("unknown");
        line.push_str(&format!(" [error: {detail}]"));
    }
    line
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

fn format_cost(value: f64) -> String {
    format!("${value:.4}")
}

fn format_age(now_ms: i64, updated_at_ms: i64) -> String {
    const MINUTE_MS: i64 = 60 * 1000;
    const HOUR_MS: i64 = 60 * MINUTE_MS;
    const DAY_MS: i64 = 24 * HOUR_MS;

    let elapsed = now_ms - updated_at_ms;
    if elapsed < MINUTE_MS {
        "just now".to_string()
    } else if elapsed < HOUR_MS {
        format!("{}m ago", elapsed / MINUTE_MS)
    } else if elapsed < DAY_MS {
        format!("{}h ago", elapsed / HOUR_MS)
    } else {
        format!("{}d ago", elapsed / DAY_MS)
    }
}

fn write_line(out: &mut impl Write, line: &str) -> io::Result<bool> {
    match writeln!(out, "{line}") {
        Ok(()) => Ok(true),
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(false),
        Err(error) => Err(error),
    }
}
