mod cli;
mod domain;
mod infra;

use crate::cli::CliInvocation;
use crate::infra::SessionStore;
use std::io::{self, Write};
use thiserror::Error;
use time::OffsetDateTime;

#[derive(Debug, Error)]
enum MainError {
    #[error(transparent)]
    ResolveStore(#[from] crate::infra::ResolveStoreRootError),

    #[error(transparent)]
    Cli(#[from] crate::cli::CliRunError),
}

fn main() {
    if let Err(error) = run_main() {
        let mut err = io::stderr().lock();
        let _ = writeln!(err, "{error}");
        std::process::exit(1);
    }
}

fn run_main() -> Result<(), MainError> {
    let args = std::env::args().collect::<Vec<_>>();
    let invocation = match crate::cli::parse_invocation(&args) {
        Ok(invocation) => invocation,
        Err(error) => {
            let mut err = io::stderr().lock();
            let _ = writeln!(err, "{error}");
            let _ = writeln!(err);
            print_help();
            std::process::exit(2);
        }
    };

    match invocation {
        CliInvocation::PrintHelp => {
            print_help();
            Ok(())
        }
        CliInvocation::PrintVersion => {
            let mut out = io::stdout().lock();
            let _ = writeln!(out, "{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        CliInvocation::Command(command) => {
            let root = crate::infra::resolve_store_root()?;
            let store = SessionStore::new(root);
            // One reference instant per invocation; every component sees the
            // same "now".
            let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
            crate::cli::run(command, &store, now)?;
            Ok(())
        }
    }
}

fn print_help() {
    let text = format!(
        "{name} — observe agent session activity and costs\n\nUSAGE:\n  {name} [dashboard] [--json] [--limit N]   Print the session snapshot (default)\n  {name} activity [--json]                  Print the 24h activity histogram\n  {name} transcript <session-id> [--json] [--limit N] [--offset N]  Print one session's messages\n  {name} --help | --version\n\nDASHBOARD FLAGS:\n  --json         Output the snapshot as JSON\n  --limit N      Max session rows to print (default: all)\n\nTRANSCRIPT FLAGS:\n  --json         Output the transcript detail as JSON\n  --limit N      Max messages to print (default: 10)\n  --offset N     Skip first N messages (default: 0)\n\nOUTPUT:\n  dashboard: session_id<TAB>kind<TAB>name<TAB>messages<TAB>today<TAB>total<TAB>updated<TAB>state\n  activity:  hour<TAB>messages<TAB>cost  (24 rows, trailing 24h window)\n\nENV:\n  OPENCLAW_DIR   Override the session store root (default: ~/.openclaw)\n",
        name = env!("CARGO_PKG_NAME")
    );
    let mut out = io::stdout().lock();
    let _ = write!(out, "{text}");
}
