use crate::domain::{
    IndexedSession, index_sessions_by_id, parse_cron_job_names, parse_sessions_index,
};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveStoreRootError {
    #[error("home directory not found")]
    HomeDirNotFound,
}

pub fn resolve_store_root() -> Result<PathBuf, ResolveStoreRootError> {
    if let Some(override_dir) = std::env::var_os("OPENCLAW_DIR") {
        return Ok(PathBuf::from(override_dir));
    }

    let Some(home) = dirs::home_dir() else {
        return Err(ResolveStoreRootError::HomeDirNotFound);
    };

    Ok(home.join(".openclaw"))
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sessions directory does not exist: {0}")]
    SessionsDirMissing(String),

    #[error("failed to read sessions directory: {0}")]
    SessionsDirUnreadable(String),
}

/// One discovered transcript file. `modified_ms == 0` when the modification
/// time is unavailable.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionFile {
    pub session_id: String,
    pub path: PathBuf,
    pub modified_ms: i64,
}

/// Read-only view of a session store root. Every load method re-reads from
/// disk; nothing is cached across passes.
#[derive(Clone, Debug)]
pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join("agents").join("main").join("sessions")
    }

    fn sessions_index_path(&self) -> PathBuf {
        self.sessions_dir().join("sessions.json")
    }

    fn cron_jobs_path(&self) -> PathBuf {
        self.root.join("cron").join("jobs.json")
    }

    /// Enumerate `*.jsonl` transcripts, sorted by file name, one entry per
    /// session id. An unreachable sessions directory is the one condition
    /// surfaced as an error, so callers can tell "no sessions yet" from
    /// "store unreachable"; individual unreadable entries are skipped.
    pub fn list_session_files(&self) -> Result<Vec<SessionFile>, StoreError> {
        let sessions_dir = self.sessions_dir();
        if !sessions_dir.exists() {
            return Err(StoreError::SessionsDirMissing(
                sessions_dir.display().to_string(),
            ));
        }

        let entries = fs::read_dir(&sessions_dir).map_err(|error| {
            StoreError::SessionsDirUnreadable(format!("{}: {error}", sessions_dir.display()))
        })?;

        let mut files: Vec<SessionFile> = Vec::new();
        for entry in entries {
            let Ok(entry) = entry else {
                continue;
            };
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("jsonl") {
                continue;
            }
            let Some(session_id) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(|stem| stem.to_string())
            else {
                continue;
            };
            let modified_ms = fs::metadata(&path)
                .ok()
                .and_then(|metadata| metadata.modified().ok())
                .and_then(system_time_to_unix_ms)
                .unwrap_or(0);
            files.push(SessionFile {
                session_id,
                path,
                modified_ms,
            });
        }

        files.sort_by(|a, b| a.session_id.cmp(&b.session_id));

        let mut seen: BTreeSet<String> = BTreeSet::new();
        files.retain(|file| seen.insert(file.session_id.clone()));

        Ok(files)
    }

    pub fn find_session_file(&self, session_id: &str) -> Result<Option<SessionFile>, StoreError> {
        Ok(self
            .list_session_files()?
            .into_iter()
            .find(|file| file.session_id == session_id))
    }

    /// Load `sessions.json` keyed by session id. Missing, unreadable or
    /// unparsable index yields an empty map; aggregation proceeds without
    /// metadata.
    pub fn load_session_index(&self) -> BTreeMap<String, IndexedSession> {
        let Ok(text) = fs::read_to_string(self.sessions_index_path()) else {
            return BTreeMap::new();
        };
        match parse_sessions_index(&text) {
            Ok(entries) => index_sessions_by_id(entries),
            Err(_) => BTreeMap::new(),
        }
    }

    /// Load the cron job id → display name table; empty on any failure.
    pub fn load_cron_job_names(&self) -> BTreeMap<String, String> {
        let Ok(text) = fs::read_to_string(self.cron_jobs_path()) else {
            return BTreeMap::new();
        };
        parse_cron_job_names(&text).unwrap_or_default()
    }
}

fn system_time_to_unix_ms(value: SystemTime) -> Option<i64> {
    let delta = value.duration_since(UNIX_EPOCH).ok()?;
    i64::try_from(delta.as_millis()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SessionKind;
    use tempfile::tempdir;

    fn make_store(root: &std::path::Path) -> SessionStore {
        let store = SessionStore::new(root.to_path_buf());
        fs::create_dir_all(store.sessions_dir()).expect("create sessions dir");
        store
    }

    #[test]
    fn missing_sessions_dir_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let store = SessionStore::new(dir.path().join("missing"));
        assert!(matches!(
            store.list_session_files(),
            Err(StoreError::SessionsDirMissing(_))
        ));
    }

    #[test]
    fn empty_store_lists_no_files() {
        let dir = tempdir().expect("tempdir");
        let store = make_store(dir.path());
        assert_eq!(store.list_session_files().expect("list"), Vec::new());
    }

    #[test]
    fn lists_only_jsonl_sorted_by_name() {
        let dir = tempdir().expect("tempdir");
        let store = make_store(dir.path());
        let sessions_dir = store.sessions_dir();
        fs::write(sessions_dir.join("zzz.jsonl"), "").expect("write");
        fs::write(sessions_dir.join("aaa.jsonl"), "").expect("write");
        fs::write(sessions_dir.join("sessions.json"), "{}").expect("write");
        fs::write(sessions_dir.join("notes.txt"), "").expect("write");

        let files = store.list_session_files().expect("list");
        let ids = files
            .iter()
            .map(|file| file.session_id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["aaa", "zzz"]);
        assert!(files.iter().all(|file| file.modified_ms > 0));
    }

    #[test]
    fn finds_a_session_file_by_id() {
        let dir = tempdir().expect("tempdir");
        let store = make_store(dir.path());
        fs::write(store.sessions_dir().join("abc123.jsonl"), "").expect("write");

        let found = store.find_session_file("abc123").expect("list");
        assert_eq!(found.map(|file| file.session_id), Some("abc123".to_string()));
        assert_eq!(store.find_session_file("nope").expect("list"), None);
    }

    #[test]
    fn missing_or_corrupt_index_yields_empty_metadata() {
        let dir = tempdir().expect("tempdir");
        let store = make_store(dir.path());
        assert!(store.load_session_index().is_empty());

        fs::write(store.sessions_dir().join("sessions.json"), "{not json")
            .expect("write");
        assert!(store.load_session_index().is_empty());
    }

    #[test]
    fn loads_index_and_cron_names() {
        let dir = tempdir().expect("tempdir");
        let store = make_store(dir.path());
        fs::write(
            store.sessions_dir().join("sessions.json"),
            r#"{"agent:main:cron:job42": {"sessionId": "abc123", "updatedAt": 0}}"#,
        )
        .expect("write index");

        let cron_dir = dir.path().join("cron");
        fs::create_dir_all(&cron_dir).expect("create cron dir");
        fs::write(
            cron_dir.join("jobs.json"),
            r#"{"jobs":[{"id":"job42","name":"Nightly Backup"}]}"#,
        )
        .expect("write jobs");

        let index = store.load_session_index();
        assert_eq!(
            index.get("abc123").map(|meta| meta.kind.clone()),
            Some(SessionKind::Cron {
                job_id: Some("job42".to_string())
            })
        );

        let names = store.load_cron_job_names();
        assert_eq!(
            names.get("job42").map(String::as_str),
            Some("Nightly Backup")
        );
    }

    #[test]
    fn missing_cron_registry_yields_empty_table() {
        let dir = tempdir().expect("tempdir");
        let store = make_store(dir.path());
        assert!(store.load_cron_job_names().is_empty());
    }
}
