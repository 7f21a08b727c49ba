//! Application ledger
//!
//! The ledger is the authoritative log of what `apply` changed. Each session
//! is one JSON document in the configs directory; its file name encodes the
//! state (`applied_<id>.json` or `restored_<id>.json`). Consuming a session
//! is a rename, never an edit, so the log is append-only.

mod session;

pub use session::{ApplicationRecord, ApplicationSession, SessionState};

use std::fs;
use std::time::SystemTime;

use fpm_fs::io::{self, LockGuard};
use fpm_fs::NormalizedPath;

use crate::{Error, Result};

const LOCK_FILE: &str = ".ledger.lock";
const SESSION_EXTENSION: &str = ".json";

/// Persists and consumes application sessions.
#[derive(Debug, Clone)]
pub struct ApplicationLedger {
    dir: NormalizedPath,
}

impl ApplicationLedger {
    pub fn new(dir: NormalizedPath) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &NormalizedPath {
        &self.dir
    }

    fn lock(&self) -> Result<LockGuard> {
        Ok(LockGuard::acquire(&self.dir.join(LOCK_FILE))?)
    }

    fn session_path(&self, state: SessionState, id: &str) -> NormalizedPath {
        self.dir
            .join(&format!("{}{id}{SESSION_EXTENSION}", state.prefix()))
    }

    /// Persist a new session as `applied_<id>.json`.
    ///
    /// Fails if an applied session with the same id is already on disk.
    pub fn commit(&self, session: &ApplicationSession) -> Result<NormalizedPath> {
        let _lock = self.lock()?;
        let path = self.session_path(SessionState::Applied, &session.id);
        if path.exists() {
            return Err(Error::LedgerError {
                message: format!("session file {path} already exists"),
            });
        }

        let content = serde_json::to_string_pretty(session)?;
        io::write_text(&path, &content).map_err(|e| {
            tracing::error!(session = %session.id, error = %e, "Failed to persist session");
            Error::LedgerError {
                message: format!("failed to write {path}: {e}"),
            }
        })?;

        tracing::info!(session = %session.id, records = session.patches.len(), file = %path, "Committed session");
        Ok(path)
    }

    /// All persisted sessions, newest write first.
    ///
    /// Ties on modification time are broken by `applied_time`, then by file
    /// name, so the order is total. Unreadable `restored_*` files are skipped
    /// with a warning; an unreadable `applied_*` file is an error.
    pub fn sessions(&self) -> Result<Vec<ApplicationSession>> {
        let _lock = self.lock()?;
        self.scan(&[SessionState::Applied, SessionState::Restored])
    }

    fn scan(&self, states: &[SessionState]) -> Result<Vec<ApplicationSession>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let native = self.dir.to_native();
        let entries = fs::read_dir(&native).map_err(|e| fpm_fs::Error::io(&native, e))?;

        let mut found: Vec<(SystemTime, ApplicationSession)> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| fpm_fs::Error::io(&native, e))?;
            let name = entry.file_name().to_string_lossy().to_string();
            let Some(state) = session_state(&name) else {
                continue;
            };
            if !states.contains(&state) || !entry.path().is_file() {
                continue;
            }

            let path = self.dir.join(&name);
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .map_err(|e| fpm_fs::Error::io(path.to_native(), e))?;
            let session = match load_session(&path, state) {
                Ok(session) => session,
                Err(e) if state == SessionState::Restored => {
                    tracing::warn!(file = %path, error = %e, "Skipping unreadable restored session");
                    continue;
                }
                Err(e) => return Err(e),
            };
            found.push((modified, session));
        }

        found.sort_by(|(a_time, a), (b_time, b)| {
            b_time
                .cmp(a_time)
                .then_with(|| b.applied_time.cmp(&a.applied_time))
                .then_with(|| b.file.cmp(&a.file))
        });
        Ok(found.into_iter().map(|(_, session)| session).collect())
    }

    /// The most recently written session still in the `applied` state.
    ///
    /// Only `applied_*` files are read.
    pub fn latest_applied(&self) -> Result<Option<ApplicationSession>> {
        let _lock = self.lock()?;
        Ok(self.scan(&[SessionState::Applied])?.into_iter().next())
    }

    /// Move a session from `applied` to `restored` by renaming its file.
    ///
    /// If `restored_<id>.json` is already taken by an earlier session, the
    /// file is renamed to `restored_<id>_<unix-millis>.json` instead.
    pub fn mark_restored(&self, session: &ApplicationSession) -> Result<NormalizedPath> {
        let _lock = self.lock()?;
        let source = match &session.file {
            Some(file) => file.clone(),
            None => self.session_path(SessionState::Applied, &session.id),
        };
        if !source.is_file() {
            return Err(Error::LedgerError {
                message: format!("session file {source} not found"),
            });
        }

        let mut dest = self.session_path(SessionState::Restored, &session.id);
        if dest.exists() {
            let suffixed = format!("{}_{}", session.id, chrono::Utc::now().timestamp_millis());
            dest = self.session_path(SessionState::Restored, &suffixed);
        }

        fs::rename(source.to_native(), dest.to_native()).map_err(|e| {
            tracing::error!(session = %session.id, error = %e, "Failed to consume session");
            Error::LedgerError {
                message: format!("failed to rename {source} to {dest}: {e}"),
            }
        })?;

        tracing::info!(session = %session.id, file = %dest, "Marked session restored");
        Ok(dest)
    }
}

fn session_state(file_name: &str) -> Option<SessionState> {
    if !file_name.ends_with(SESSION_EXTENSION) {
        return None;
    }
    [SessionState::Applied, SessionState::Restored]
        .into_iter()
        .find(|state| file_name.starts_with(state.prefix()))
}

fn load_session(path: &NormalizedPath, state: SessionState) -> Result<ApplicationSession> {
    let content = io::read_text(path)?;
    let mut session: ApplicationSession =
        serde_json::from_str(&content).map_err(|e| Error::LedgerError {
            message: format!("corrupt session file {path}: {e}"),
        })?;
    session.state = state;
    session.file = Some(path.clone());
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use tempfile::TempDir;

    fn setup() -> (TempDir, ApplicationLedger) {
        let temp = TempDir::new().unwrap();
        let ledger = ApplicationLedger::new(NormalizedPath::new(temp.path().join("configs")));
        (temp, ledger)
    }

    fn session(id: &str) -> ApplicationSession {
        ApplicationSession::new(
            id,
            vec![ApplicationRecord {
                category: Category::Timezone,
                target_file: "base/time/time.cc".to_string(),
                patch_file: "patches/timezone/custom_x_time.cc.patch".to_string(),
            }],
        )
    }

    #[test]
    fn empty_ledger_has_nothing_applied() {
        let (_temp, ledger) = setup();
        assert!(ledger.latest_applied().unwrap().is_none());
        assert!(ledger.sessions().unwrap().is_empty());
    }

    #[test]
    fn commit_then_latest_applied() {
        let (temp, ledger) = setup();
        let path = ledger.commit(&session("abc")).unwrap();

        assert!(temp.path().join("configs/applied_abc.json").is_file());
        let latest = ledger.latest_applied().unwrap().unwrap();
        assert_eq!(latest.id, "abc");
        assert_eq!(latest.file, Some(path));
        assert_eq!(latest.patches.len(), 1);
    }

    #[test]
    fn commit_refuses_to_overwrite() {
        let (_temp, ledger) = setup();
        ledger.commit(&session("abc")).unwrap();
        assert!(matches!(
            ledger.commit(&session("abc")),
            Err(Error::LedgerError { .. })
        ));
    }

    #[test]
    fn mark_restored_renames_and_excludes() {
        let (temp, ledger) = setup();
        ledger.commit(&session("abc")).unwrap();
        let latest = ledger.latest_applied().unwrap().unwrap();

        let dest = ledger.mark_restored(&latest).unwrap();

        assert_eq!(dest.file_name(), Some("restored_abc.json"));
        assert!(!temp.path().join("configs/applied_abc.json").exists());
        assert!(ledger.latest_applied().unwrap().is_none());
        let all = ledger.sessions().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].state, SessionState::Restored);
    }

    #[test]
    fn second_consume_of_same_id_gets_unique_name() {
        let (_temp, ledger) = setup();
        ledger.commit(&session("abc")).unwrap();
        let first = ledger.latest_applied().unwrap().unwrap();
        ledger.mark_restored(&first).unwrap();

        ledger.commit(&session("abc")).unwrap();
        let second = ledger.latest_applied().unwrap().unwrap();
        let dest = ledger.mark_restored(&second).unwrap();

        let name = dest.file_name().unwrap();
        assert!(name.starts_with("restored_abc_"), "{name}");
        assert_eq!(ledger.sessions().unwrap().len(), 2);
    }

    #[test]
    fn unrelated_json_files_are_ignored() {
        let (temp, ledger) = setup();
        fs::create_dir_all(temp.path().join("configs")).unwrap();
        fs::write(temp.path().join("configs/template.json"), "{}").unwrap();
        fs::write(temp.path().join("configs/fingerprint_x.json"), "{}").unwrap();

        assert!(ledger.sessions().unwrap().is_empty());
    }

    #[test]
    fn corrupt_session_is_a_ledger_error() {
        let (temp, ledger) = setup();
        fs::create_dir_all(temp.path().join("configs")).unwrap();
        fs::write(temp.path().join("configs/applied_bad.json"), "not json").unwrap();

        assert!(matches!(
            ledger.latest_applied(),
            Err(Error::LedgerError { message }) if message.contains("applied_bad.json")
        ));
    }

    #[test]
    fn corrupt_restored_session_is_skipped() {
        let (temp, ledger) = setup();
        ledger.commit(&session("live")).unwrap();
        fs::write(temp.path().join("configs/restored_old.json"), "{truncated").unwrap();

        let latest = ledger.latest_applied().unwrap().unwrap();
        assert_eq!(latest.id, "live");

        let all = ledger.sessions().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "live");

        ledger.mark_restored(&latest).unwrap();
        assert!(ledger.latest_applied().unwrap().is_none());
    }
}
