use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::models::quiz_session::QuizSession;

pub fn session_key(quiz_id: &str) -> String {
    format!("quiz-session:{}", quiz_id)
}

/// Client-local key-value storage for quiz sessions.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<QuizSession>>;
    fn set(&self, key: &str, session: &QuizSession) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    entries: Mutex<HashMap<String, QuizSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<QuizSession>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| Error::Internal("session store lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, session: &QuizSession) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| Error::Internal("session store lock poisoned".to_string()))?;
        entries.insert(key.to_string(), session.clone());
        Ok(())
    }
}

/// Sessions kept in one JSON object on disk, like a browser's local storage.
#[derive(Debug)]
pub struct JsonFileSessionStore {
    path: PathBuf,
    // serializes read-modify-write cycles
    write_lock: Mutex<()>,
}

impl JsonFileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn read_all(&self) -> Result<BTreeMap<String, QuizSession>> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, QuizSession>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SessionStore for JsonFileSessionStore {
    fn get(&self, key: &str) -> Result<Option<QuizSession>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, session: &QuizSession) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| Error::Internal("session file lock poisoned".to_string()))?;
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), session.clone());
        self.write_all(&entries)?;
        tracing::debug!(key, path = %self.path.display(), "Persisted quiz session");
        Ok(())
    }
}
