use dashmap::DashMap;
use std::path::{Path, PathBuf};

use crate::session::SessionToken;

/// Key-value store mapping a session to the path of its export file.
pub trait SessionRecords: Send + Sync {
    fn get(&self, session: &SessionToken) -> Option<PathBuf>;

    /// Record `path` for `session`, returning the path it replaced
    fn insert(&self, session: SessionToken, path: PathBuf) -> Option<PathBuf>;

    fn remove(&self, session: &SessionToken) -> Option<PathBuf>;

    /// Drop every record for which `keep` returns false
    fn retain(&self, keep: &mut dyn FnMut(&SessionToken, &Path) -> bool);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local records. Lost on restart, which leaves any files behind for
/// the sweep.
#[derive(Debug, Default)]
pub struct InMemorySessionRecords {
    records: DashMap<SessionToken, PathBuf>,
}

impl InMemorySessionRecords {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionRecords for InMemorySessionRecords {
    fn get(&self, session: &SessionToken) -> Option<PathBuf> {
        self.records.get(session).map(|entry| entry.value().clone())
    }

    fn insert(&self, session: SessionToken, path: PathBuf) -> Option<PathBuf> {
        self.records.insert(session, path)
    }

    fn remove(&self, session: &SessionToken) -> Option<PathBuf> {
        self.records.remove(session).map(|(_, path)| path)
    }

    fn retain(&self, keep: &mut dyn FnMut(&SessionToken, &Path) -> bool) {
        self.records.retain(|session, path| keep(session, path.as_path()));
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}
