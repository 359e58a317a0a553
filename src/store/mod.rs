//! Session-scoped storage of duplicate exports.
//!
//! Each upload with duplicates writes one `duplicates_<hex>.csv` file under
//! the export directory and records it against the uploader's session. The
//! file is served on the next download and removed on explicit cleanup or by
//! the periodic sweep.

mod records;

pub use records::{InMemorySessionRecords, SessionRecords};

use rand::rngs::OsRng;
use rand::RngCore;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, info};

use crate::detector::DuplicateSet;
use crate::errors::{DupcheckError, DupcheckResult};
use crate::export;
use crate::session::SessionToken;

pub const EXPORT_PREFIX: &str = "duplicates_";
pub const EXPORT_EXTENSION: &str = ".csv";
pub const DOWNLOAD_FILENAME: &str = "duplicates.csv";
pub const DOWNLOAD_CONTENT_TYPE: &str = "text/csv";

pub const NO_DOWNLOAD_MESSAGE: &str =
    "No duplicate data available for download. Please upload a CSV file first.";

/// Contents of a session's export, ready to send.
#[derive(Debug, Clone)]
pub struct DownloadFile {
    pub path: PathBuf,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    Removed(PathBuf),
    NothingToRemove,
}

pub struct DerivedFileStore {
    export_dir: PathBuf,
    records: Arc<dyn SessionRecords>,
}

impl DerivedFileStore {
    pub fn new(export_dir: impl Into<PathBuf>, records: Arc<dyn SessionRecords>) -> Self {
        Self {
            export_dir: export_dir.into(),
            records,
        }
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    pub fn records(&self) -> &dyn SessionRecords {
        self.records.as_ref()
    }

    pub async fn ensure_export_dir(&self) -> DupcheckResult<()> {
        tokio::fs::create_dir_all(&self.export_dir).await?;
        Ok(())
    }

    /// Write `duplicates` to a fresh export file and record it for `session`.
    ///
    /// An empty set writes nothing and leaves the session's record untouched.
    /// A previous export of the same session is no longer referenced but stays
    /// on disk until swept.
    pub async fn save(
        &self,
        session: SessionToken,
        duplicates: &DuplicateSet,
    ) -> DupcheckResult<Option<PathBuf>> {
        if duplicates.is_empty() {
            return Ok(None);
        }

        let content = export::render(duplicates)?;
        let path = self.export_dir.join(generate_export_name());
        tokio::fs::write(&path, content).await?;

        info!(
            session = %session,
            rows = duplicates.len(),
            "Saved duplicate export to {}",
            path.display()
        );

        if let Some(previous) = self.records.insert(session, path.clone()) {
            debug!(
                session = %session,
                "Export {} replaced and left for sweep",
                previous.display()
            );
        }

        Ok(Some(path))
    }

    pub async fn retrieve(&self, session: &SessionToken) -> DupcheckResult<DownloadFile> {
        let path = self
            .records
            .get(session)
            .ok_or_else(|| DupcheckError::NotFound(NO_DOWNLOAD_MESSAGE.to_string()))?;

        match tokio::fs::read(&path).await {
            Ok(content) => Ok(DownloadFile { path, content }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(DupcheckError::NotFound(NO_DOWNLOAD_MESSAGE.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the session's export file and its record. Calling this without
    /// a record, or after the file is gone, changes nothing.
    pub async fn cleanup(&self, session: &SessionToken) -> DupcheckResult<CleanupOutcome> {
        let Some(path) = self.records.get(session) else {
            return Ok(CleanupOutcome::NothingToRemove);
        };

        if !tokio::fs::try_exists(&path).await? {
            return Ok(CleanupOutcome::NothingToRemove);
        }

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(CleanupOutcome::NothingToRemove);
            }
            Err(e) => return Err(e.into()),
        }
        self.records.remove(session);

        info!(session = %session, "Removed duplicate export {}", path.display());
        Ok(CleanupOutcome::Removed(path))
    }

    /// Delete export files at least `retention` old, along with any record
    /// pointing at them. Returns the number of files removed.
    pub async fn sweep(&self, retention: Duration) -> DupcheckResult<usize> {
        let mut entries = match tokio::fs::read_dir(&self.export_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let now = SystemTime::now();
        let mut removed: HashSet<PathBuf> = HashSet::new();

        while let Some(entry) = entries.next_entry().await? {
            if !is_export_name(&entry.file_name().to_string_lossy()) {
                continue;
            }
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let age = now
                .duration_since(metadata.modified()?)
                .unwrap_or(Duration::ZERO);
            if age < retention {
                continue;
            }

            let path = entry.path();
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    debug!("Swept export {}", path.display());
                    removed.insert(path);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        if !removed.is_empty() {
            self.records
                .retain(&mut |_, path| !removed.contains(path));
            info!("Swept {} expired duplicate exports", removed.len());
        }

        Ok(removed.len())
    }
}

/// `duplicates_<16 hex chars>.csv` from 8 bytes of OS randomness
fn generate_export_name() -> String {
    let mut bytes = [0u8; 8];
    OsRng.fill_bytes(&mut bytes);
    let token: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!("{}{}{}", EXPORT_PREFIX, token, EXPORT_EXTENSION)
}

fn is_export_name(name: &str) -> bool {
    name.strip_prefix(EXPORT_PREFIX)
        .and_then(|rest| rest.strip_suffix(EXPORT_EXTENSION))
        .map_or(false, |token| {
            token.len() == 16 && token.chars().all(|c| c.is_ascii_hexdigit())
        })
}
