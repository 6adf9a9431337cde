//! # Expiring Files Module
//!
//! Scratch files (downloaded photos) are recorded with a creation timestamp
//! and a TTL. Expired files are removed by a periodic sweep or on the next
//! registration, whichever comes first.

use chrono::{DateTime, Duration, Utc};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

/// A scratch file and its lifetime
#[derive(Debug, Clone, PartialEq)]
pub struct ExpiringFile {
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl ExpiringFile {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + self.ttl
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}

/// Registry of scratch files awaiting deletion
#[derive(Debug)]
pub struct ExpiringFiles {
    entries: Mutex<Vec<ExpiringFile>>,
    ttl: Duration,
}

impl ExpiringFiles {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            ttl,
        }
    }

    /// Record a new scratch file, sweeping expired ones first
    pub fn register(&self, path: impl AsRef<Path>) {
        self.register_at(path, Utc::now());
    }

    pub fn register_at(&self, path: impl AsRef<Path>, now: DateTime<Utc>) {
        self.sweep_at(now);
        let entry = ExpiringFile {
            path: path.as_ref().to_path_buf(),
            created_at: now,
            ttl: self.ttl,
        };
        debug!(
            path = %entry.path.display(),
            expires_at = %entry.expires_at(),
            "Scratch file registered"
        );
        self.lock().push(entry);
    }

    /// Delete every expired file. Returns how many records were dropped.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }

    pub fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let expired: Vec<ExpiringFile> = {
            let mut entries = self.lock();
            let (expired, alive): (Vec<_>, Vec<_>) =
                entries.drain(..).partition(|entry| entry.is_expired(now));
            *entries = alive;
            expired
        };

        for entry in &expired {
            match std::fs::remove_file(&entry.path) {
                Ok(()) => debug!(path = %entry.path.display(), "Scratch file removed"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %entry.path.display(), error = %e, "Failed to remove scratch file")
                }
            }
        }

        expired.len()
    }

    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ExpiringFile>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn scratch_file() -> PathBuf {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"image bytes").unwrap();
        let (_, path) = file.keep().unwrap();
        path
    }

    #[test]
    fn test_sweep_removes_only_expired_files() {
        let files = ExpiringFiles::new(Duration::seconds(60));
        let start = Utc::now();
        let old = scratch_file();
        let fresh = scratch_file();

        files.register_at(&old, start);
        files.register_at(&fresh, start + Duration::seconds(50));

        let removed = files.sweep_at(start + Duration::seconds(60));

        assert_eq!(removed, 1);
        assert!(!old.exists());
        assert!(fresh.exists());
        assert_eq!(files.pending(), 1);

        std::fs::remove_file(fresh).unwrap();
    }

    #[test]
    fn test_register_sweeps_expired_entries() {
        let files = ExpiringFiles::new(Duration::seconds(10));
        let start = Utc::now();
        let old = scratch_file();
        let fresh = scratch_file();

        files.register_at(&old, start);
        files.register_at(&fresh, start + Duration::seconds(11));

        assert!(!old.exists());
        assert_eq!(files.pending(), 1);

        std::fs::remove_file(fresh).unwrap();
    }

    #[test]
    fn test_missing_file_is_dropped_silently() {
        let files = ExpiringFiles::new(Duration::seconds(1));
        let start = Utc::now();
        files.register_at("/nonexistent/scratch.jpg", start);
        assert_eq!(files.sweep_at(start + Duration::seconds(2)), 1);
        assert_eq!(files.pending(), 0);
    }
}
