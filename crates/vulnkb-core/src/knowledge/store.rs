//! Sled-backed local store: one sled database directory per knowledge base, one tree per
//! kind. Sled holds an exclusive file lock for as long as a database is open, which is
//! how a concurrent fetch/update shows up here.

use super::{DriverOpener, KnowledgeDriver, ResourceKind};
use crate::error::{BoxError, OpenError};
use sled::Db;
use std::io;
use std::path::{Path, PathBuf};

/// Format identifier for sled stores in configuration (`type = "sled"`).
pub const SLED_FORMAT: &str = "sled";

/// Open handle to one sled knowledge base.
pub struct SledStore {
    kind: ResourceKind,
    path: PathBuf,
    db: Option<Db>,
    debug: bool,
}

impl SledStore {
    /// Opens the store at `path`. Sled creates missing databases, so callers probe first.
    pub fn open_path<P: AsRef<Path>>(
        kind: ResourceKind,
        path: P,
        debug: bool,
    ) -> Result<Self, sled::Error> {
        let path = path.as_ref().to_path_buf();
        let db = sled::open(&path)?;
        Ok(Self {
            kind,
            path,
            db: Some(db),
            debug,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.db.is_some()
    }

    fn tree(&self) -> Result<sled::Tree, BoxError> {
        let db = self.db.as_ref().ok_or("store is closed")?;
        Ok(db.open_tree(self.kind.tree_name())?)
    }
}

impl KnowledgeDriver for SledStore {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BoxError> {
        let value = self.tree()?.get(key.as_bytes())?;
        if self.debug {
            tracing::debug!(
                target: "vulnkb::knowledge",
                kind = %self.kind,
                key = key,
                hit = value.is_some(),
                "{} lookup '{}'",
                self.kind,
                key
            );
        }
        Ok(value.map(|iv| iv.to_vec()))
    }

    fn len(&self) -> Result<usize, BoxError> {
        Ok(self.tree()?.len())
    }

    fn close(&mut self) -> Result<(), BoxError> {
        if let Some(db) = self.db.take() {
            db.flush()?;
            tracing::debug!(
                target: "vulnkb::knowledge",
                kind = %self.kind,
                path = %self.path.display(),
                "closed {}",
                self.kind
            );
        }
        Ok(())
    }
}

/// Opens [`SledStore`]s for `type = "sled"`; any other format fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct SledOpener;

impl DriverOpener for SledOpener {
    fn open(
        &self,
        kind: ResourceKind,
        format: &str,
        path: &Path,
        debug: bool,
    ) -> Result<Box<dyn KnowledgeDriver>, OpenError> {
        if format != SLED_FORMAT {
            return Err(OpenError::Failed(
                format!("unsupported store format \"{}\" (supported: \"{}\")", format, SLED_FORMAT)
                    .into(),
            ));
        }
        match SledStore::open_path(kind, path, debug) {
            Ok(store) => Ok(Box::new(store)),
            Err(e) if is_lock_contention(&e) => Err(OpenError::Locked(Box::new(e))),
            Err(e) => Err(OpenError::Failed(Box::new(e))),
        }
    }
}

/// Sled reports a held lock as an I/O error ("could not acquire lock on ...") wrapping
/// the `WouldBlock` from the underlying `flock`.
fn is_lock_contention(err: &sled::Error) -> bool {
    match err {
        sled::Error::Io(e) => {
            if e.kind() == io::ErrorKind::WouldBlock {
                return true;
            }
            let msg = e.to_string();
            msg.contains("acquire lock") || msg.contains("WouldBlock")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn seed(path: &Path, kind: ResourceKind, entries: &[(&str, &str)]) {
        let db = sled::open(path).unwrap();
        let tree = db.open_tree(kind.tree_name()).unwrap();
        for (k, v) in entries {
            tree.insert(k.as_bytes(), v.as_bytes()).unwrap();
        }
        db.flush().unwrap();
    }

    #[test]
    fn test_open_get_and_close() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cve.sled");
        seed(&path, ResourceKind::CveDictionary, &[("CVE-2021-44228", "log4shell")]);

        let mut driver = SledOpener
            .open(ResourceKind::CveDictionary, SLED_FORMAT, &path, true)
            .unwrap();
        assert_eq!(driver.kind(), ResourceKind::CveDictionary);
        assert_eq!(driver.len().unwrap(), 1);
        assert_eq!(
            driver.get("CVE-2021-44228").unwrap(),
            Some(b"log4shell".to_vec())
        );
        assert_eq!(driver.get("CVE-1999-0001").unwrap(), None);

        driver.close().unwrap();
        assert!(driver.get("CVE-2021-44228").is_err());
        // closing twice is harmless
        driver.close().unwrap();
    }

    #[test]
    fn test_open_held_store_reports_locked() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gost.sled");
        let writer = sled::open(&path).unwrap();

        let result = SledOpener.open(ResourceKind::PatchTrackingStore, SLED_FORMAT, &path, false);
        assert!(matches!(result, Err(OpenError::Locked(_))));
        drop(writer);

        let reopened = SledOpener.open(ResourceKind::PatchTrackingStore, SLED_FORMAT, &path, false);
        assert!(reopened.is_ok());
    }

    #[test]
    fn test_plain_file_in_place_of_store_fails_without_lock() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("go-exploitdb.sled");
        std::fs::write(&path, b"not a sled database").unwrap();

        let result = SledOpener.open(ResourceKind::ExploitIndex, SLED_FORMAT, &path, false);
        assert!(matches!(result, Err(OpenError::Failed(_))));
    }

    #[test]
    fn test_unsupported_format_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cve.sqlite3");
        let result = SledOpener.open(ResourceKind::CveDictionary, "sqlite3", &path, false);
        match result {
            Err(OpenError::Failed(e)) => assert!(e.to_string().contains("sqlite3")),
            Err(other) => panic!("expected Failed, got {other:?}"),
            Ok(_) => panic!("expected Failed, got a handle"),
        }
        assert!(!path.exists());
    }
}
