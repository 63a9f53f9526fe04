//! Existence check for local-file stores.

use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeResult {
    Exists,
    Missing,
}

/// Reports whether a store's file is present. Must not create or modify anything.
pub trait FileProbe {
    fn probe(&self, path: &Path) -> ProbeResult;
}

/// Data file sled keeps inside every store directory.
const SLED_DATA_FILE: &str = "db";

/// Filesystem probe. Sled creates missing stores on open, so this runs first.
///
/// A directory only counts as a store once it holds sled's data file; an empty or
/// unrelated directory is `Missing`. Any other file at the path is `Exists` and left for
/// the opener to reject.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileProbe;

impl FileProbe for LocalFileProbe {
    fn probe(&self, path: &Path) -> ProbeResult {
        let present = if path.is_dir() {
            path.join(SLED_DATA_FILE).is_file()
        } else {
            path.exists()
        };
        if present {
            ProbeResult::Exists
        } else {
            ProbeResult::Missing
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_reports_missing_without_creating() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cve.sled");
        assert_eq!(LocalFileProbe.probe(&path), ProbeResult::Missing);
        assert!(!path.exists());

        drop(sled::open(&path).unwrap());
        assert_eq!(LocalFileProbe.probe(&path), ProbeResult::Exists);
    }

    #[test]
    fn test_empty_directory_is_not_a_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("oval.sled");
        std::fs::create_dir(&path).unwrap();
        assert_eq!(LocalFileProbe.probe(&path), ProbeResult::Missing);
        assert_eq!(std::fs::read_dir(&path).unwrap().count(), 0);
    }

    #[test]
    fn test_plain_file_is_left_to_the_opener() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("gost.sled");
        std::fs::write(&path, b"garbage").unwrap();
        assert_eq!(LocalFileProbe.probe(&path), ProbeResult::Exists);
    }
}
