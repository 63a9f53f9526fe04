//! Report sinks: where finished results are persisted as named objects.

use crate::format;
use crate::model::{timestamp_key, ScanResult};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::borrow::Cow;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    #[error("invalid object name {0:?}: must stay inside the container")]
    InvalidKey(String),

    #[error("failed to compress {key}: {source}")]
    Compress {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {key} to JSON: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {key}: {source}")]
    Write {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// Which object variants to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReportFormats {
    /// `{key}.json`
    pub json: bool,
    /// `{key}_full.txt`
    pub full_text: bool,
    /// `{first scanned_at}/summary.txt`, one per batch
    pub one_line: bool,
    /// `{key}_short.txt`
    pub list: bool,
    /// Gzip every object and append `.gz` to its name.
    pub gzip: bool,
}

impl ReportFormats {
    pub fn all() -> Self {
        Self {
            json: true,
            full_text: true,
            one_line: true,
            list: true,
            gzip: false,
        }
    }

    pub fn compressed(self) -> Self {
        Self { gzip: true, ..self }
    }
}

/// Destination for finished results. Never sees the knowledge-base bundle.
pub trait ReportSink {
    /// Persists every result; an empty slice writes nothing. Fails without writing when
    /// the container is missing.
    fn write(&self, results: &[ScanResult]) -> Result<(), ReportError>;

    /// Fails when the storage container does not exist.
    fn check_container(&self) -> Result<(), ReportError>;
}

/// Object store backed by a directory: the directory is the container, object names
/// are relative paths inside it. Writes never create the container itself.
pub struct DirectorySink {
    root: PathBuf,
    formats: ReportFormats,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>, formats: ReportFormats) -> Self {
        Self {
            root: root.into(),
            formats,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), ReportError> {
        let relative = Path::new(key);
        let contained = relative.components().next().is_some()
            && relative.components().all(|c| matches!(c, Component::Normal(_)));
        if !contained {
            return Err(ReportError::InvalidKey(key.to_string()));
        }

        let (key, bytes): (String, Cow<[u8]>) = if self.formats.gzip {
            let compressed = gz(bytes).map_err(|source| ReportError::Compress {
                key: key.to_string(),
                source,
            })?;
            (format!("{}.gz", key), Cow::Owned(compressed))
        } else {
            (key.to_string(), Cow::Borrowed(bytes))
        };
        let key = key.as_str();

        let target = self.root.join(key);
        let write = || -> std::io::Result<()> {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&target, &*bytes)
        };
        write().map_err(|source| ReportError::Write {
            key: key.to_string(),
            source,
        })?;
        tracing::debug!(
            target: "vulnkb::report",
            key = key,
            bytes = bytes.len(),
            "wrote {} ({} bytes)",
            key,
            bytes.len()
        );
        Ok(())
    }
}

fn gz(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    encoder.finish()
}

impl ReportSink for DirectorySink {
    fn write(&self, results: &[ScanResult]) -> Result<(), ReportError> {
        let Some(first) = results.first() else {
            return Ok(());
        };
        self.check_container()?;

        if self.formats.one_line {
            let key = format!("{}/summary.txt", timestamp_key(&first.scanned_at));
            self.put(&key, format::one_line_summary(results).as_bytes())?;
        }

        for r in results {
            let stem = r.report_key_name();
            if self.formats.json {
                let key = format!("{}.json", stem);
                let bytes = serde_json::to_vec_pretty(r).map_err(|source| ReportError::Serialize {
                    key: key.clone(),
                    source,
                })?;
                self.put(&key, &bytes)?;
            }
            if self.formats.list {
                self.put(&format!("{}_short.txt", stem), format::list(r).as_bytes())?;
            }
            if self.formats.full_text {
                self.put(&format!("{}_full.txt", stem), format::full_text(r).as_bytes())?;
            }
        }

        tracing::info!(
            target: "vulnkb::report",
            results = results.len(),
            root = %self.root.display(),
            "wrote {} report(s) to {}",
            results.len(),
            self.root.display()
        );
        Ok(())
    }

    fn check_container(&self) -> Result<(), ReportError> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(ReportError::ContainerNotFound(self.root.display().to_string()))
        }
    }
}
