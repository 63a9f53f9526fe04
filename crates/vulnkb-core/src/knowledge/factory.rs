//! One open routine for every knowledge base. Criticality is not consulted here; what
//! an outcome means for the run is decided by the orchestrator.

use super::{DriverOpener, FileProbe, KnowledgeDriver, ProbeResult, ResourceSpec, StorageBackend};
use crate::error::{BoxError, OpenError};
use std::fmt;

/// What happened when a single store was opened.
pub enum OpenOutcome {
    /// Remote backend; nothing to open.
    Skipped,
    /// Local file missing. Advisory only.
    Absent,
    /// Held by a concurrent writer.
    Locked(BoxError),
    OpenFailed(BoxError),
    Opened(Box<dyn KnowledgeDriver>),
}

impl fmt::Debug for OpenOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped => f.write_str("Skipped"),
            Self::Absent => f.write_str("Absent"),
            Self::Locked(e) => f.debug_tuple("Locked").field(e).finish(),
            Self::OpenFailed(e) => f.debug_tuple("OpenFailed").field(e).finish(),
            Self::Opened(driver) => f.debug_tuple("Opened").field(&driver.kind()).finish(),
        }
    }
}

/// Opens the store described by `spec`.
pub fn open_resource(
    spec: &ResourceSpec,
    opener: &dyn DriverOpener,
    probe: &dyn FileProbe,
) -> OpenOutcome {
    let kind = spec.kind;
    let (path, format) = match &spec.backend {
        StorageBackend::RemoteQuery { endpoint } => {
            tracing::debug!(
                target: "vulnkb::knowledge",
                kind = %kind,
                endpoint = %endpoint,
                "{} is queried remotely at {}; nothing to open",
                kind,
                endpoint
            );
            return OpenOutcome::Skipped;
        }
        StorageBackend::LocalFile { path, format } => (path, format),
    };

    if probe.probe(path) == ProbeResult::Missing {
        tracing::warn!(
            target: "vulnkb::knowledge",
            kind = %kind,
            path = %path.display(),
            "{}: {} not found; {}",
            kind,
            path.display(),
            kind.missing_advice()
        );
        return OpenOutcome::Absent;
    }

    tracing::debug!(
        target: "vulnkb::knowledge",
        kind = %kind,
        format = %format,
        path = %path.display(),
        "opening {} ({}): {}",
        kind,
        format,
        path.display()
    );
    match opener.open(kind, format, path, spec.debug) {
        Ok(driver) => OpenOutcome::Opened(driver),
        Err(OpenError::Locked(cause)) => OpenOutcome::Locked(cause),
        Err(OpenError::Failed(cause)) => OpenOutcome::OpenFailed(cause),
    }
}
