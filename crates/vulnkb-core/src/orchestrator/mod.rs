//! Acquisition: opens every configured knowledge base in priority order and applies the
//! abort/degrade policy.
//!
//! | Outcome      | Critical store          | Optional store                  |
//! |--------------|-------------------------|---------------------------------|
//! | Skipped      | absent (remote)         | absent (remote)                 |
//! | Absent       | absent + advisory       | absent + advisory               |
//! | Locked       | abort                   | abort                           |
//! | OpenFailed   | abort                   | absent + warning, continue      |
//! | Opened       | recorded                | recorded                        |

mod bundle;

pub use bundle::{
    Absence, AcquireWarning, AcquiredResource, Advisory, Bundle, Slot, SlotState, SlotStatus,
};

use crate::error::AcquireError;
use crate::knowledge::{
    open_resource, DriverOpener, FileProbe, LocalFileProbe, OpenOutcome, ResourceSpec, SledOpener,
};
use std::collections::HashSet;
use std::path::PathBuf;

/// Drives one acquisition run per [`acquire_all`](Self::acquire_all) call.
pub struct Orchestrator {
    opener: Box<dyn DriverOpener>,
    probe: Box<dyn FileProbe>,
}

impl Orchestrator {
    /// Sled stores, filesystem probe.
    pub fn new() -> Self {
        Self::with_opener(Box::new(SledOpener))
    }

    pub fn with_opener(opener: Box<dyn DriverOpener>) -> Self {
        Self {
            opener,
            probe: Box::new(LocalFileProbe),
        }
    }

    pub fn with_probe(mut self, probe: Box<dyn FileProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Opens every store in `specs`, critical first, one at a time.
    ///
    /// Returns a (possibly partial) bundle, or the aborting error once everything opened
    /// in this run has been released.
    pub fn acquire_all(&self, specs: &[ResourceSpec]) -> Result<Bundle, AcquireError> {
        let mut seen = HashSet::new();
        for spec in specs {
            if !seen.insert(spec.kind) {
                return Err(AcquireError::DuplicateResource { kind: spec.kind });
            }
        }

        let mut ordered: Vec<&ResourceSpec> = specs.iter().collect();
        ordered.sort_by_key(|spec| spec.criticality);

        let mut bundle = Bundle::new();
        for spec in ordered {
            let kind = spec.kind;
            let path = spec
                .backend
                .local_path()
                .map(PathBuf::from)
                .unwrap_or_default();

            match open_resource(spec, self.opener.as_ref(), self.probe.as_ref()) {
                OpenOutcome::Skipped => {
                    let endpoint = spec.backend.location();
                    bundle.record(kind, spec.criticality, Slot::Absent(Absence::Remote { endpoint }));
                }
                OpenOutcome::Absent => {
                    bundle.note_advisory(Advisory {
                        kind,
                        path: path.clone(),
                        message: kind.missing_advice().to_string(),
                    });
                    bundle.record(kind, spec.criticality, Slot::Absent(Absence::Missing { path }));
                }
                OpenOutcome::Locked(source) => {
                    abort(&mut bundle);
                    return Err(AcquireError::Locked {
                        kind,
                        path: path.display().to_string(),
                        source,
                    });
                }
                OpenOutcome::OpenFailed(source) if spec.is_critical() => {
                    abort(&mut bundle);
                    return Err(AcquireError::OpenFailed {
                        kind,
                        path: path.display().to_string(),
                        source,
                    });
                }
                OpenOutcome::OpenFailed(cause) => {
                    tracing::warn!(
                        target: "vulnkb::acquire",
                        kind = %kind,
                        path = %path.display(),
                        "unable to use {}: {}, err: {}",
                        kind,
                        path.display(),
                        cause
                    );
                    bundle.note_warning(AcquireWarning {
                        kind,
                        path: path.clone(),
                        cause: cause.to_string(),
                    });
                    bundle.record(
                        kind,
                        spec.criticality,
                        Slot::Absent(Absence::Degraded {
                            path,
                            cause: cause.to_string(),
                        }),
                    );
                }
                OpenOutcome::Opened(handle) => {
                    let res = AcquiredResource::new(kind, path, handle);
                    bundle.record(kind, spec.criticality, Slot::Opened(res));
                }
            }
        }

        tracing::info!(
            target: "vulnkb::acquire",
            opened = bundle.opened_kinds().len(),
            advisories = bundle.advisories().len(),
            warnings = bundle.warnings().len(),
            "knowledge bases acquired ({} opened)",
            bundle.opened_kinds().len()
        );
        Ok(bundle)
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

/// Releases a partial bundle before an abort error propagates.
fn abort(bundle: &mut Bundle) {
    for err in bundle.release_all() {
        tracing::warn!(target: "vulnkb::acquire", kind = %err.kind, "{}", err);
    }
}
