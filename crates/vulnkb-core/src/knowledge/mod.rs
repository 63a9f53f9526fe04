//! The five vulnerability knowledge bases and the contract their drivers implement.

mod factory;
mod probe;
mod resource;
mod store;

pub use factory::{open_resource, OpenOutcome};
pub use probe::{FileProbe, LocalFileProbe, ProbeResult};
pub use resource::{Criticality, ResourceKind, ResourceSpec, StorageBackend, KIND_LABELS};
pub use store::{SledOpener, SledStore, SLED_FORMAT};

use crate::error::{BoxError, OpenError};
use std::path::Path;

/// An open handle to one local knowledge base.
///
/// Owned by exactly one [`Bundle`](crate::Bundle) slot; only the bundle closes it.
pub trait KnowledgeDriver: Send {
    fn kind(&self) -> ResourceKind;

    /// Looks up one record (e.g. by CVE-ID).
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BoxError>;

    /// Number of records in the store.
    fn len(&self) -> Result<usize, BoxError>;

    fn is_empty(&self) -> Result<bool, BoxError> {
        Ok(self.len()? == 0)
    }

    /// Flushes and releases the underlying file and its lock.
    fn close(&mut self) -> Result<(), BoxError>;
}

/// Opens local knowledge bases of a given on-disk format.
///
/// Implementations must report lock contention as [`OpenError::Locked`] and every other
/// failure as [`OpenError::Failed`].
pub trait DriverOpener {
    fn open(
        &self,
        kind: ResourceKind,
        format: &str,
        path: &Path,
        debug: bool,
    ) -> Result<Box<dyn KnowledgeDriver>, OpenError>;
}
