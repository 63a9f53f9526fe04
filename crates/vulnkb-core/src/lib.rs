//! vulnkb-core: opens the vulnerability knowledge bases a report run depends on, under a
//! critical/optional policy, and releases them deterministically.
//!
//! ```no_run
//! use vulnkb_core::{CoreConfig, Orchestrator};
//!
//! let config = CoreConfig::load()?;
//! let specs = config.resource_specs()?;
//! let mut bundle = Orchestrator::new().acquire_all(&specs)?;
//! // ... detection reads from bundle.driver(kind) ...
//! for err in bundle.release_all() {
//!     eprintln!("{err}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod knowledge;
mod orchestrator;
mod shared;

pub use error::{AcquireError, BoxError, CloseError, OpenError, SpecError};

pub use knowledge::{
    open_resource, Criticality, DriverOpener, FileProbe, KnowledgeDriver, LocalFileProbe,
    OpenOutcome, ProbeResult, ResourceKind, ResourceSpec, SledOpener, SledStore, StorageBackend,
    KIND_LABELS, SLED_FORMAT,
};

pub use orchestrator::{
    Absence, AcquireWarning, AcquiredResource, Advisory, Bundle, Orchestrator, Slot, SlotState,
    SlotStatus,
};

pub use shared::{CoreConfig, StoreConfig, REMOTE_QUERY_TYPE};
