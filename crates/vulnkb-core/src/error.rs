//! Error taxonomy for acquisition and release.
//!
//! `Skipped` and `Absent` outcomes are not errors and never show up here.

use crate::knowledge::ResourceKind;
use thiserror::Error;

/// Error currency for driver causes.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result of a driver's open call when no handle was produced.
#[derive(Debug, Error)]
pub enum OpenError {
    /// Another process holds the store's exclusive writer lock.
    #[error("store is locked by another process: {0}")]
    Locked(#[source] BoxError),
    /// Corruption, permissions, unsupported format, schema mismatch, ...
    #[error("{0}")]
    Failed(#[source] BoxError),
}

/// Aborting outcome of an acquisition run. Anything opened earlier in the run has been
/// released by the time the caller sees one of these.
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error(
        "{kind} is locked by another process: {path}. It is being updated; \
         re-run once the update has finished"
    )]
    Locked {
        kind: ResourceKind,
        path: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to open {kind} at {path}: {source}")]
    OpenFailed {
        kind: ResourceKind,
        path: String,
        #[source]
        source: BoxError,
    },

    #[error("{kind} is configured more than once")]
    DuplicateResource { kind: ResourceKind },
}

impl AcquireError {
    /// True when re-running later (not reconfiguring) is the remedy.
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked { .. })
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Locked { kind, .. }
            | Self::OpenFailed { kind, .. }
            | Self::DuplicateResource { kind } => *kind,
        }
    }
}

/// A handle that failed to close. Collected, never fatal.
#[derive(Debug, Error)]
#[error("failed to close {kind}: {source}")]
pub struct CloseError {
    pub kind: ResourceKind,
    #[source]
    pub source: BoxError,
}

/// Configuration could not be turned into resource specs.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("[{key}] has no type; use \"remote-query\" or a local format such as \"sled\"")]
    MissingType { key: &'static str },

    #[error("[{key}] is remote-query but has no url")]
    MissingEndpoint { key: &'static str },
}
