//! The result of one acquisition run and the release of everything it holds.

use crate::error::CloseError;
use crate::knowledge::{Criticality, KnowledgeDriver, ResourceKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// A store that was opened during acquisition. The handle is moved out on release.
pub struct AcquiredResource {
    pub kind: ResourceKind,
    pub path: PathBuf,
    handle: Option<Box<dyn KnowledgeDriver>>,
}

impl AcquiredResource {
    pub(crate) fn new(kind: ResourceKind, path: PathBuf, handle: Box<dyn KnowledgeDriver>) -> Self {
        Self {
            kind,
            path,
            handle: Some(handle),
        }
    }

    pub fn is_released(&self) -> bool {
        self.handle.is_none()
    }
}

/// Why a slot holds no handle. Detection treats all of these as "enrichment unavailable".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Absence {
    /// Remote-query backend; queried live instead.
    Remote { endpoint: String },
    /// Local file not found.
    Missing { path: PathBuf },
    /// Optional store failed to open; the run continued without it.
    Degraded { path: PathBuf, cause: String },
}

pub enum Slot {
    Opened(AcquiredResource),
    Absent(Absence),
}

/// A missing local store, reported once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    pub kind: ResourceKind,
    pub path: PathBuf,
    pub message: String,
}

/// An optional store that failed to open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquireWarning {
    pub kind: ResourceKind,
    pub path: PathBuf,
    pub cause: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    Opened,
    Released,
    Remote,
    Missing,
    Degraded,
}

/// Per-store summary for status output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotStatus {
    pub kind: ResourceKind,
    pub name: String,
    pub criticality: Criticality,
    pub state: SlotState,
    pub location: String,
    pub entry_count: Option<usize>,
    pub error: Option<String>,
}

/// Opened handles and explicit absences, keyed by kind.
///
/// Owns every handle it holds. [`release_all`](Self::release_all) closes them; dropping an
/// unreleased bundle does the same.
pub struct Bundle {
    slots: BTreeMap<ResourceKind, Slot>,
    criticality: BTreeMap<ResourceKind, Criticality>,
    advisories: Vec<Advisory>,
    warnings: Vec<AcquireWarning>,
    released: bool,
}

impl Bundle {
    pub(crate) fn new() -> Self {
        Self {
            slots: BTreeMap::new(),
            criticality: BTreeMap::new(),
            advisories: Vec::new(),
            warnings: Vec::new(),
            released: false,
        }
    }

    /// Records the slot for `kind` with the criticality the run applied to it.
    pub(crate) fn record(&mut self, kind: ResourceKind, criticality: Criticality, slot: Slot) {
        self.criticality.insert(kind, criticality);
        self.slots.insert(kind, slot);
    }

    pub(crate) fn note_advisory(&mut self, advisory: Advisory) {
        self.advisories.push(advisory);
    }

    pub(crate) fn note_warning(&mut self, warning: AcquireWarning) {
        self.warnings.push(warning);
    }

    pub fn slot(&self, kind: ResourceKind) -> Option<&Slot> {
        self.slots.get(&kind)
    }

    /// Usable handle for `kind`, or `None` if absent, not configured, or released.
    pub fn driver(&self, kind: ResourceKind) -> Option<&dyn KnowledgeDriver> {
        match self.slots.get(&kind) {
            Some(Slot::Opened(res)) => res.handle.as_deref(),
            _ => None,
        }
    }

    pub fn is_available(&self, kind: ResourceKind) -> bool {
        self.driver(kind).is_some()
    }

    /// Criticality the run applied to `kind`, which may differ from the kind's default.
    pub fn criticality(&self, kind: ResourceKind) -> Option<Criticality> {
        self.criticality.get(&kind).copied()
    }

    pub fn absence(&self, kind: ResourceKind) -> Option<&Absence> {
        match self.slots.get(&kind) {
            Some(Slot::Absent(absence)) => Some(absence),
            _ => None,
        }
    }

    /// Kinds holding an open handle.
    pub fn opened_kinds(&self) -> Vec<ResourceKind> {
        self.slots
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Opened(res) if !res.is_released()))
            .map(|(kind, _)| *kind)
            .collect()
    }

    pub fn kinds(&self) -> impl Iterator<Item = ResourceKind> + '_ {
        self.slots.keys().copied()
    }

    pub fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }

    pub fn warnings(&self) -> &[AcquireWarning] {
        &self.warnings
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Status of every recorded slot, in priority order.
    pub fn status(&self) -> Vec<SlotStatus> {
        self.slots
            .iter()
            .map(|(kind, slot)| {
                let (state, location, entry_count, error) = match slot {
                    Slot::Opened(res) => match res.handle.as_deref() {
                        Some(driver) => match driver.len() {
                            Ok(n) => (SlotState::Opened, res.path.display().to_string(), Some(n), None),
                            Err(e) => (
                                SlotState::Opened,
                                res.path.display().to_string(),
                                None,
                                Some(e.to_string()),
                            ),
                        },
                        None => (SlotState::Released, res.path.display().to_string(), None, None),
                    },
                    Slot::Absent(Absence::Remote { endpoint }) => {
                        (SlotState::Remote, endpoint.clone(), None, None)
                    }
                    Slot::Absent(Absence::Missing { path }) => {
                        (SlotState::Missing, path.display().to_string(), None, None)
                    }
                    Slot::Absent(Absence::Degraded { path, cause }) => (
                        SlotState::Degraded,
                        path.display().to_string(),
                        None,
                        Some(cause.clone()),
                    ),
                };
                SlotStatus {
                    kind: *kind,
                    name: kind.label().to_string(),
                    criticality: self.criticality(*kind).unwrap_or_else(|| kind.criticality()),
                    state,
                    location,
                    entry_count,
                    error,
                }
            })
            .collect()
    }

    /// Closes every open handle, attempting all of them even when some fail, and returns
    /// every failure. Handles are moved out as they are closed, so a second call does
    /// nothing and returns an empty list.
    pub fn release_all(&mut self) -> Vec<CloseError> {
        let mut errs = Vec::new();
        for slot in self.slots.values_mut() {
            let Slot::Opened(res) = slot else {
                continue;
            };
            let Some(mut handle) = res.handle.take() else {
                continue;
            };
            match handle.close() {
                Ok(()) => tracing::debug!(
                    target: "vulnkb::acquire",
                    kind = %res.kind,
                    "released {}",
                    res.kind
                ),
                Err(source) => errs.push(CloseError {
                    kind: res.kind,
                    source,
                }),
            }
        }
        self.released = true;
        errs
    }
}

impl Drop for Bundle {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        for err in self.release_all() {
            tracing::warn!(target: "vulnkb::acquire", kind = %err.kind, "{}", err);
        }
    }
}

impl fmt::Debug for Bundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bundle")
            .field("opened", &self.opened_kinds())
            .field("advisories", &self.advisories.len())
            .field("warnings", &self.warnings.len())
            .field("released", &self.released)
            .finish()
    }
}
