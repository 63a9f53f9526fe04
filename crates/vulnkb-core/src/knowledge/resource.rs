//! Static description of the five vulnerability knowledge bases.
//!
//! | Order | ResourceKind        | Config key   | Criticality | Feeds                          |
//! |-------|---------------------|--------------|-------------|--------------------------------|
//! | 1     | CveDictionary       | `cve_dict`   | Critical    | CVE details, CPE scan          |
//! | 2     | OvalDictionary      | `oval_dict`  | Optional    | OS package advisories          |
//! | 3     | PatchTrackingStore  | `gost`       | Optional    | unfixed / patch-not-released   |
//! | 4     | ExploitIndex        | `exploit`    | Optional    | public exploit code            |
//! | 5     | ExploitModuleIndex  | `metasploit` | Optional    | metasploit modules             |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Config keys in priority order.
const CONFIG_KEYS: [&str; 5] = ["cve_dict", "oval_dict", "gost", "exploit", "metasploit"];

/// Human-readable names in priority order.
pub const KIND_LABELS: [&str; 5] = [
    "cve-dictionary",
    "oval-dictionary",
    "gost",
    "exploitdb",
    "metasploit",
];

/// Default local store names, resolved under `storage_path`.
const DEFAULT_FILE_NAMES: [&str; 5] = [
    "cve.sled",
    "oval.sled",
    "gost.sled",
    "go-exploitdb.sled",
    "go-msfdb.sled",
];

/// Knowledge-base kind. Discriminants follow acquisition priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// CVE details (NVD/JVN). The only store the report cannot do without.
    CveDictionary = 1,
    /// OS vendor advisories in OVAL form.
    OvalDictionary = 2,
    /// Distro security trackers (Debian, Red Hat, ...).
    PatchTrackingStore = 3,
    /// Public exploit code indexed by CVE-ID.
    ExploitIndex = 4,
    /// Metasploit modules indexed by CVE-ID.
    ExploitModuleIndex = 5,
}

impl ResourceKind {
    #[inline]
    fn index(&self) -> usize {
        *self as usize - 1
    }

    /// Key of this store's table in the configuration file.
    #[inline]
    pub fn config_key(&self) -> &'static str {
        CONFIG_KEYS[self.index()]
    }

    #[inline]
    pub fn label(&self) -> &'static str {
        KIND_LABELS[self.index()]
    }

    /// File name used when no explicit path is configured.
    #[inline]
    pub fn default_file_name(&self) -> &'static str {
        DEFAULT_FILE_NAMES[self.index()]
    }

    /// Sled tree holding this store's records.
    #[inline]
    pub fn tree_name(&self) -> &'static str {
        CONFIG_KEYS[self.index()]
    }

    /// Only the CVE dictionary is critical.
    pub fn criticality(&self) -> Criticality {
        match self {
            Self::CveDictionary => Criticality::Critical,
            _ => Criticality::Optional,
        }
    }

    /// What the report loses when this store's local file is missing.
    pub fn missing_advice(&self) -> &'static str {
        match self {
            Self::CveDictionary => {
                "CPE scan needs the CVE dictionary; fetch it before reporting if the config lists CPEs"
            }
            Self::OvalDictionary => "OS package advisories will not be matched",
            Self::PatchTrackingStore => {
                "patch-not-released CVE-IDs for Debian, RHEL and CentOS will not be detected"
            }
            Self::ExploitIndex => "exploit codes of detected CVE-IDs will not be displayed",
            Self::ExploitModuleIndex => {
                "metasploit modules of detected CVE-IDs will not be displayed"
            }
        }
    }

    pub fn from_config_key(key: &str) -> Option<Self> {
        Self::all().into_iter().find(|k| k.config_key() == key)
    }

    /// All kinds in acquisition priority order.
    pub fn all() -> [Self; 5] {
        [
            Self::CveDictionary,
            Self::OvalDictionary,
            Self::PatchTrackingStore,
            Self::ExploitIndex,
            Self::ExploitModuleIndex,
        ]
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether a failed open aborts acquisition (`Critical`) or only degrades the report.
/// `Critical` sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    Critical,
    Optional,
}

/// Where a store lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StorageBackend {
    /// Queried live at detection time; nothing is opened up front.
    RemoteQuery { endpoint: String },
    /// Embedded store opened once and held for the run.
    LocalFile { path: PathBuf, format: String },
}

impl StorageBackend {
    /// Endpoint or local path, for messages.
    pub fn location(&self) -> String {
        match self {
            Self::RemoteQuery { endpoint } => endpoint.clone(),
            Self::LocalFile { path, .. } => path.display().to_string(),
        }
    }

    pub fn local_path(&self) -> Option<&Path> {
        match self {
            Self::RemoteQuery { .. } => None,
            Self::LocalFile { path, .. } => Some(path),
        }
    }
}

/// Everything needed to open one store. Built from configuration before acquisition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSpec {
    pub kind: ResourceKind,
    pub backend: StorageBackend,
    pub criticality: Criticality,
    /// Verbose query logging for this store.
    #[serde(default)]
    pub debug: bool,
}

impl ResourceSpec {
    /// Spec with the kind's own criticality.
    pub fn new(kind: ResourceKind, backend: StorageBackend, debug: bool) -> Self {
        Self {
            kind,
            backend,
            criticality: kind.criticality(),
            debug,
        }
    }

    pub fn local(kind: ResourceKind, path: impl Into<PathBuf>, format: impl Into<String>) -> Self {
        Self::new(
            kind,
            StorageBackend::LocalFile {
                path: path.into(),
                format: format.into(),
            },
            false,
        )
    }

    pub fn remote(kind: ResourceKind, endpoint: impl Into<String>) -> Self {
        Self::new(
            kind,
            StorageBackend::RemoteQuery {
                endpoint: endpoint.into(),
            },
            false,
        )
    }

    #[inline]
    pub fn is_critical(&self) -> bool {
        self.criticality == Criticality::Critical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_cve_dictionary_is_critical() {
        let critical: Vec<ResourceKind> = ResourceKind::all()
            .into_iter()
            .filter(|k| k.criticality() == Criticality::Critical)
            .collect();
        assert_eq!(critical, vec![ResourceKind::CveDictionary]);
    }

    #[test]
    fn test_config_key_lookup() {
        for kind in ResourceKind::all() {
            assert_eq!(ResourceKind::from_config_key(kind.config_key()), Some(kind));
        }
        assert_eq!(ResourceKind::from_config_key("nvd"), None);
    }

    #[test]
    fn test_critical_sorts_first() {
        let mut specs = vec![
            ResourceSpec::remote(ResourceKind::ExploitIndex, "http://x"),
            ResourceSpec::remote(ResourceKind::CveDictionary, "http://y"),
        ];
        specs.sort_by_key(|s| s.criticality);
        assert_eq!(specs[0].kind, ResourceKind::CveDictionary);
    }
}
