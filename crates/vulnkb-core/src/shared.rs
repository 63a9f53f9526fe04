//! Configuration for the five knowledge bases and the registry that turns it into
//! [`ResourceSpec`]s.

use crate::error::SpecError;
use crate::knowledge::{ResourceKind, ResourceSpec, StorageBackend, SLED_FORMAT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// `type` value for stores queried over HTTP at detection time.
pub const REMOTE_QUERY_TYPE: &str = "remote-query";
/// Accepted alias of [`REMOTE_QUERY_TYPE`].
const HTTP_TYPE: &str = "http";

/// One store's table (`[cve_dict]`, `[oval_dict]`, `[gost]`, `[exploit]`, `[metasploit]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// `"remote-query"` (alias `"http"`) or a local format such as `"sled"`.
    #[serde(rename = "type", default = "default_store_type")]
    pub store_type: String,
    /// Endpoint for remote-query stores.
    #[serde(default)]
    pub url: Option<String>,
    /// Explicit local path; defaults to `{storage_path}/{default file name}`.
    #[serde(default)]
    pub path: Option<String>,
}

fn default_store_type() -> String {
    SLED_FORMAT.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: default_store_type(),
            url: None,
            path: None,
        }
    }
}

impl StoreConfig {
    pub fn remote(url: impl Into<String>) -> Self {
        Self {
            store_type: REMOTE_QUERY_TYPE.to_string(),
            url: Some(url.into()),
            path: None,
        }
    }

    pub fn local(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn is_remote_query(&self) -> bool {
        matches!(self.store_type.as_str(), REMOTE_QUERY_TYPE | HTTP_TYPE)
    }
}

/// Vulnerability database configuration. Load from TOML or env.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Base directory for default local store paths.
    pub storage_path: String,
    /// Verbose query logging for every store.
    #[serde(default)]
    pub debug_sql: bool,
    #[serde(default)]
    pub cve_dict: StoreConfig,
    #[serde(default)]
    pub oval_dict: StoreConfig,
    #[serde(default)]
    pub gost: StoreConfig,
    #[serde(default)]
    pub exploit: StoreConfig,
    #[serde(default)]
    pub metasploit: StoreConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            storage_path: "./data".to_string(),
            debug_sql: false,
            cve_dict: StoreConfig::default(),
            oval_dict: StoreConfig::default(),
            gost: StoreConfig::default(),
            exploit: StoreConfig::default(),
            metasploit: StoreConfig::default(),
        }
    }
}

impl CoreConfig {
    /// Load config from file and environment. Precedence: env `VULNKB_CONFIG` path >
    /// `config/vulnkb.toml` > defaults; `VULNKB_*` variables (separator `__`) override
    /// file values, e.g. `VULNKB_GOST__TYPE=remote-query`.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("VULNKB_CONFIG").unwrap_or_else(|_| "config/vulnkb.toml".to_string());
        Self::load_from(Path::new(&config_path))
    }

    /// Same as [`load`](Self::load) with an explicit file; a missing file means defaults.
    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .set_default("storage_path", "./data")?
            .set_default("debug_sql", false)?;

        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(
                config::Environment::with_prefix("VULNKB")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        built.try_deserialize()
    }

    pub fn store(&self, kind: ResourceKind) -> &StoreConfig {
        match kind {
            ResourceKind::CveDictionary => &self.cve_dict,
            ResourceKind::OvalDictionary => &self.oval_dict,
            ResourceKind::PatchTrackingStore => &self.gost,
            ResourceKind::ExploitIndex => &self.exploit,
            ResourceKind::ExploitModuleIndex => &self.metasploit,
        }
    }

    /// Builds the spec for one store.
    pub fn resource_spec(&self, kind: ResourceKind) -> Result<ResourceSpec, SpecError> {
        let store = self.store(kind);
        let key = kind.config_key();
        let store_type = store.store_type.trim();
        if store_type.is_empty() {
            return Err(SpecError::MissingType { key });
        }

        let backend = if store.is_remote_query() {
            let endpoint = store
                .url
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .ok_or(SpecError::MissingEndpoint { key })?;
            StorageBackend::RemoteQuery {
                endpoint: endpoint.to_string(),
            }
        } else {
            let path = match store.path.as_deref().filter(|p| !p.is_empty()) {
                Some(p) => PathBuf::from(p),
                None => Path::new(&self.storage_path).join(kind.default_file_name()),
            };
            StorageBackend::LocalFile {
                path,
                format: store_type.to_string(),
            }
        };
        Ok(ResourceSpec::new(kind, backend, self.debug_sql))
    }

    /// Specs for all five stores in priority order.
    pub fn resource_specs(&self) -> Result<Vec<ResourceSpec>, SpecError> {
        ResourceKind::all()
            .into_iter()
            .map(|kind| self.resource_spec(kind))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::Criticality;
    use std::sync::Mutex;

    /// Serializes tests that load config; `VULNKB_*` variables are process-wide.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults_resolve_under_storage_path() {
        let config = CoreConfig {
            storage_path: "/var/lib/vuls".to_string(),
            ..CoreConfig::default()
        };
        let specs = config.resource_specs().unwrap();
        assert_eq!(specs.len(), 5);
        assert_eq!(specs[0].kind, ResourceKind::CveDictionary);
        assert_eq!(specs[0].criticality, Criticality::Critical);
        assert_eq!(
            specs[4].backend,
            StorageBackend::LocalFile {
                path: PathBuf::from("/var/lib/vuls/go-msfdb.sled"),
                format: "sled".to_string(),
            }
        );
        assert!(specs[1..].iter().all(|s| s.criticality == Criticality::Optional));
    }

    #[test]
    fn test_path_override_and_remote_query() {
        let config = CoreConfig {
            debug_sql: true,
            cve_dict: StoreConfig::remote("http://127.0.0.1:1323"),
            gost: StoreConfig::local("/srv/gost.sled"),
            exploit: StoreConfig {
                store_type: "http".to_string(),
                url: Some("http://127.0.0.1:1326".to_string()),
                path: None,
            },
            ..CoreConfig::default()
        };
        let cve = config.resource_spec(ResourceKind::CveDictionary).unwrap();
        assert_eq!(
            cve.backend,
            StorageBackend::RemoteQuery {
                endpoint: "http://127.0.0.1:1323".to_string()
            }
        );
        assert!(cve.debug);

        let gost = config.resource_spec(ResourceKind::PatchTrackingStore).unwrap();
        assert_eq!(gost.backend.local_path(), Some(Path::new("/srv/gost.sled")));

        let exploit = config.resource_spec(ResourceKind::ExploitIndex).unwrap();
        assert!(matches!(exploit.backend, StorageBackend::RemoteQuery { .. }));
    }

    #[test]
    fn test_remote_query_without_url_is_rejected() {
        let config = CoreConfig {
            oval_dict: StoreConfig {
                store_type: REMOTE_QUERY_TYPE.to_string(),
                url: Some("  ".to_string()),
                path: None,
            },
            ..CoreConfig::default()
        };
        let err = config.resource_specs().unwrap_err();
        assert!(matches!(err, SpecError::MissingEndpoint { key: "oval_dict" }));
    }

    #[test]
    fn test_empty_type_is_rejected() {
        let config = CoreConfig {
            metasploit: StoreConfig {
                store_type: String::new(),
                url: None,
                path: None,
            },
            ..CoreConfig::default()
        };
        assert!(matches!(
            config.resource_spec(ResourceKind::ExploitModuleIndex),
            Err(SpecError::MissingType { key: "metasploit" })
        ));
    }

    #[test]
    fn test_load_from_toml_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("vulnkb.toml");
        std::fs::write(
            &path,
            r#"
storage_path = "/opt/vulnkb"
debug_sql = true

[cve_dict]
type = "remote-query"
url = "http://cve.internal:1323"

[oval_dict]
type = "sled"
path = "/data/oval.sled"
"#,
        )
        .unwrap();

        let config = CoreConfig::load_from(&path).unwrap();
        assert_eq!(config.storage_path, "/opt/vulnkb");
        assert!(config.debug_sql);
        assert!(config.cve_dict.is_remote_query());
        assert_eq!(config.oval_dict.path.as_deref(), Some("/data/oval.sled"));
        assert_eq!(config.gost, StoreConfig::default());

        let gost = config.resource_spec(ResourceKind::PatchTrackingStore).unwrap();
        assert_eq!(
            gost.backend.local_path(),
            Some(Path::new("/opt/vulnkb/gost.sled"))
        );
    }

    #[test]
    fn test_environment_overrides_file_values() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("vulnkb.toml");
        std::fs::write(
            &path,
            r#"
storage_path = "/opt/vulnkb"

[gost]
type = "sled"
path = "/data/gost.sled"
"#,
        )
        .unwrap();

        std::env::set_var("VULNKB_GOST__TYPE", "remote-query");
        std::env::set_var("VULNKB_GOST__URL", "http://gost.internal:1325");
        std::env::set_var("VULNKB_STORAGE_PATH", "/srv/vulnkb");
        let loaded = CoreConfig::load_from(&path);
        std::env::remove_var("VULNKB_GOST__TYPE");
        std::env::remove_var("VULNKB_GOST__URL");
        std::env::remove_var("VULNKB_STORAGE_PATH");

        let config = loaded.unwrap();
        assert_eq!(config.storage_path, "/srv/vulnkb");
        let gost = config.resource_spec(ResourceKind::PatchTrackingStore).unwrap();
        assert_eq!(
            gost.backend,
            StorageBackend::RemoteQuery {
                endpoint: "http://gost.internal:1325".to_string()
            }
        );
        let cve = config.resource_spec(ResourceKind::CveDictionary).unwrap();
        assert_eq!(cve.backend.local_path(), Some(Path::new("/srv/vulnkb/cve.sled")));
    }
}
