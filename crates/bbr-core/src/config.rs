use crate::error::{BbrError, Result};
use crate::paths;
use crate::types::Adapter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Name of the link that carries the UAA database properties.
pub const DB_LINK: &str = "uaa_db";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// RawConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseRecord {
    pub name: String,
    pub tag: String,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub name: String,
    #[serde(default)]
    pub password: String,
    pub tag: String,
}

impl std::fmt::Debug for RoleRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleRecord")
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .field("tag", &self.tag)
            .finish()
    }
}

/// Connection information as one source provides it, before resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawConfig {
    pub address: String,
    pub port: u16,
    pub db_scheme: String,
    #[serde(default)]
    pub databases: Vec<DatabaseRecord>,
    #[serde(default)]
    pub roles: Vec<RoleRecord>,
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_level_backup: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uaadb: Option<RawConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub properties: LinkProperties,
}

// ---------------------------------------------------------------------------
// Local properties
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitedFunctionality {
    #[serde(rename = "statusFile", default = "default_status_file")]
    pub status_file: PathBuf,
}

fn default_status_file() -> PathBuf {
    PathBuf::from(paths::LIMITED_MODE_MARKER)
}

impl Default for LimitedFunctionality {
    fn default() -> Self {
        Self {
            status_file: default_status_file(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UaaProperties {
    #[serde(rename = "limitedFunctionality", default)]
    pub limited_functionality: LimitedFunctionality,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    #[serde(default)]
    pub release_level_backup: bool,
    #[serde(default)]
    pub uaa: UaaProperties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uaadb: Option<RawConfig>,
}

// ---------------------------------------------------------------------------
// TagConfig
// ---------------------------------------------------------------------------

/// Tag pair used to pick the database and role records out of a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagConfig {
    #[serde(default = "default_database_tag")]
    pub database: String,
    #[serde(default = "default_role_tag")]
    pub role: String,
}

fn default_database_tag() -> String {
    "uaa".to_string()
}

fn default_role_tag() -> String {
    "admin".to_string()
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            database: default_database_tag(),
            role: default_role_tag(),
        }
    }
}

// ---------------------------------------------------------------------------
// PathsConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_job_path")]
    pub job_path: PathBuf,
    #[serde(default = "default_restorer_bin_dir")]
    pub restorer_bin_dir: PathBuf,
    #[serde(default = "default_monit_bin")]
    pub monit_bin: PathBuf,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_post_start_hook")]
    pub post_start_hook: PathBuf,
}

fn default_job_path() -> PathBuf {
    PathBuf::from(paths::JOB_PATH)
}

fn default_restorer_bin_dir() -> PathBuf {
    PathBuf::from(paths::RESTORER_BIN_DIR)
}

fn default_monit_bin() -> PathBuf {
    PathBuf::from(paths::MONIT_BIN)
}

fn default_service_name() -> String {
    paths::SERVICE_NAME.to_string()
}

fn default_post_start_hook() -> PathBuf {
    PathBuf::from(paths::POST_START_HOOK)
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            job_path: default_job_path(),
            restorer_bin_dir: default_restorer_bin_dir(),
            monit_bin: default_monit_bin(),
            service_name: default_service_name(),
            post_start_hook: default_post_start_hook(),
        }
    }
}

impl PathsConfig {
    pub fn config_path(&self) -> PathBuf {
        paths::config_path(&self.job_path)
    }

    pub fn backup_tool(&self) -> PathBuf {
        paths::backup_tool(&self.restorer_bin_dir)
    }

    pub fn restore_tool(&self) -> PathBuf {
        paths::restore_tool(&self.restorer_bin_dir)
    }
}

// ---------------------------------------------------------------------------
// Manifest (top-level)
// ---------------------------------------------------------------------------

/// Rendered job inputs for one node: consumed links plus local properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<HashMap<String, Option<Link>>>,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub tags: TagConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(BbrError::ManifestNotFound(path.to_path_buf()));
        }
        let data = std::fs::read_to_string(path)?;
        Self::from_yaml(&data)
    }

    pub fn from_yaml(data: &str) -> Result<Self> {
        let manifest: Manifest = serde_yaml::from_str(data)?;
        Ok(manifest)
    }

    /// The database link, if this node consumes one. This is the single
    /// link-presence test behind both connection and participation resolution.
    pub fn db_link(&self) -> Option<&Link> {
        self.links.as_ref()?.get(DB_LINK)?.as_ref()
    }

    pub fn marker_path(&self) -> &Path {
        &self.properties.uaa.limited_functionality.status_file
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        // 1. The authoritative source must carry connection info
        let (source_name, raw) = match self.db_link() {
            Some(link) => {
                if self.properties.uaadb.is_some() {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: format!(
                            "link '{DB_LINK}' is present; local properties.uaadb is ignored"
                        ),
                    });
                }
                ("linked", link.properties.uaadb.as_ref())
            }
            None => ("local", self.properties.uaadb.as_ref()),
        };

        match raw {
            None => warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("{source_name} configuration has no uaadb section"),
            }),
            Some(raw) => {
                // 2. Scheme must normalize to a known adapter
                if Adapter::from_scheme(&raw.db_scheme).is_err() {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Error,
                        message: format!(
                            "unsupported db_scheme '{}' in {source_name} configuration",
                            raw.db_scheme
                        ),
                    });
                }

                // 3. Tagged records must exist
                if !raw.databases.iter().any(|d| d.tag == self.tags.database) {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Error,
                        message: format!(
                            "no database tagged '{}' in {source_name} configuration",
                            self.tags.database
                        ),
                    });
                }
                if !raw.roles.iter().any(|r| r.tag == self.tags.role) {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Error,
                        message: format!(
                            "no role tagged '{}' in {source_name} configuration",
                            self.tags.role
                        ),
                    });
                }
            }
        }

        // 4. The marker is polled by the running service, so it must be absolute
        if !self.marker_path().is_absolute() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "limitedFunctionality.statusFile '{}' is not an absolute path",
                    self.marker_path().display()
                ),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
