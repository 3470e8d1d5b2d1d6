use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Well-known locations on a BOSH-deployed VM
// ---------------------------------------------------------------------------

pub const JOB_PATH: &str = "/var/vcap/jobs/bbr-uaadb";
pub const MANIFEST_FILE: &str = "/var/vcap/jobs/bbr-uaadb/config/manifest.yml";

pub const CONFIG_DIR: &str = "config";
pub const CONFIG_FILE: &str = "config.json";

pub const RESTORER_BIN_DIR: &str = "/var/vcap/jobs/database-backup-restorer/bin";
pub const BACKUP_TOOL: &str = "backup";
pub const RESTORE_TOOL: &str = "restore";

pub const MONIT_BIN: &str = "/var/vcap/bosh/bin/monit";
pub const SERVICE_NAME: &str = "uaa";
pub const POST_START_HOOK: &str = "/var/vcap/jobs/uaa/bin/post-start";

pub const LIMITED_MODE_MARKER: &str = "/var/vcap/data/uaa/bbr_limited_mode.lock";

/// Identity used to name the artifact handed to the restorer.
pub const ARTIFACT_JOB: &str = "uaadb";
pub const ARTIFACT_SUFFIX: &str = "artifact-file";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// `<job-path>/config/config.json`
pub fn config_path(job_path: &Path) -> PathBuf {
    job_path.join(CONFIG_DIR).join(CONFIG_FILE)
}

pub fn backup_tool(restorer_bin_dir: &Path) -> PathBuf {
    restorer_bin_dir.join(BACKUP_TOOL)
}

pub fn restore_tool(restorer_bin_dir: &Path) -> PathBuf {
    restorer_bin_dir.join(RESTORE_TOOL)
}

/// `<artifact-dir>/<job>-artifact-file`. The file itself belongs to the
/// external tool; this only names it.
pub fn artifact_path(artifact_dir: &Path) -> PathBuf {
    artifact_dir.join(format!("{ARTIFACT_JOB}-{ARTIFACT_SUFFIX}"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
