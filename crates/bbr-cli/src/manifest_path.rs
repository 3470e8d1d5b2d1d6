use bbr_core::paths;
use std::path::{Path, PathBuf};

/// Resolve the manifest location.
///
/// Priority:
/// 1. `--manifest` flag / `BBR_MANIFEST` env var (passed in as `explicit`)
/// 2. `$BBR_JOB_PATH/config/manifest.yml`
/// 3. The job's rendered manifest under `/var/vcap/jobs`
pub fn resolve_manifest_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    if let Some(job_path) = std::env::var_os("BBR_JOB_PATH") {
        return PathBuf::from(job_path)
            .join(paths::CONFIG_DIR)
            .join("manifest.yml");
    }
    PathBuf::from(paths::MANIFEST_FILE)
}
