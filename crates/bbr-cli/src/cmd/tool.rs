//! `backup` / `restore`: the BBR scripts that drive the restorer.
//!
//! Each writes `config.json` (always) and then, only if this node
//! participates, runs the restorer against `<artifact-dir>/uaadb-artifact-file`.

use crate::output::print_json;
use anyhow::Context;
use bbr_core::paths;
use bbr_core::resolver::resolve_manifest;
use bbr_core::types::Operation;
use bbr_core::window::WindowReport;
use chrono::Utc;
use std::path::Path;

pub fn backup(manifest_path: &Path, artifact_dir: &Path, json: bool) -> anyhow::Result<()> {
    run(manifest_path, Operation::Backup, artifact_dir, json)
}

pub fn restore(manifest_path: &Path, artifact_dir: &Path, json: bool) -> anyhow::Result<()> {
    run(manifest_path, Operation::Restore, artifact_dir, json)
}

fn run(manifest_path: &Path, op: Operation, artifact_dir: &Path, json: bool) -> anyhow::Result<()> {
    let manifest = super::load_manifest(manifest_path)?;
    let resolved = resolve_manifest(&manifest)?;
    let artifact = paths::artifact_path(artifact_dir);
    let gateway = super::gateway(&manifest, resolved.participation);

    let started_at = Utc::now();
    let invocation = gateway
        .run(op, &resolved.descriptor, &artifact)
        .with_context(|| format!("{op} of {} failed", paths::ARTIFACT_JOB))?;

    if json {
        let report = WindowReport {
            operation: op,
            participated: resolved.participation.is_enabled(),
            config_path: gateway.config_path().to_path_buf(),
            artifact_file: artifact,
            invocation,
            started_at,
            finished_at: Utc::now(),
        };
        print_json(&report)?;
    }
    Ok(())
}
