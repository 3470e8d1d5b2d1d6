use crate::output::print_json;
use anyhow::Context;
use bbr_core::gateway::Invocation;
use bbr_core::paths;
use bbr_core::resolver::resolve_manifest;
use bbr_core::types::Operation;
use bbr_core::window::run_window;
use clap::ValueEnum;
use std::path::Path;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum WindowOperation {
    Backup,
    Restore,
}

impl From<WindowOperation> for Operation {
    fn from(op: WindowOperation) -> Self {
        match op {
            WindowOperation::Backup => Operation::Backup,
            WindowOperation::Restore => Operation::Restore,
        }
    }
}

/// Lock, run and unlock in one process.
pub fn run(
    manifest_path: &Path,
    operation: WindowOperation,
    artifact_dir: &Path,
    json: bool,
) -> anyhow::Result<()> {
    let op = Operation::from(operation);
    let manifest = super::load_manifest(manifest_path)?;
    // Config errors surface here, before any lock transition.
    let resolved = resolve_manifest(&manifest)?;
    let artifact = paths::artifact_path(artifact_dir);

    let mut lock = super::coordinator(&manifest, resolved.participation)?;
    let gateway = super::gateway(&manifest, resolved.participation);

    let report = run_window(op, &mut lock, &gateway, &resolved.descriptor, &artifact)
        .with_context(|| format!("{op} window failed"))?;

    if json {
        print_json(&report)?;
    } else {
        match &report.invocation {
            Invocation::Skipped => {
                println!("{op}: release level backup disabled, nothing to do")
            }
            Invocation::Completed { .. } => {
                let secs = (report.finished_at - report.started_at).num_seconds();
                println!(
                    "{op}: completed in {secs}s, artifact {}",
                    report.artifact_file.display()
                );
            }
        }
    }
    Ok(())
}
