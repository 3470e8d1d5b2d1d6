use crate::output::print_json;
use bbr_core::lock::LockState;
use bbr_core::participation::Participation;
use bbr_core::resolver::resolve_manifest;
use std::path::Path;

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

// Lock scripts resolve the full configuration first so a node whose backup
// would fail on bad config is never put into limited mode. Unlock scripts
// only need participation, so they still work for crash recovery when the
// connection config is broken.

pub fn pre_backup_lock(manifest_path: &Path, json: bool) -> anyhow::Result<()> {
    let manifest = super::load_manifest(manifest_path)?;
    let resolved = resolve_manifest(&manifest)?;
    let mut lock = super::coordinator(&manifest, resolved.participation)?;
    lock.enter_limited()?;
    report("pre-backup-lock", resolved.participation, lock.state(), json)
}

pub fn post_backup_unlock(manifest_path: &Path, json: bool) -> anyhow::Result<()> {
    let manifest = super::load_manifest(manifest_path)?;
    let participation = Participation::from_manifest(&manifest);
    let mut lock = super::coordinator(&manifest, participation)?;
    lock.exit_unlocked()?;
    report("post-backup-unlock", participation, lock.state(), json)
}

pub fn pre_restore_lock(manifest_path: &Path, json: bool) -> anyhow::Result<()> {
    let manifest = super::load_manifest(manifest_path)?;
    let resolved = resolve_manifest(&manifest)?;
    let mut lock = super::coordinator(&manifest, resolved.participation)?;
    lock.enter_limited_for_restore()?;
    report("pre-restore-lock", resolved.participation, lock.state(), json)
}

pub fn post_restore_unlock(manifest_path: &Path, json: bool) -> anyhow::Result<()> {
    let manifest = super::load_manifest(manifest_path)?;
    let participation = Participation::from_manifest(&manifest);
    let mut lock = super::coordinator(&manifest, participation)?;
    lock.exit_unlocked_for_restore()?;
    report("post-restore-unlock", participation, lock.state(), json)
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn report(
    script: &str,
    participation: Participation,
    state: LockState,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        let value = serde_json::json!({
            "script": script,
            "participated": participation,
            "state": state,
        });
        print_json(&value)?;
    } else if !participation.is_enabled() {
        println!("{script}: release level backup disabled, nothing to do");
    } else {
        println!("{script}: {state}");
    }
    Ok(())
}
