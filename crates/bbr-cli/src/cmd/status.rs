use crate::output::print_json;
use bbr_core::lock::{FileMarker, LockState, MarkerStore};
use chrono::{DateTime, Utc};
use std::path::Path;

pub fn run(manifest_path: &Path, json: bool) -> anyhow::Result<()> {
    let manifest = super::load_manifest(manifest_path)?;
    let marker = FileMarker::new(manifest.marker_path());
    let state = marker.read()?;

    let since: Option<DateTime<Utc>> = match state {
        LockState::Limited => std::fs::metadata(marker.path())
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from),
        _ => None,
    };

    if json {
        let value = serde_json::json!({
            "state": state,
            "marker": marker.path(),
            "since": since,
        });
        print_json(&value)?;
        return Ok(());
    }

    match since {
        Some(ts) => println!(
            "{state} (marker {} since {})",
            marker.path().display(),
            ts.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        None => println!("{state} (marker {})", marker.path().display()),
    }
    Ok(())
}
