use crate::output::{print_json, print_kv};
use bbr_core::config::WarnLevel;
use bbr_core::participation::Participation;
use bbr_core::resolver::resolve_manifest;
use clap::Subcommand;
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Write the restorer's config.json from the resolved source
    Render,

    /// Show the resolved source, participation and connection (password hidden)
    Show,

    /// Validate the manifest for common mistakes
    Validate,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(manifest_path: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Render => render(manifest_path, json),
        ConfigSubcommand::Show => show(manifest_path, json),
        ConfigSubcommand::Validate => validate(manifest_path, json),
    }
}

// ---------------------------------------------------------------------------
// render
// ---------------------------------------------------------------------------

fn render(manifest_path: &Path, json: bool) -> anyhow::Result<()> {
    let manifest = super::load_manifest(manifest_path)?;
    let resolved = resolve_manifest(&manifest)?;
    let gateway = super::gateway(&manifest, resolved.participation);
    let path = gateway.write_config(&resolved.descriptor)?;

    if json {
        print_json(&serde_json::json!({ "config_path": path }))?;
    } else {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(manifest_path: &Path, json: bool) -> anyhow::Result<()> {
    let manifest = super::load_manifest(manifest_path)?;
    let resolved = resolve_manifest(&manifest)?;
    let gateway = super::gateway(&manifest, resolved.participation);

    if json {
        let value = serde_json::json!({
            "source": resolved.source,
            "participates": resolved.participation,
            "marker": manifest.marker_path(),
            "config_path": gateway.config_path(),
            "connection": resolved.descriptor.redacted(),
        });
        print_json(&value)?;
        return Ok(());
    }

    let d = &resolved.descriptor;
    print_kv(&[
        ("source", resolved.source.as_str().to_string()),
        (
            "participates",
            participation_label(resolved.participation).to_string(),
        ),
        ("marker", manifest.marker_path().display().to_string()),
        ("config", gateway.config_path().display().to_string()),
        ("adapter", d.adapter.to_string()),
        ("host", d.host.clone()),
        ("port", d.port.to_string()),
        ("database", d.database.clone()),
        ("username", d.username.clone()),
        ("password", "<redacted>".to_string()),
    ]);
    Ok(())
}

fn participation_label(participation: Participation) -> &'static str {
    if participation.is_enabled() {
        "yes"
    } else {
        "no (release_level_backup is false)"
    }
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(manifest_path: &Path, json: bool) -> anyhow::Result<()> {
    let manifest = super::load_manifest(manifest_path)?;
    let warnings = manifest.validate();

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Manifest is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    let has_errors = warnings.iter().any(|w| w.level == WarnLevel::Error);
    if has_errors {
        anyhow::bail!("manifest validation found errors");
    }

    Ok(())
}
