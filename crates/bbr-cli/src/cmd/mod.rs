pub mod config;
pub mod lock;
pub mod status;
pub mod tool;
pub mod window;

use anyhow::Context;
use bbr_core::config::Manifest;
use bbr_core::gateway::{CommandGateway, ProcessRunner};
use bbr_core::lock::{FileMarker, LockCoordinator, ThreadSleep};
use bbr_core::participation::Participation;
use bbr_core::service::MonitService;
use std::path::Path;

pub type Coordinator = LockCoordinator<FileMarker, MonitService, ThreadSleep>;

pub fn load_manifest(path: &Path) -> anyhow::Result<Manifest> {
    Manifest::load(path).with_context(|| format!("failed to load manifest {}", path.display()))
}

pub fn coordinator(
    manifest: &Manifest,
    participation: Participation,
) -> anyhow::Result<Coordinator> {
    let coordinator = LockCoordinator::open(
        FileMarker::new(manifest.marker_path()),
        MonitService::from_paths(ProcessRunner, &manifest.paths),
        ThreadSleep,
        participation,
    )?;
    Ok(coordinator)
}

pub fn gateway(manifest: &Manifest, participation: Participation) -> CommandGateway<ProcessRunner> {
    CommandGateway::from_paths(ProcessRunner, &manifest.paths, participation)
}
