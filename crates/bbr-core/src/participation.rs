use crate::config::Manifest;
use serde::Serialize;

/// Linked flag wins outright when present; otherwise the local flag decides.
pub fn should_participate(linked: Option<bool>, local: bool) -> bool {
    linked.unwrap_or(local)
}

/// Whether this node takes part in backup and restore.
///
/// Resolved once per invocation and handed to both the lock coordinator and
/// the command gateway so they can never disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Participation(bool);

impl Participation {
    pub fn resolve(linked: Option<bool>, local: bool) -> Self {
        Participation(should_participate(linked, local))
    }

    /// Uses the same link-presence test as connection resolution. A present
    /// link is authoritative; a flag it leaves out means `false`.
    pub fn from_manifest(manifest: &Manifest) -> Self {
        let linked = manifest
            .db_link()
            .map(|link| link.properties.release_level_backup.unwrap_or(false));
        Self::resolve(linked, manifest.properties.release_level_backup)
    }

    pub fn is_enabled(self) -> bool {
        self.0
    }
}

impl From<bool> for Participation {
    fn from(enabled: bool) -> Self {
        Participation(enabled)
    }
}
