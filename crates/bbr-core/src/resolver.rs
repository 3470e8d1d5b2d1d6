//! Connection resolution.
//!
//! A node can learn where the UAA database lives from two places: the
//! `uaa_db` link or its own `uaadb` properties. Exactly one of them is used,
//! in full. Fields are never merged across sources, so credentials always
//! belong to the host they were issued for.

use crate::config::{Manifest, RawConfig, TagConfig};
use crate::error::{BbrError, Result};
use crate::participation::Participation;
use crate::types::Adapter;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// The authoritative source, selected once per invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Source<'a> {
    Linked(&'a RawConfig),
    Local(&'a RawConfig),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Linked,
    Local,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Linked => "linked",
            SourceKind::Local => "local",
        }
    }
}

impl<'a> Source<'a> {
    pub fn select(linked: Option<&'a RawConfig>, local: &'a RawConfig) -> Self {
        match linked {
            Some(raw) => Source::Linked(raw),
            None => Source::Local(local),
        }
    }

    /// Select from a manifest. A present link is authoritative even when it
    /// lacks connection info; that is an error, not a reason to fall back.
    pub fn from_manifest(manifest: &'a Manifest) -> Result<Self> {
        match manifest.db_link() {
            Some(link) => link
                .properties
                .uaadb
                .as_ref()
                .map(Source::Linked)
                .ok_or_else(|| BbrError::ConfigMissing {
                    what: "uaadb section".to_string(),
                    source_name: "linked",
                }),
            None => manifest
                .properties
                .uaadb
                .as_ref()
                .map(Source::Local)
                .ok_or_else(|| BbrError::ConfigMissing {
                    what: "uaadb section".to_string(),
                    source_name: "local",
                }),
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            Source::Linked(_) => SourceKind::Linked,
            Source::Local(_) => SourceKind::Local,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    pub fn raw(&self) -> &'a RawConfig {
        match self {
            Source::Linked(raw) | Source::Local(raw) => raw,
        }
    }
}

// ---------------------------------------------------------------------------
// ConnectionDescriptor
// ---------------------------------------------------------------------------

/// Effective connection info. Field order is the order of the generated
/// config file.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionDescriptor {
    pub adapter: Adapter,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl ConnectionDescriptor {
    /// Pretty JSON payload consumed by the restorer.
    pub fn to_config_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Same shape with the password masked, for display.
    pub fn redacted(&self) -> serde_json::Value {
        serde_json::json!({
            "adapter": self.adapter,
            "host": self.host,
            "port": self.port,
            "database": self.database,
            "username": self.username,
            "password": "<redacted>",
        })
    }
}

impl std::fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("adapter", &self.adapter)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

pub fn resolve(
    linked: Option<&RawConfig>,
    local: &RawConfig,
    tags: &TagConfig,
) -> Result<ConnectionDescriptor> {
    resolve_source(Source::select(linked, local), tags)
}

pub fn resolve_source(source: Source<'_>, tags: &TagConfig) -> Result<ConnectionDescriptor> {
    let raw = source.raw();
    let adapter = Adapter::from_scheme(&raw.db_scheme)?;

    let database = raw
        .databases
        .iter()
        .find(|d| d.tag == tags.database)
        .ok_or_else(|| BbrError::ConfigMissing {
            what: format!("database tagged '{}'", tags.database),
            source_name: source.name(),
        })?;
    let role = raw
        .roles
        .iter()
        .find(|r| r.tag == tags.role)
        .ok_or_else(|| BbrError::ConfigMissing {
            what: format!("role tagged '{}'", tags.role),
            source_name: source.name(),
        })?;

    Ok(ConnectionDescriptor {
        adapter,
        host: raw.address.clone(),
        port: raw.port,
        database: database.name.clone(),
        username: role.name.clone(),
        password: role.password.clone(),
    })
}

/// Everything one invocation needs to know about this node.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub source: SourceKind,
    pub participation: Participation,
    pub descriptor: ConnectionDescriptor,
}

pub fn resolve_manifest(manifest: &Manifest) -> Result<Resolved> {
    let source = Source::from_manifest(manifest)?;
    let descriptor = resolve_source(source, &manifest.tags)?;
    Ok(Resolved {
        source: source.kind(),
        participation: Participation::from_manifest(manifest),
        descriptor,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
