use crate::error::{BbrError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// Canonical database family identifier handed to the restorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Adapter {
    Postgres,
    Mysql,
}

impl Adapter {
    pub fn all() -> &'static [Adapter] {
        &[Adapter::Postgres, Adapter::Mysql]
    }

    /// Normalize a scheme string, including family aliases, to its adapter.
    pub fn from_scheme(scheme: &str) -> Result<Adapter> {
        match scheme.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Adapter::Postgres),
            "mysql" | "mariadb" => Ok(Adapter::Mysql),
            _ => Err(BbrError::UnsupportedScheme(scheme.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Adapter::Postgres => "postgres",
            Adapter::Mysql => "mysql",
        }
    }
}

impl fmt::Display for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Backup,
    Restore,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Backup => "backup",
            Operation::Restore => "restore",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
