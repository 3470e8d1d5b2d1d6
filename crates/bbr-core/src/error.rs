use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BbrError {
    #[error("manifest not found: {0}")]
    ManifestNotFound(PathBuf),

    #[error("{what} missing from {source_name} configuration")]
    ConfigMissing {
        what: String,
        source_name: &'static str,
    },

    #[error("unsupported database scheme '{0}': expected postgres, postgresql, mysql or mariadb")]
    UnsupportedScheme(String),

    #[error("lock transition '{transition}' failed: {reason}")]
    LockTransition {
        transition: &'static str,
        reason: String,
    },

    #[error("{tool} failed: {reason}")]
    ExternalToolFailure {
        tool: String,
        /// Exit code of the tool, `None` when it never ran or was killed by a signal.
        code: Option<i32>,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl BbrError {
    pub(crate) fn lock(transition: &'static str, reason: impl ToString) -> Self {
        BbrError::LockTransition {
            transition,
            reason: reason.to_string(),
        }
    }

    /// Exit code the process should terminate with for this error.
    ///
    /// Tool failures mirror the tool's own code; everything else is `1`.
    pub fn exit_code(&self) -> i32 {
        match self {
            BbrError::ExternalToolFailure {
                code: Some(code), ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, BbrError>;
