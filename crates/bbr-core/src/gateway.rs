//! Invocation of the database-backup-restorer.
//!
//! The restorer reads a JSON connection config and reads or writes a single
//! artifact file:
//!
//! ```text
//! <restorer>/bin/backup  --config <config.json> --artifact-file <artifact>
//! <restorer>/bin/restore --config <config.json> --artifact-file <artifact>
//! ```
//!
//! Its stdout, stderr and exit code pass through unchanged.

use crate::config::PathsConfig;
use crate::error::{BbrError, Result};
use crate::participation::Participation;
use crate::resolver::ConnectionDescriptor;
use crate::types::Operation;
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::info;

// ---------------------------------------------------------------------------
// ToolRunner
// ---------------------------------------------------------------------------

pub trait ToolRunner {
    /// Run `program` to completion. A non-zero exit is `ExternalToolFailure`.
    fn run(&self, program: &Path, args: &[OsString]) -> Result<()>;
}

/// Runs the tool as a child process with inherited stdio.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> Result<()> {
        let tool = program.display().to_string();
        // A tool that cannot be found is treated the same as one that fails.
        let resolved = which::which(program).map_err(|e| BbrError::ExternalToolFailure {
            tool: tool.clone(),
            code: None,
            reason: format!("not found or not executable: {e}"),
        })?;

        let status = Command::new(&resolved)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| BbrError::ExternalToolFailure {
                tool: tool.clone(),
                code: None,
                reason: format!("failed to spawn: {e}"),
            })?;

        if !status.success() {
            return Err(BbrError::ExternalToolFailure {
                tool,
                code: status.code(),
                reason: format!("exited with {status}"),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Invocation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Invocation {
    /// Participation is disabled; the tool was not started.
    Skipped,
    Completed { tool: PathBuf },
}

// ---------------------------------------------------------------------------
// CommandGateway
// ---------------------------------------------------------------------------

pub struct CommandGateway<R> {
    runner: R,
    config_path: PathBuf,
    backup_tool: PathBuf,
    restore_tool: PathBuf,
    participation: Participation,
}

impl<R: ToolRunner> CommandGateway<R> {
    pub fn new(
        runner: R,
        config_path: impl Into<PathBuf>,
        backup_tool: impl Into<PathBuf>,
        restore_tool: impl Into<PathBuf>,
        participation: Participation,
    ) -> Self {
        Self {
            runner,
            config_path: config_path.into(),
            backup_tool: backup_tool.into(),
            restore_tool: restore_tool.into(),
            participation,
        }
    }

    pub fn from_paths(runner: R, paths: &PathsConfig, participation: Participation) -> Self {
        Self::new(
            runner,
            paths.config_path(),
            paths.backup_tool(),
            paths.restore_tool(),
            participation,
        )
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn tool_for(&self, op: Operation) -> &Path {
        match op {
            Operation::Backup => &self.backup_tool,
            Operation::Restore => &self.restore_tool,
        }
    }

    /// Write the restorer's config file. Happens whether or not this node
    /// participates.
    pub fn write_config(&self, descriptor: &ConnectionDescriptor) -> Result<&Path> {
        let json = descriptor.to_config_json()?;
        crate::io::atomic_write(&self.config_path, json.as_bytes())?;
        info!(path = %self.config_path.display(), "wrote restorer config");
        Ok(&self.config_path)
    }

    /// Arguments passed to the tool, after the program itself.
    pub fn args(&self, artifact: &Path) -> Vec<OsString> {
        vec![
            OsString::from("--config"),
            self.config_path.clone().into_os_string(),
            OsString::from("--artifact-file"),
            artifact.as_os_str().to_owned(),
        ]
    }

    pub fn run_backup(
        &self,
        descriptor: &ConnectionDescriptor,
        artifact: &Path,
    ) -> Result<Invocation> {
        self.run(Operation::Backup, descriptor, artifact)
    }

    pub fn run_restore(
        &self,
        descriptor: &ConnectionDescriptor,
        artifact: &Path,
    ) -> Result<Invocation> {
        self.run(Operation::Restore, descriptor, artifact)
    }

    pub fn run(
        &self,
        op: Operation,
        descriptor: &ConnectionDescriptor,
        artifact: &Path,
    ) -> Result<Invocation> {
        self.write_config(descriptor)?;

        if !self.participation.is_enabled() {
            info!(%op, "release level backup disabled, not running {op}");
            return Ok(Invocation::Skipped);
        }

        let tool = self.tool_for(op);
        info!(
            %op,
            tool = %tool.display(),
            artifact = %artifact.display(),
            "running {op}"
        );
        self.runner.run(tool, &self.args(artifact))?;
        info!(%op, "{op} completed");
        Ok(Invocation::Completed {
            tool: tool.to_path_buf(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
