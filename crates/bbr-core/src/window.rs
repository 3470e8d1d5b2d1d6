use crate::error::Result;
use crate::gateway::{CommandGateway, Invocation, ToolRunner};
use crate::lock::{LockCoordinator, MarkerStore, ServiceControl, Settle};
use crate::resolver::ConnectionDescriptor;
use crate::types::Operation;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Summary of one backup or restore window.
#[derive(Debug, Clone, Serialize)]
pub struct WindowReport {
    pub operation: Operation,
    pub participated: bool,
    pub config_path: PathBuf,
    pub artifact_file: PathBuf,
    pub invocation: Invocation,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Lock, run the restorer, unlock. Unlock is attempted even when the
/// restorer fails; the restorer never runs if the lock was not established.
pub fn run_window<M, S, T, R>(
    op: Operation,
    lock: &mut LockCoordinator<M, S, T>,
    gateway: &CommandGateway<R>,
    descriptor: &ConnectionDescriptor,
    artifact: &Path,
) -> Result<WindowReport>
where
    M: MarkerStore,
    S: ServiceControl,
    T: Settle,
    R: ToolRunner,
{
    let started_at = Utc::now();
    let invocation = lock.with_lock(op, || gateway.run(op, descriptor, artifact))?;
    Ok(WindowReport {
        operation: op,
        participated: lock.participation().is_enabled(),
        config_path: gateway.config_path().to_path_buf(),
        artifact_file: artifact.to_path_buf(),
        invocation,
        started_at,
        finished_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Manifest, PathsConfig};
    use crate::error::BbrError;
    use crate::lock::{FileMarker, LockState};
    use crate::paths;
    use crate::resolver::resolve_manifest;
    use std::cell::RefCell;
    use std::ffi::OsString;
    use std::rc::Rc;
    use std::time::Duration;
    use tempfile::TempDir;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Recorder {
        log: Log,
        marker: PathBuf,
        fail_tool: bool,
    }

    impl ServiceControl for &Recorder {
        fn stop_service(&self) -> Result<()> {
            self.log.borrow_mut().push("stop".into());
            Ok(())
        }
        fn start_service(&self) -> Result<()> {
            self.log.borrow_mut().push("start".into());
            Ok(())
        }
        fn post_start_hook(&self) -> Result<()> {
            self.log.borrow_mut().push("post-start".into());
            Ok(())
        }
    }

    impl Settle for &Recorder {
        fn settle(&self, delay: Duration) {
            self.log
                .borrow_mut()
                .push(format!("settle {}", delay.as_secs()));
        }
    }

    impl ToolRunner for &Recorder {
        fn run(&self, program: &Path, args: &[OsString]) -> Result<()> {
            // The lock must already be in place when the tool starts.
            let locked = self.marker.exists();
            let name = program.file_name().unwrap().to_string_lossy();
            self.log
                .borrow_mut()
                .push(format!("{name} {} locked={locked}", args.len()));
            if self.fail_tool {
                return Err(BbrError::ExternalToolFailure {
                    tool: name.into_owned(),
                    code: Some(1),
                    reason: "exit status: 1".into(),
                });
            }
            Ok(())
        }
    }

    fn manifest(participate: bool) -> Manifest {
        let yaml = format!(
            r#"
links:
  uaa_db:
    properties:
      release_level_backup: {participate}
      uaadb:
        address: 127.0.0.1
        port: 5432
        db_scheme: postgresql
        databases: [{{name: uaa_db_name, tag: uaa}}]
        roles: [{{name: admin, password: example, tag: admin}}]
"#
        );
        Manifest::from_yaml(&yaml).unwrap()
    }

    fn run(
        dir: &TempDir,
        participate: bool,
        op: Operation,
        fail_tool: bool,
    ) -> (Result<WindowReport>, Vec<String>, PathBuf) {
        let manifest = manifest(participate);
        let resolved = resolve_manifest(&manifest).unwrap();
        let marker = dir.path().join("bbr_limited_mode.lock");
        let recorder = Recorder {
            log: Log::default(),
            marker: marker.clone(),
            fail_tool,
        };
        let paths = PathsConfig {
            job_path: dir.path().join("job"),
            ..Default::default()
        };
        let mut lock = LockCoordinator::open(
            FileMarker::new(&marker),
            &recorder,
            &recorder,
            resolved.participation,
        )
        .unwrap();
        let gateway = CommandGateway::from_paths(&recorder, &paths, resolved.participation);
        let artifact = paths::artifact_path(&dir.path().join("artifacts"));
        let result = run_window(op, &mut lock, &gateway, &resolved.descriptor, &artifact);
        assert_eq!(lock.state(), LockState::Normal);
        let events = recorder.log.borrow().clone();
        (result, events, marker)
    }

    #[test]
    fn backup_window_orders_lock_tool_unlock() {
        let dir = TempDir::new().unwrap();
        let (result, events, marker) = run(&dir, true, Operation::Backup, false);
        let report = result.unwrap();
        assert!(report.participated);
        assert!(report.artifact_file.ends_with("uaadb-artifact-file"));
        assert!(report.finished_at >= report.started_at);
        assert_eq!(events, vec!["settle 6", "backup 4 locked=true", "settle 6"]);
        assert!(!marker.exists());
    }

    #[test]
    fn restore_window_orders_stop_tool_start() {
        let dir = TempDir::new().unwrap();
        let (result, events, _) = run(&dir, true, Operation::Restore, false);
        result.unwrap();
        assert_eq!(
            events,
            vec![
                "stop",
                "settle 15",
                "restore 4 locked=false",
                "start",
                "post-start",
                "settle 40"
            ]
        );
    }

    #[test]
    fn failed_backup_still_unlocks() {
        let dir = TempDir::new().unwrap();
        let (result, events, marker) = run(&dir, true, Operation::Backup, true);
        assert!(matches!(
            result.unwrap_err(),
            BbrError::ExternalToolFailure { .. }
        ));
        assert_eq!(events, vec!["settle 6", "backup 4 locked=true", "settle 6"]);
        assert!(!marker.exists());
    }

    #[test]
    fn not_participating_skips_everything_but_config() {
        let dir = TempDir::new().unwrap();
        for op in [Operation::Backup, Operation::Restore] {
            let (result, events, marker) = run(&dir, false, op, false);
            let report = result.unwrap();
            assert!(!report.participated);
            assert_eq!(report.invocation, Invocation::Skipped);
            assert!(events.is_empty(), "{op}: {events:?}");
            assert!(!marker.exists());
            assert!(report.config_path.exists());
        }
    }
}
