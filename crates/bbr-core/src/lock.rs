//! Limited-functionality lock coordination.
//!
//! The running UAA polls a marker file: while it exists the service refuses
//! writes, which keeps the database consistent for a backup. Restore is
//! heavier and stops the service outright. Every transition is followed by a
//! fixed settle delay so the service has observed the new mode before the
//! caller moves on.
//!
//! ```text
//! NORMAL -> ENTERING_LIMITED -> LIMITED -> EXITING_LIMITED -> NORMAL
//! ```
//!
//! Transitions are idempotent: entering with a marker already present, or
//! exiting with no marker, is how a run recovers after a crashed predecessor.

use crate::error::{BbrError, Result};
use crate::participation::Participation;
use crate::types::Operation;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Time for the service's config poll to notice the marker.
pub const BACKUP_LOCK_SETTLE: Duration = Duration::from_secs(6);
/// Time for requests started in limited mode to drain.
pub const BACKUP_UNLOCK_SETTLE: Duration = Duration::from_secs(6);
/// Time for monit to finish stopping the service.
pub const RESTORE_LOCK_SETTLE: Duration = Duration::from_secs(15);
/// Time for the service to start and run its post-start hook.
pub const RESTORE_UNLOCK_SETTLE: Duration = Duration::from_secs(40);

// ---------------------------------------------------------------------------
// LockState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    Normal,
    EnteringLimited,
    Limited,
    ExitingLimited,
}

impl LockState {
    pub fn as_str(self) -> &'static str {
        match self {
            LockState::Normal => "normal",
            LockState::EnteringLimited => "entering_limited",
            LockState::Limited => "limited",
            LockState::ExitingLimited => "exiting_limited",
        }
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

/// Durable record of the limited-mode flag.
pub trait MarkerStore {
    /// `Limited` if the marker exists, `Normal` otherwise.
    fn read(&self) -> Result<LockState>;
    /// Create the marker. Already present is not an error.
    fn create(&self) -> Result<()>;
    /// Remove the marker. Already absent is not an error.
    fn remove(&self) -> Result<()>;
}

/// Process supervisor operations used by the restore transitions.
pub trait ServiceControl {
    fn stop_service(&self) -> Result<()>;
    fn start_service(&self) -> Result<()>;
    fn post_start_hook(&self) -> Result<()>;
}

/// Blocking wait after a transition.
pub trait Settle {
    fn settle(&self, delay: Duration);
}

/// Sleeps the calling thread for the full delay.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleep;

impl Settle for ThreadSleep {
    fn settle(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

// ---------------------------------------------------------------------------
// FileMarker
// ---------------------------------------------------------------------------

/// Zero-byte sentinel file.
#[derive(Debug, Clone)]
pub struct FileMarker {
    path: PathBuf,
}

impl FileMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MarkerStore for FileMarker {
    fn read(&self) -> Result<LockState> {
        if self.path.try_exists()? {
            Ok(LockState::Limited)
        } else {
            Ok(LockState::Normal)
        }
    }

    fn create(&self) -> Result<()> {
        crate::io::touch(&self.path)?;
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        crate::io::remove_if_present(&self.path)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LockCoordinator
// ---------------------------------------------------------------------------

pub struct LockCoordinator<M, S, T> {
    marker: M,
    service: S,
    settle: T,
    participation: Participation,
    state: LockState,
}

impl<M: MarkerStore, S: ServiceControl, T: Settle> LockCoordinator<M, S, T> {
    /// Build a coordinator whose starting state is whatever the marker says.
    pub fn open(marker: M, service: S, settle: T, participation: Participation) -> Result<Self> {
        let state = marker
            .read()
            .map_err(|e| BbrError::lock("read_marker", e))?;
        Ok(Self {
            marker,
            service,
            settle,
            participation,
            state,
        })
    }

    pub fn state(&self) -> LockState {
        self.state
    }

    pub fn participation(&self) -> Participation {
        self.participation
    }

    // -----------------------------------------------------------------------
    // Backup transitions
    // -----------------------------------------------------------------------

    /// Put the service in limited mode and wait until it has noticed.
    pub fn enter_limited(&mut self) -> Result<()> {
        if !self.participation.is_enabled() {
            debug!("release level backup disabled, skipping lock");
            return Ok(());
        }
        if self.state == LockState::Limited {
            warn!("limited mode marker already present, a previous window did not unlock");
        }
        let previous = self.begin(LockState::EnteringLimited);
        if let Err(e) = self.marker.create() {
            self.state = previous;
            return Err(BbrError::lock("enter_limited", e));
        }
        info!("enabled limited functionality");
        self.settle.settle(BACKUP_LOCK_SETTLE);
        self.finish(LockState::Limited);
        Ok(())
    }

    /// Remove the limited-mode marker and let in-flight requests drain.
    pub fn exit_unlocked(&mut self) -> Result<()> {
        if !self.participation.is_enabled() {
            debug!("release level backup disabled, skipping unlock");
            return Ok(());
        }
        if self.state == LockState::Normal {
            debug!("no limited mode marker present, unlock is a no-op");
        }
        let previous = self.begin(LockState::ExitingLimited);
        if let Err(e) = self.marker.remove() {
            self.state = previous;
            return Err(BbrError::lock("exit_unlocked", e));
        }
        info!("disabled limited functionality");
        self.settle.settle(BACKUP_UNLOCK_SETTLE);
        self.finish(LockState::Normal);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Restore transitions
    // -----------------------------------------------------------------------

    /// Stop the service entirely before a restore.
    pub fn enter_limited_for_restore(&mut self) -> Result<()> {
        if !self.participation.is_enabled() {
            debug!("release level backup disabled, skipping restore lock");
            return Ok(());
        }
        let previous = self.begin(LockState::EnteringLimited);
        if let Err(e) = self.service.stop_service() {
            self.state = previous;
            return Err(BbrError::lock("stop_service", e));
        }
        info!("stopped service for restore");
        self.settle.settle(RESTORE_LOCK_SETTLE);
        self.finish(LockState::Limited);
        Ok(())
    }

    /// Start the service again and run its post-start hook.
    ///
    /// A marker left behind by an earlier crashed backup is cleared first so
    /// the restarted service does not come up in limited mode.
    pub fn exit_unlocked_for_restore(&mut self) -> Result<()> {
        if !self.participation.is_enabled() {
            debug!("release level backup disabled, skipping restore unlock");
            return Ok(());
        }
        let previous = self.begin(LockState::ExitingLimited);
        let result = self.restart_after_restore();
        if let Err(e) = result {
            self.state = previous;
            return Err(e);
        }
        self.settle.settle(RESTORE_UNLOCK_SETTLE);
        self.finish(LockState::Normal);
        Ok(())
    }

    fn restart_after_restore(&mut self) -> Result<()> {
        let stale = self
            .marker
            .read()
            .map_err(|e| BbrError::lock("read_marker", e))?;
        if stale == LockState::Limited {
            warn!("clearing stale limited mode marker before restart");
            self.marker
                .remove()
                .map_err(|e| BbrError::lock("exit_unlocked_for_restore", e))?;
        }
        self.service
            .start_service()
            .map_err(|e| BbrError::lock("start_service", e))?;
        info!("started service after restore");
        self.service
            .post_start_hook()
            .map_err(|e| BbrError::lock("post_start_hook", e))?;
        info!("ran post-start hook");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Scoped windows
    // -----------------------------------------------------------------------

    pub fn enter(&mut self, op: Operation) -> Result<()> {
        match op {
            Operation::Backup => self.enter_limited(),
            Operation::Restore => self.enter_limited_for_restore(),
        }
    }

    pub fn exit(&mut self, op: Operation) -> Result<()> {
        match op {
            Operation::Backup => self.exit_unlocked(),
            Operation::Restore => self.exit_unlocked_for_restore(),
        }
    }

    /// Run `body` inside a lock window for `op`.
    ///
    /// `body` is never called if the lock could not be established. Once it
    /// has been, the matching exit runs on every path. A failure from `body`
    /// takes precedence over a failure to unlock.
    pub fn with_lock<R>(&mut self, op: Operation, body: impl FnOnce() -> Result<R>) -> Result<R> {
        self.enter(op)?;
        let outcome = body();
        let unlocked = self.exit(op);
        match (outcome, unlocked) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => {
                warn!(%op, "unlocked after failed {op}");
                Err(e)
            }
            (Err(e), Err(unlock_err)) => {
                warn!(%op, error = %unlock_err, "unlock after failed {op} also failed");
                Err(e)
            }
        }
    }

    fn begin(&mut self, to: LockState) -> LockState {
        let previous = self.state;
        debug!(from = %previous, to = %to, "lock transition");
        self.state = to;
        previous
    }

    fn finish(&mut self, to: LockState) {
        debug!(from = %self.state, to = %to, "lock transition");
        self.state = to;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
