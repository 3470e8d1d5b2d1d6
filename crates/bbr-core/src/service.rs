//! Service control through monit, the BOSH process supervisor.

use crate::config::PathsConfig;
use crate::error::Result;
use crate::gateway::{ProcessRunner, ToolRunner};
use crate::lock::ServiceControl;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct MonitService<R = ProcessRunner> {
    runner: R,
    monit_bin: PathBuf,
    service_name: String,
    post_start_hook: PathBuf,
}

impl<R: ToolRunner> MonitService<R> {
    pub fn new(
        runner: R,
        monit_bin: impl Into<PathBuf>,
        service_name: impl Into<String>,
        post_start_hook: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            monit_bin: monit_bin.into(),
            service_name: service_name.into(),
            post_start_hook: post_start_hook.into(),
        }
    }

    pub fn from_paths(runner: R, paths: &PathsConfig) -> Self {
        Self::new(
            runner,
            &paths.monit_bin,
            paths.service_name.clone(),
            &paths.post_start_hook,
        )
    }

    fn monit(&self, action: &str) -> Result<()> {
        info!(service = %self.service_name, "monit {action}");
        let args = [OsString::from(action), OsString::from(&self.service_name)];
        self.runner.run(&self.monit_bin, &args)
    }
}

impl<R: ToolRunner> ServiceControl for MonitService<R> {
    fn stop_service(&self) -> Result<()> {
        self.monit("stop")
    }

    fn start_service(&self) -> Result<()> {
        self.monit("start")
    }

    fn post_start_hook(&self) -> Result<()> {
        info!(hook = %self.post_start_hook.display(), "running post-start hook");
        self.runner.run(&self.post_start_hook, &[])
    }
}
