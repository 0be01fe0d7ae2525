//! # Process Module Loader / 进程模块加载器
//!
//! The default module backend: a test module is a compiled executable found
//! in a module directory, and every `exec` spawns it once.
//!
//! 默认的模块后端：测试模块是模块目录中的一个已编译可执行文件，每次 `exec` 都会派生一次该进程。

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::execution::{ModuleLoader, TestModule};
use crate::core::models::{ExecError, ExecOptions, ExecOutput, LoadProgress};
use crate::infra::command::spawn_and_capture;
use crate::infra::fs;

/// Where the module directory comes from.
#[derive(Debug, Clone)]
enum ModuleDir {
    Resolved(PathBuf),
    /// As configured; `~` and `$VARS` are expanded when a module is loaded.
    Configured(String),
}

/// Loads modules from executables in a single directory.
#[derive(Debug, Clone)]
pub struct ProcessModuleLoader {
    module_dir: ModuleDir,
}

impl ProcessModuleLoader {
    pub fn new(module_dir: impl Into<PathBuf>) -> Self {
        Self {
            module_dir: ModuleDir::Resolved(module_dir.into()),
        }
    }

    /// A loader for a directory as written in the config file or on the
    /// command line. A directory that cannot be expanded fails the load.
    pub fn from_configured_dir(raw: impl Into<String>) -> Self {
        Self {
            module_dir: ModuleDir::Configured(raw.into()),
        }
    }

    fn resolve_dir(&self) -> Result<PathBuf> {
        match &self.module_dir {
            ModuleDir::Resolved(dir) => Ok(dir.clone()),
            ModuleDir::Configured(raw) => fs::expand_path(raw),
        }
    }
}

impl ModuleLoader for ProcessModuleLoader {
    type Module = ProcessModule;

    async fn load_module(
        &self,
        name: &str,
        progress: &dyn Fn(LoadProgress),
    ) -> Result<ProcessModule> {
        progress(LoadProgress::Resolving {
            name: name.to_string(),
        });
        let module_dir = self.resolve_dir()?;
        let executable = fs::resolve_executable(&module_dir, name)
            .with_context(|| format!("Module '{}' is not available", name))?;
        debug!(path = %executable.display(), "resolved test module");
        progress(LoadProgress::Ready {
            name: name.to_string(),
        });
        Ok(ProcessModule {
            executable,
            working_dir: module_dir,
        })
    }
}

/// A test module backed by an executable on disk.
#[derive(Debug, Clone)]
pub struct ProcessModule {
    executable: PathBuf,
    working_dir: PathBuf,
}

impl ProcessModule {
    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

impl TestModule for ProcessModule {
    async fn exec(&self, options: Option<ExecOptions>) -> Result<ExecOutput, ExecError> {
        let args = options.map(|o| o.args).unwrap_or_default();

        let mut cmd = tokio::process::Command::new(&self.executable);
        cmd.args(&args)
            .kill_on_drop(true)
            .current_dir(&self.working_dir);

        let (status_res, output) = spawn_and_capture(cmd).await;
        if !output.stderr.trim().is_empty() {
            debug!(?args, stderr = %output.stderr.trim(), "module wrote to stderr");
        }

        let status = status_res
            .with_context(|| format!("Failed to run '{}'", self.executable.display()))?;

        match status.code() {
            Some(exit_code) => Ok(ExecOutput {
                exit_code,
                stdout: output.stdout,
            }),
            None => Err(ExecError::Aborted {
                reason: termination_reason(&status),
                stdout: output.stdout,
            }),
        }
    }
}

#[cfg(unix)]
fn termination_reason(status: &std::process::ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;

    match status.signal() {
        Some(signal) => format!("terminated by signal {}", signal),
        None => format!("terminated abnormally ({})", status),
    }
}

#[cfg(not(unix))]
fn termination_reason(status: &std::process::ExitStatus) -> String {
    format!("terminated abnormally ({})", status)
}
