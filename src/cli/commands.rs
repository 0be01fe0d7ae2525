//! # CLI Commands / 命令行命令
//!
//! `run` executes a batch, `list` shows what a module provides. Both resolve
//! their settings the same way: config file first, then command-line flags.
//!
//! `run` 执行一批测试，`list` 显示模块提供的测试。两者以相同方式解析设置：
//! 先读取配置文件，然后应用命令行标志。

use anyhow::Result;
use std::path::PathBuf;

use crate::core::config::RunnerConfig;
use crate::infra::module::ProcessModuleLoader;

pub mod list;
pub mod run;

/// Flags that select the module to load.
#[derive(Debug, Clone, Default)]
pub struct ModuleOptions {
    pub config: Option<PathBuf>,
    pub module_dir: Option<String>,
    pub module_name: Option<String>,
}

impl ModuleOptions {
    /// Loads the config file, if one was given, and applies the flag overrides.
    pub fn resolve_config(&self) -> Result<RunnerConfig> {
        let mut config = match &self.config {
            Some(path) => RunnerConfig::load(path)?,
            None => RunnerConfig::default(),
        };
        if let Some(dir) = &self.module_dir {
            config.module_dir = dir.clone();
        }
        if let Some(name) = &self.module_name {
            config.module_name = name.clone();
        }
        Ok(config)
    }
}

/// Builds the loader for the configured module directory. Expansion errors
/// surface when the module is loaded, so they end up on the board.
pub fn loader_for(config: &RunnerConfig) -> ProcessModuleLoader {
    ProcessModuleLoader::from_configured_dir(config.module_dir.clone())
}
