//! # File System Operations Module / 文件系统操作模块
//!
//! This module provides utilities for locating test modules on disk.
//!
//! 此模块提供在磁盘上定位测试模块的实用功能。

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};

/// Expands `~` and environment variables in a configured path.
///
/// # Arguments
/// * `raw` - Path as written in the config file or on the command line
///
/// # Returns
/// The expanded path, or an error naming the variable that could not be resolved
pub fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(raw)
        .with_context(|| format!("Failed to expand path: {raw}"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Finds the executable for module `name` inside `dir`.
///
/// # Arguments
/// * `dir` - Directory holding the compiled test modules
/// * `name` - Module name, without any platform extension
///
/// # Returns
/// The canonical path to an executable file
pub fn resolve_executable(dir: &Path, name: &str) -> Result<PathBuf> {
    if !is_directory(dir) {
        bail!("Module directory does not exist: {}", dir.display());
    }

    let candidates = [
        dir.join(name),
        dir.join(format!("{name}{}", std::env::consts::EXE_SUFFIX)),
    ];
    let path = candidates
        .iter()
        .find(|candidate| candidate.is_file())
        .with_context(|| format!("No module named '{}' in {}", name, dir.display()))?;

    if !is_executable(path)? {
        bail!("Module file is not executable: {}", path.display());
    }

    absolute_path(path)
}

/// Checks if a path exists and is a directory.
///
/// # Arguments
/// * `path` - Path to check
///
/// # Returns
/// `true` if the path exists and is a directory, `false` otherwise
pub fn is_directory(path: &Path) -> bool {
    path.exists() && path.is_dir()
}

#[cfg(unix)]
fn is_executable(path: &Path) -> Result<bool> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path)
        .with_context(|| format!("Failed to read metadata of {}", path.display()))?;
    Ok(metadata.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> Result<bool> {
    Ok(path.is_file())
}

/// Gets the absolute path from a potentially relative path.
///
/// # Arguments
/// * `path` - Path to canonicalize
///
/// # Returns
/// Canonicalized absolute path, or an error if the path doesn't exist
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).with_context(|| format!("Failed to resolve path: {}", path.display()))
}
