//! # Infrastructure Module / 基础设施模块
//!
//! This module provides infrastructure services for the runner,
//! including process execution, module loading, file system helpers and i18n support.
//!
//! 此模块为运行器提供基础设施服务，
//! 包括进程执行、模块加载、文件系统辅助功能和国际化支持。

pub mod command;
pub mod fs;
pub mod module;

// Re-export i18n functions for easier access
pub use rust_i18n::t;
