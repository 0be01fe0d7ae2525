//! # Batched Test Runner Library / 批量测试运行器库
//!
//! This library runs a batch of tests provided by one compiled test module,
//! strictly one after another, and publishes run-level and per-test status
//! through an observable status board.
//!
//! 此库依次运行由单个已编译测试模块提供的一批测试，
//! 并通过可观察的状态板发布运行级和测试级状态。
//!
//! ## Modules / 模块
//!
//! - `core` - Data models, status board, planning and the orchestrator
//! - `infra` - Process execution, module loading and file system helpers
//! - `reporting` - Console progress and summaries
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 数据模型、状态板、计划和编排器
//! - `infra` - 进程执行、模块加载和文件系统辅助功能
//! - `reporting` - 控制台进度和摘要
//! - `cli` - 命令行接口和命令

pub mod cli;
pub mod core;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use self::core::board;
pub use self::core::models;
pub use self::core::orchestrator;

/// Picks the locale for the application's messages.
///
/// An explicit language wins. Otherwise the system locale is matched in full
/// (e.g. "zh-CN"), then by its language code (e.g. "en" from "en-US"), and
/// finally falls back to "en".
pub fn resolve_locale(explicit: Option<&str>) -> String {
    let locale = explicit
        .map(str::to_string)
        .or_else(sys_locale::get_locale)
        .unwrap_or_else(|| "en".to_string());
    let available_locales = rust_i18n::available_locales!();

    if available_locales.contains(&locale.as_str()) {
        return locale;
    }
    locale
        .split('-')
        .next()
        .filter(|lang_code| available_locales.contains(lang_code))
        .unwrap_or("en")
        .to_string()
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
