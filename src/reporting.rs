//! # Reporting Module / 报告模块
//!
//! This module handles the display of a run in the console: live progress
//! driven by the status board's channels, and a final summary.
//!
//! 此模块处理运行在控制台中的显示：由状态板通道驱动的实时进度，以及最终摘要。

pub mod console;

// Re-export common reporting functions
pub use console::{attach_live_progress, print_failure_details, print_summary};
