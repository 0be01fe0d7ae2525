//! # Core Module / 核心模块
//!
//! This module contains the core functionality of the batched test runner:
//! data models, the observable status board, test planning and the
//! orchestrator that drives a run.
//!
//! 此模块包含批量测试运行器的核心功能：
//! 数据模型、可观察的状态板、测试计划以及驱动运行的编排器。

pub mod board;
pub mod config;
pub mod events;
pub mod execution;
pub mod models;
pub mod orchestrator;
pub mod params;
pub mod planner;

// Re-exports
pub use board::{BoardWriter, StatusBoard};
pub use models::{RunStatus, TestResult, TestStatus};
pub use orchestrator::Orchestrator;
