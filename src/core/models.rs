//! # Data Models Module / 数据模型模块
//!
//! This module defines the core data structures shared by the status board and
//! the orchestrator: per-test and run-level statuses, the per-test result
//! record, and the classified outcome of a single module execution.
//!
//! 此模块定义了状态板和编排器共享的核心数据结构：
//! 测试级和运行级状态、单个测试的结果记录，以及单次模块执行的分类结果。

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::infra::t;

/// The status of a single test within a run.
/// Statuses only move forward: `Pending` → `Running` → one of the terminal ones.
///
/// 运行中单个测试的状态。
/// 状态只能向前推进：`Pending` → `Running` → 某个终止状态。
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum TestStatus {
    /// Registered, not started yet. / 已注册，尚未开始。
    Pending,
    /// Currently executing. / 正在执行。
    Running,
    /// The module ran the test and reported a non-negative exit code.
    /// 模块运行了测试并报告了非负退出码。
    Completed,
    /// The module reported a negative exit code, i.e. it rejected the invocation.
    /// 模块报告了负退出码，即拒绝了此次调用。
    Error,
    /// The execution environment failed to complete the invocation.
    /// 执行环境未能完成此次调用。
    Crashed,
}

impl TestStatus {
    /// Position along the lifecycle. All terminal statuses share the last step.
    fn step(self) -> u8 {
        match self {
            TestStatus::Pending => 0,
            TestStatus::Running => 1,
            TestStatus::Completed | TestStatus::Error | TestStatus::Crashed => 2,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.step() == 2
    }

    /// Whether `self` → `next` is a forward move. Staying put is not a transition.
    pub fn can_transition_to(self, next: TestStatus) -> bool {
        self != next && next.step() > self.step()
    }

    /// Localized label for console output.
    /// 用于控制台输出的本地化标签。
    pub fn label(self, locale: &str) -> String {
        match self {
            TestStatus::Pending => t!("status.pending", locale = locale).to_string(),
            TestStatus::Running => t!("status.running", locale = locale).to_string(),
            TestStatus::Completed => t!("status.completed", locale = locale).to_string(),
            TestStatus::Error => t!("status.error", locale = locale).to_string(),
            TestStatus::Crashed => t!("status.crashed", locale = locale).to_string(),
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Overall status of a run. / 整体运行状态。
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum RunStatus {
    Running,
    Completed,
    Error,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The recorded state of one test.
/// `exit_code` and `text_output` stay `None` until the test has finished.
///
/// 单个测试的记录状态。
/// 在测试结束之前，`exit_code` 和 `text_output` 保持为 `None`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub status: TestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_output: Option<String>,
}

impl TestResult {
    pub fn pending() -> Self {
        Self {
            status: TestStatus::Pending,
            exit_code: None,
            text_output: None,
        }
    }

    /// A finished test that passed every check: it completed and exited with 0.
    pub fn is_success(&self) -> bool {
        self.status == TestStatus::Completed && self.exit_code == Some(0)
    }

    /// Gets the output of the test. Returns an empty string if there's no output.
    /// 获取测试的输出。如果没有输出，则返回空字符串。
    pub fn output(&self) -> &str {
        self.text_output.as_deref().unwrap_or("")
    }
}

/// What a module hands back when an invocation runs to completion.
/// 当一次调用正常结束时模块返回的内容。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecOutput {
    pub exit_code: i32,
    pub stdout: String,
}

/// Options for a single module invocation.
/// 单次模块调用的选项。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecOptions {
    pub args: Vec<String>,
}

/// The ways an invocation can fail to run to completion.
/// 调用未能正常结束的方式。
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// The environment aborted the invocation; whatever was printed so far is kept.
    #[error("execution aborted: {reason}")]
    Aborted { reason: String, stdout: String },
    /// Any other failure. No output is available.
    #[error("execution failed: {0}")]
    Failed(#[from] anyhow::Error),
}

/// The classified outcome of executing one test.
/// 执行单个测试后的分类结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The module ran the test; the exit code is non-negative.
    Completed { exit_code: i32, output: String },
    /// The module reported a negative exit code.
    ProgramFailure { exit_code: i32, output: String },
    /// The environment could not complete the invocation.
    EnvironmentFailure { partial_output: Option<String> },
}

impl Outcome {
    /// Folds the raw result of an execution into one of the three outcomes.
    pub fn classify(result: Result<ExecOutput, ExecError>) -> Self {
        match result {
            Ok(ExecOutput { exit_code, stdout }) if exit_code < 0 => Outcome::ProgramFailure {
                exit_code,
                output: stdout,
            },
            Ok(ExecOutput { exit_code, stdout }) => Outcome::Completed {
                exit_code,
                output: stdout,
            },
            Err(ExecError::Aborted { stdout, .. }) => Outcome::EnvironmentFailure {
                partial_output: Some(stdout),
            },
            Err(ExecError::Failed(_)) => Outcome::EnvironmentFailure {
                partial_output: None,
            },
        }
    }

    pub fn status(&self) -> TestStatus {
        match self {
            Outcome::Completed { .. } => TestStatus::Completed,
            Outcome::ProgramFailure { .. } => TestStatus::Error,
            Outcome::EnvironmentFailure { .. } => TestStatus::Crashed,
        }
    }

    /// Splits the outcome into the `(status, exit_code, text_output)` triple
    /// recorded on the board.
    pub fn into_record(self) -> (TestStatus, Option<i32>, Option<String>) {
        let status = self.status();
        match self {
            Outcome::Completed { exit_code, output }
            | Outcome::ProgramFailure { exit_code, output } => {
                (status, Some(exit_code), Some(output))
            }
            Outcome::EnvironmentFailure { partial_output } => (status, None, partial_output),
        }
    }
}

/// Progress notifications emitted while a module is being loaded.
/// 加载模块时发出的进度通知。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadProgress {
    /// Looking up the module's resources.
    Resolving { name: String },
    /// The module is ready to execute.
    Ready { name: String },
}
