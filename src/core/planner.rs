//! # Test Planning Module / 测试计划模块
//!
//! Decides which tests a run executes and in what order: either the single
//! requested test or the list the module reports about itself.
//!
//! 决定一次运行要执行哪些测试以及执行顺序：要么是单个请求的测试，
//! 要么是模块自身报告的测试列表。

use std::collections::HashSet;

use crate::core::orchestrator::SetupError;

/// Separator between names in a module's test listing.
pub const TEST_NAME_SEPARATOR: char = ' ';

/// The ordered list of tests a run will register and execute.
/// 一次运行将注册并执行的有序测试列表。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub tests: Vec<String>,
    /// Whether the list came from the module rather than from the caller.
    pub discovered: bool,
}

impl ExecutionPlan {
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}

/// Splits a module's test listing into names.
///
/// The listing is trimmed and split on every single separator, so an empty
/// listing yields one empty name and doubled separators yield empty names in
/// between. Those names are kept as-is and executed like any other.
pub fn parse_test_names(listing: &str) -> Vec<String> {
    listing
        .trim()
        .split(TEST_NAME_SEPARATOR)
        .map(str::to_string)
        .collect()
}

/// Builds the plan for a run.
///
/// # Arguments
/// * `requested` - The test the caller asked for, if any
/// * `discovered` - The module's own listing, consulted only when nothing was requested
///
/// # Returns
/// The plan, or an error if the listing names the same test twice.
pub fn plan_tests(
    requested: Option<&str>,
    discovered: Option<&str>,
) -> Result<ExecutionPlan, SetupError> {
    let plan = match requested {
        Some(name) => ExecutionPlan {
            tests: vec![name.to_string()],
            discovered: false,
        },
        None => ExecutionPlan {
            tests: parse_test_names(discovered.unwrap_or("")),
            discovered: true,
        },
    };

    let mut seen = HashSet::with_capacity(plan.tests.len());
    if let Some(duplicate) = plan.tests.iter().find(|name| !seen.insert(name.as_str())) {
        return Err(SetupError::DuplicateTest(duplicate.clone()));
    }

    Ok(plan)
}
