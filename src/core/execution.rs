//! # Test Execution Module / 测试执行模块
//!
//! The contracts a test module and its loader must fulfil, and the single-test
//! execution step that turns one invocation into a classified [`Outcome`].
//!
//! 测试模块及其加载器必须满足的契约，以及将一次调用转换为分类 [`Outcome`] 的单测试执行步骤。

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::core::models::{ExecError, ExecOptions, ExecOutput, LoadProgress, Outcome};
use crate::core::params::OutputFormat;

/// Name of the module every batch is loaded from.
pub const TEST_BATCH_MODULE_NAME: &str = "test_batch";

/// Output destination meaning "write to the log stream" instead of a file.
pub const LOG_TO_STDOUT_SENTINEL: &str = "-";

/// A loaded, executable test module. One instance serves the whole batch, so
/// invocations must never overlap.
pub trait TestModule {
    /// Runs the module. `None` asks it to list its tests.
    fn exec(
        &self,
        options: Option<ExecOptions>,
    ) -> impl Future<Output = Result<ExecOutput, ExecError>>;
}

/// Produces test modules by name.
pub trait ModuleLoader {
    type Module: TestModule;

    fn load_module(
        &self,
        name: &str,
        progress: &dyn Fn(LoadProgress),
    ) -> impl Future<Output = anyhow::Result<Self::Module>>;
}

/// Arguments selecting one test and asking for its log on the output stream.
///
/// 选择单个测试并要求将其日志写入输出流的参数。
pub fn test_invocation(test_name: &str, format: OutputFormat) -> ExecOptions {
    ExecOptions {
        args: vec![
            test_name.to_string(),
            "-o".to_string(),
            format!("{LOG_TO_STDOUT_SENTINEL},{format}"),
        ],
    }
}

/// Executes one test and classifies the result.
///
/// # Arguments
/// * `module` - The loaded module shared by the batch
/// * `test_name` - The test to run
/// * `format` - Passed through to the module untouched
/// * `timeout` - Optional limit; an execution that exceeds it counts as crashed
///
/// # Returns
/// The classified outcome. Failures of this one test never escape as errors.
pub async fn run_test<M: TestModule>(
    module: &M,
    test_name: &str,
    format: OutputFormat,
    timeout: Option<Duration>,
) -> Outcome {
    let execution = module.exec(Some(test_invocation(test_name, format)));

    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, execution).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    test = test_name,
                    timeout_secs = limit.as_secs_f64(),
                    "test execution timed out"
                );
                Err(ExecError::Failed(anyhow::anyhow!(
                    "test '{}' did not finish within {:.2?}",
                    test_name,
                    limit
                )))
            }
        },
        None => execution.await,
    };

    if let Err(e) = &result {
        debug!(test = test_name, error = %e, "test execution did not complete");
    }

    Outcome::classify(result)
}
