//! # Orchestrator Module / 编排模块
//!
//! Drives one run from module load to completion: plans the tests, registers
//! them, executes them strictly one after another and records every
//! transition on the status board.
//!
//! 驱动一次运行从模块加载到完成：规划测试、注册测试、严格依次执行，
//! 并将每次状态转换记录到状态板上。

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::core::board::{BoardError, BoardWriter};
use crate::core::execution::{ModuleLoader, TEST_BATCH_MODULE_NAME, TestModule, run_test};
use crate::core::models::{ExecError, LoadProgress, RunStatus, TestStatus};
use crate::core::params::{OutputFormat, RunParams};
use crate::core::planner::{self, ExecutionPlan};

/// Failures that stop a run before any test executes.
/// 在任何测试执行之前就终止运行的失败。
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("The testName parameter is incorrect")]
    BadTestName,
    #[error("Bad file format: {0}")]
    BadOutputFormat(String),
    #[error("Failed to load module '{name}': {source:#}")]
    ModuleLoad {
        name: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("Failed to list the tests of module '{name}': {source}")]
    Enumeration {
        name: String,
        #[source]
        source: ExecError,
    },
    #[error("Test '{0}' is listed more than once")]
    DuplicateTest(String),
    #[error(transparent)]
    Board(#[from] BoardError),
}

type ProgressCallback = Box<dyn Fn(&LoadProgress)>;

/// Runs a batch of tests against a single module and reports through the
/// board writer it owns.
pub struct Orchestrator<L: ModuleLoader> {
    loader: L,
    board: BoardWriter,
    module_name: String,
    timeout: Option<Duration>,
    on_load_progress: Option<ProgressCallback>,
}

impl<L: ModuleLoader> Orchestrator<L> {
    /// Takes ownership of the board's only writer.
    pub fn new(loader: L, board: BoardWriter) -> Self {
        Self {
            loader,
            board,
            module_name: TEST_BATCH_MODULE_NAME.to_string(),
            timeout: None,
            on_load_progress: None,
        }
    }

    pub fn with_module_name(mut self, name: impl Into<String>) -> Self {
        self.module_name = name.into();
        self
    }

    /// Limits every single test execution. Without a limit a hanging test
    /// stalls the batch.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_load_progress(mut self, callback: impl Fn(&LoadProgress) + 'static) -> Self {
        self.on_load_progress = Some(Box::new(callback));
        self
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Runs the batch for already validated parameters, or reports the
    /// validation failure without running anything.
    pub async fn start(&self, params: Result<RunParams, SetupError>) -> RunStatus {
        if let Some(status) = self.finished() {
            return status;
        }
        match params {
            Ok(params) => self.run(params.test_name.as_deref(), params.output_format).await,
            Err(e) => {
                self.fail(&e);
                RunStatus::Error
            }
        }
    }

    /// Runs `test_name`, or every test the module lists when it is `None`.
    ///
    /// Tests that end in `Error` or `Crashed` still leave the run `Completed`;
    /// only a setup failure ends it in `Error`.
    pub async fn run(&self, test_name: Option<&str>, format: OutputFormat) -> RunStatus {
        if let Some(status) = self.finished() {
            return status;
        }
        match self.do_run(test_name, format).await {
            Ok(()) => {
                if let Err(e) = self.board.set_runner_status(RunStatus::Completed) {
                    warn!(error = %e, "could not mark the run as completed");
                }
                info!("test run completed");
                RunStatus::Completed
            }
            Err(e) => {
                self.fail(&e);
                RunStatus::Error
            }
        }
    }

    /// A board carries exactly one run. Once that run has finished, further
    /// starts leave it untouched and report its final status.
    fn finished(&self) -> Option<RunStatus> {
        let status = self.board.run_status();
        if status.is_terminal() {
            warn!(%status, "the board already holds a finished run; not starting another");
            return Some(status);
        }
        None
    }

    fn fail(&self, error: &SetupError) {
        warn!(error = %error, "test run failed during setup");
        self.board.set_runner_error(error.to_string());
    }

    async fn do_run(
        &self,
        test_name: Option<&str>,
        format: OutputFormat,
    ) -> Result<(), SetupError> {
        let module = self.load().await?;

        let plan = match test_name {
            Some(name) => planner::plan_tests(Some(name), None)?,
            None => {
                let listing = list_tests(&module, &self.module_name).await?;
                planner::plan_tests(None, Some(&listing))?
            }
        };
        info!(tests = plan.len(), discovered = plan.discovered, %format, "starting test batch");

        self.register(&plan)?;

        for name in &plan.tests {
            self.board.set_test_status(name, TestStatus::Running)?;

            let outcome = run_test(&module, name, format, self.timeout).await;
            debug!(test = %name, status = %outcome.status(), "test finished");

            let (status, exit_code, text_output) = outcome.into_record();
            self.board
                .set_test_result_data(name, status, exit_code, text_output)?;
        }

        Ok(())
    }

    async fn load(&self) -> Result<L::Module, SetupError> {
        let progress = |event: LoadProgress| {
            debug!(?event, "module load progress");
            if let Some(callback) = &self.on_load_progress {
                callback(&event);
            }
        };
        self.loader
            .load_module(&self.module_name, &progress)
            .await
            .map_err(|source| SetupError::ModuleLoad {
                name: self.module_name.clone(),
                source,
            })
    }

    fn register(&self, plan: &ExecutionPlan) -> Result<(), SetupError> {
        for name in &plan.tests {
            self.board.register_test(name)?;
        }
        Ok(())
    }
}

/// Asks `module` for its tests by running it without arguments.
/// Returns the raw listing; the exit code of the listing run is not checked.
///
/// 通过不带参数运行 `module` 来获取其测试列表。
/// 返回原始列表；不检查列表运行的退出码。
pub async fn list_tests<M: TestModule>(
    module: &M,
    module_name: &str,
) -> Result<String, SetupError> {
    let output = module
        .exec(None)
        .await
        .map_err(|source| SetupError::Enumeration {
            name: module_name.to_string(),
            source,
        })?;
    debug!(exit_code = output.exit_code, "module listed its tests");
    Ok(output.stdout)
}

/// Loads the module named `module_name` and returns the names it lists.
pub async fn discover_tests<L: ModuleLoader>(
    loader: &L,
    module_name: &str,
) -> Result<Vec<String>, SetupError> {
    let module = loader
        .load_module(module_name, &|event: LoadProgress| {
            debug!(?event, "module load progress")
        })
        .await
        .map_err(|source| SetupError::ModuleLoad {
            name: module_name.to_string(),
            source,
        })?;
    let listing = list_tests(&module, module_name).await?;
    Ok(planner::parse_test_names(&listing))
}
