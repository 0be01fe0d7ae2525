use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::core::execution::TEST_BATCH_MODULE_NAME;

/// Runner settings, loaded from an optional TOML file.
/// Every field can be overridden on the command line.
///
/// 运行器设置，从可选的 TOML 文件加载。
/// 每个字段都可以在命令行上覆盖。
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    /// The language for the runner's output messages (e.g., "en", "zh-CN").
    /// 运行器输出消息的语言（例如 "en", "zh-CN"）。
    #[serde(default)]
    pub language: Option<String>,

    /// Directory holding the compiled test modules. `~` and `$VARS` are expanded.
    /// 存放已编译测试模块的目录。会展开 `~` 和 `$VARS`。
    #[serde(default = "default_module_dir")]
    pub module_dir: String,

    /// Name of the module to load from `module_dir`.
    /// 要从 `module_dir` 加载的模块名称。
    #[serde(default = "default_module_name")]
    pub module_name: String,

    /// Output format requested from every test. Validated before the run starts.
    /// 向每个测试请求的输出格式。在运行开始前进行校验。
    #[serde(default)]
    pub output_format: Option<String>,

    /// Run only this test instead of every test the module lists.
    /// 仅运行此测试，而不是模块列出的所有测试。
    #[serde(default)]
    pub test_name: Option<String>,

    /// Optional limit in seconds for a single test execution. A test that
    /// runs longer is recorded as crashed.
    /// 单个测试执行的可选时间限制（秒）。超时的测试被记录为崩溃。
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            language: None,
            module_dir: default_module_dir(),
            module_name: default_module_name(),
            output_format: None,
            test_name: None,
            timeout_secs: None,
        }
    }
}

impl RunnerConfig {
    /// Reads and parses a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn default_module_dir() -> String {
    ".".to_string()
}

fn default_module_name() -> String {
    TEST_BATCH_MODULE_NAME.to_string()
}
