//! # Run Parameters Module / 运行参数模块
//!
//! Validation of the two run inputs: the optional test name and the output
//! format handed through to the executed module. Parameters can come from
//! command-line flags, the config file or a page-style query string.
//!
//! 两个运行输入的校验：可选的测试名称和传递给被执行模块的输出格式。
//! 参数可以来自命令行标志、配置文件或页面风格的查询字符串。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::orchestrator::SetupError;

/// Query key carrying the requested test name.
pub const TEST_NAME_QUERY_KEY: &str = "qtestname";
/// Query key carrying the requested output format.
pub const OUTPUT_FORMAT_QUERY_KEY: &str = "qtestoutputformat";

/// Output formats the test modules understand.
/// 测试模块可识别的输出格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Txt,
    Xml,
    LightXml,
    JUnitXml,
    Tap,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 5] = [
        OutputFormat::Txt,
        OutputFormat::Xml,
        OutputFormat::LightXml,
        OutputFormat::JUnitXml,
        OutputFormat::Tap,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Txt => "txt",
            OutputFormat::Xml => "xml",
            OutputFormat::LightXml => "lightxml",
            OutputFormat::JUnitXml => "junitxml",
            OutputFormat::Tap => "tap",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OutputFormat::ALL
            .into_iter()
            .find(|format| format.as_str() == s)
            .ok_or_else(|| SetupError::BadOutputFormat(s.to_string()))
    }
}

/// Run inputs as received, before validation.
/// 接收到的原始运行输入，尚未校验。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawParams {
    pub test_name: Option<String>,
    pub output_format: Option<String>,
}

impl RawParams {
    /// Reads `qtestname` and `qtestoutputformat` from a query string such as
    /// `?qtestname=tst_foo&qtestoutputformat=xml`. The last occurrence of a
    /// key wins; unrelated keys are ignored.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut raw = RawParams::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                TEST_NAME_QUERY_KEY => raw.test_name = Some(value.into_owned()),
                OUTPUT_FORMAT_QUERY_KEY => raw.output_format = Some(value.into_owned()),
                _ => {}
            }
        }
        raw
    }

    /// Fills every value missing here from `fallback`.
    pub fn or(self, fallback: RawParams) -> RawParams {
        RawParams {
            test_name: self.test_name.or(fallback.test_name),
            output_format: self.output_format.or(fallback.output_format),
        }
    }

    pub fn validate(&self) -> Result<RunParams, SetupError> {
        RunParams::new(self.test_name.as_deref(), self.output_format.as_deref())
    }
}

/// Validated run inputs. / 经过校验的运行输入。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunParams {
    /// `None` runs every test the module reports.
    pub test_name: Option<String>,
    pub output_format: OutputFormat,
}

impl RunParams {
    /// Validates raw inputs. A present-but-empty test name and an unknown
    /// format are both rejected; a missing format defaults to `txt`.
    pub fn new(test_name: Option<&str>, output_format: Option<&str>) -> Result<Self, SetupError> {
        if test_name == Some("") {
            return Err(SetupError::BadTestName);
        }
        let output_format = match output_format {
            Some(format) => format.parse()?,
            None => OutputFormat::default(),
        };
        Ok(Self {
            test_name: test_name.map(str::to_string),
            output_format,
        })
    }

    pub fn from_query(query: &str) -> Result<Self, SetupError> {
        RawParams::from_query(query).validate()
    }
}
