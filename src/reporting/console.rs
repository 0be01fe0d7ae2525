//! # Console Reporting Module / 控制台报告模块
//!
//! Renders a run on the terminal: live progress lines driven by the status
//! board's channels, then a summary table and the output of every test that
//! did not complete cleanly.
//!
//! 在终端上呈现一次运行：由状态板通道驱动的实时进度行，
//! 然后是摘要表格以及每个未正常完成的测试的输出。

use colored::*;

use crate::core::board::{StatusBoard, TestStatusChange};
use crate::core::events::SubscriptionId;
use crate::core::models::{LoadProgress, RunStatus, TestResult, TestStatus};
use crate::infra::t;

/// Subscriptions held by the live console view.
/// 实时控制台视图持有的订阅。
#[derive(Debug)]
pub struct ConsoleSubscriptions {
    pub status: SubscriptionId,
    pub test_status: SubscriptionId,
}

impl ConsoleSubscriptions {
    /// Stops printing live progress for `board`.
    pub fn detach(self, board: &StatusBoard) {
        board.on_status_changed().unsubscribe(self.status);
        board.on_test_status_changed().unsubscribe(self.test_status);
    }
}

/// Subscribes to both channels of `board` and prints every change as it happens.
///
/// # Arguments / 参数
/// * `board` - The board to observe / 要观察的状态板
/// * `locale` - The language locale to use for messages / 用于消息的语言区域设置
pub fn attach_live_progress(board: &StatusBoard, locale: &str) -> ConsoleSubscriptions {
    let status_board = board.downgrade();
    let status_locale = locale.to_string();
    let status = board.on_status_changed().subscribe(move |status: &RunStatus| {
        let details = status_board.upgrade().and_then(|board| board.error_details());
        print_run_status(*status, details.as_deref(), &status_locale);
    });

    let test_board = board.downgrade();
    let test_locale = locale.to_string();
    let test_status = board
        .on_test_status_changed()
        .subscribe(move |change: &TestStatusChange| {
            // The record already reflects the change when the callback runs.
            let result = test_board
                .upgrade()
                .and_then(|board| board.result(&change.name));
            print_test_status(change, result.as_ref(), &test_locale);
        });

    ConsoleSubscriptions {
        status,
        test_status,
    }
}

/// Prints a module load progress event.
pub fn print_load_progress(progress: &LoadProgress, locale: &str) {
    match progress {
        LoadProgress::Resolving { name } => println!(
            "{}",
            t!("run.loading_module", locale = locale, name = name).blue()
        ),
        LoadProgress::Ready { name } => println!(
            "{}",
            t!("run.module_ready", locale = locale, name = name).blue()
        ),
    }
}

fn print_run_status(status: RunStatus, details: Option<&str>, locale: &str) {
    match status {
        RunStatus::Running => println!("{}", t!("run.started", locale = locale).blue()),
        RunStatus::Completed => {
            println!("{}", t!("run.completed", locale = locale).green().bold())
        }
        RunStatus::Error => println!(
            "{} {}",
            t!("run.failed", locale = locale).red().bold(),
            details.unwrap_or_default().red()
        ),
    }
}

fn print_test_status(change: &TestStatusChange, result: Option<&TestResult>, locale: &str) {
    let label = format!("{:<10}", change.status.label(locale));
    match change.status {
        TestStatus::Pending => {}
        TestStatus::Running => println!("  {} {}", label.blue(), change.name),
        TestStatus::Completed | TestStatus::Error | TestStatus::Crashed => {
            let exit_code = result
                .and_then(|r| r.exit_code)
                .map(|code| t!("report.exit_code", locale = locale, code = code).to_string())
                .unwrap_or_default();
            println!(
                "  {} {} {}",
                colorize(change.status, result, &label),
                change.name,
                exit_code.dimmed()
            );
        }
    }
}

fn colorize(status: TestStatus, result: Option<&TestResult>, text: &str) -> ColoredString {
    match status {
        TestStatus::Completed if result.is_some_and(TestResult::is_success) => text.green(),
        TestStatus::Completed => text.yellow(),
        TestStatus::Error | TestStatus::Crashed => text.red(),
        TestStatus::Pending | TestStatus::Running => text.dimmed(),
    }
}

/// Prints a formatted summary of the board to the console.
/// Displays a table with test status, name and exit code,
/// using color coding to highlight different statuses.
///
/// 在控制台打印状态板的格式化摘要。
/// 显示一个包含测试状态、名称和退出码的表格，
/// 使用颜色编码突出显示不同的状态。
///
/// # Output Format / 输出格式
/// ```text
/// --- Test Summary ---
///   - Status     | Test Name                                | Exit Code
///   - Completed  | tst_qstring                              |         0
///   - Completed  | tst_qvariant                             |         2
///   - Error      | tst_qurl                                 |        -1
///   - Crashed    | tst_qwidget                              |       N/A
/// ```
pub fn print_summary(board: &StatusBoard, locale: &str) {
    println!("\n{}", t!("report.summary_banner", locale = locale).bold());

    board.with_results(|results| {
        for (name, result) in results {
            let label = format!("{:<10}", result.status.label(locale));
            let exit_code = result
                .exit_code
                .map(|code| code.to_string())
                .unwrap_or_else(|| "N/A".to_string());
            println!(
                "  - {} | {:<40} | {:>9}",
                colorize(result.status, Some(result), &label),
                name,
                exit_code
            );
        }
    });

    let results = board.results();
    let failed = results.iter().filter(|(_, r)| !r.is_success()).count();
    println!(
        "\n{}",
        t!(
            "report.totals",
            locale = locale,
            total = results.len(),
            passed = results.len() - failed,
            failed = failed
        )
    );
}

/// Prints the captured output of every test that ended in `Error` or
/// `Crashed`, or completed with a non-zero exit code.
///
/// 打印每个以 `Error` 或 `Crashed` 结束、或以非零退出码完成的测试的捕获输出。
pub fn print_failure_details(board: &StatusBoard, locale: &str) {
    let failures: Vec<(String, TestResult)> = board
        .results()
        .into_iter()
        .filter(|(_, result)| result.status.is_terminal() && !result.is_success())
        .collect();

    if failures.is_empty() {
        return;
    }

    println!("\n{}", t!("report.failure_banner", locale = locale).red().bold());
    println!("{}", "-".repeat(80));

    for (i, (name, result)) in failures.iter().enumerate() {
        println!(
            "[{}/{}] {} '{}'",
            i + 1,
            failures.len(),
            result.status.label(locale).red(),
            name.cyan()
        );
        println!("\n--- {} ---\n", t!("report.test_log", locale = locale).yellow());
        if result.output().trim().is_empty() {
            println!("{}", t!("report.no_output", locale = locale).dimmed());
        } else {
            println!("{}", result.output().trim_end());
        }
        println!("\n{}", "-".repeat(80));
    }
}
