//! # Run Command Module / 运行命令模块
//!
//! This module implements the `run` command: it builds the status board,
//! hooks the console up to its channels, and hands the board's writer to an
//! orchestrator that executes the batch.
//!
//! 此模块实现 `run` 命令：它创建状态板，将控制台连接到其通道，
//! 并将状态板的写入端交给执行批量测试的编排器。

use anyhow::{Context, Result};
use colored::*;
use std::process::ExitCode;

use crate::{
    cli::commands::{ModuleOptions, loader_for},
    core::{
        board::StatusBoard,
        models::RunStatus,
        orchestrator::Orchestrator,
        params::RawParams,
    },
    infra::t,
    reporting::console::{
        attach_live_progress, print_failure_details, print_load_progress, print_summary,
    },
};

/// Everything the `run` command was asked to do.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub module: ModuleOptions,
    pub language: Option<String>,
    pub test_name: Option<String>,
    pub output_format: Option<String>,
    pub query: Option<String>,
    pub timeout_secs: Option<u64>,
    pub json: bool,
}

/// Executes the run command with the provided arguments.
///
/// # Returns
/// `ExitCode::SUCCESS` only when the run completed and every test completed
/// with exit code 0.
pub async fn execute(args: RunArgs) -> Result<ExitCode> {
    let mut config = args.module.resolve_config()?;
    if args.timeout_secs.is_some() {
        config.timeout_secs = args.timeout_secs;
    }

    let locale = crate::resolve_locale(args.language.as_deref().or(config.language.as_deref()));
    rust_i18n::set_locale(&locale);

    // Query values win over flags, flags over the config file.
    let flags = RawParams {
        test_name: args.test_name.or(config.test_name.clone()),
        output_format: args.output_format.or(config.output_format.clone()),
    };
    let raw = match &args.query {
        Some(query) => RawParams::from_query(query).or(flags),
        None => flags,
    };
    let params = raw.validate();

    let (board, writer) = StatusBoard::new();
    let live = (!args.json).then(|| attach_live_progress(&board, &locale));

    let progress_locale = locale.clone();
    let quiet = args.json;
    let orchestrator = Orchestrator::new(loader_for(&config), writer)
        .with_module_name(config.module_name.clone())
        .with_timeout(config.timeout())
        .with_load_progress(move |progress| {
            if !quiet {
                print_load_progress(progress, &progress_locale);
            }
        });

    let status = orchestrator.start(params).await;

    if let Some(subscriptions) = live {
        subscriptions.detach(&board);
    }

    if args.json {
        let snapshot = serde_json::to_string_pretty(&board.snapshot())
            .context("Failed to serialize the run results")?;
        println!("{snapshot}");
    } else if status == RunStatus::Completed {
        print_summary(&board, &locale);
        print_failure_details(&board, &locale);
    }

    let all_passed = status == RunStatus::Completed
        && board.results().iter().all(|(_, result)| result.is_success());

    if all_passed {
        if !args.json {
            println!("\n{}", t!("report.all_passed", locale = &locale).green().bold());
        }
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
