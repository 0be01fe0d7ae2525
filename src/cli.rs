// src/cli.rs
use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{env, path::PathBuf, process::ExitCode};
use tracing_subscriber::EnvFilter;

use crate::infra::t;

pub mod commands;

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for a `--lang <VALUE>` argument.
fn pre_parse_language() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    let pos = args.iter().position(|arg| arg == "--lang")?;
    args.get(pos + 1).cloned()
}

/// Arguments shared by every command that loads a module.
fn module_args(locale: &str) -> [Arg; 3] {
    [
        Arg::new("config")
            .short('c')
            .long("config")
            .help(t!("arg_config", locale = locale).to_string())
            .value_name("CONFIG")
            .value_parser(clap::value_parser!(PathBuf))
            .action(ArgAction::Set),
        Arg::new("module-dir")
            .short('d')
            .long("module-dir")
            .help(t!("arg_module_dir", locale = locale).to_string())
            .value_name("MODULE_DIR")
            .action(ArgAction::Set),
        Arg::new("module")
            .short('m')
            .long("module")
            .help(t!("arg_module", locale = locale).to_string())
            .value_name("MODULE")
            .action(ArgAction::Set),
    ]
}

fn build_cli(locale: &str) -> Command {
    Command::new("batched-test-runner")
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli_about", locale = locale).to_string())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli_lang", locale = locale).to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help(t!("cli_verbose", locale = locale).to_string())
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("run")
                .about(t!("cmd_run_about", locale = locale).to_string())
                .args(module_args(locale))
                .arg(
                    Arg::new("test-name")
                        .short('t')
                        .long("test-name")
                        .help(t!("arg_test_name", locale = locale).to_string())
                        .value_name("TEST_NAME")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("format")
                        .short('f')
                        .long("format")
                        .help(t!("arg_format", locale = locale).to_string())
                        .value_name("FORMAT")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("query")
                        .long("query")
                        .help(t!("arg_query", locale = locale).to_string())
                        .value_name("QUERY")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("timeout")
                        .long("timeout")
                        .help(t!("arg_timeout", locale = locale).to_string())
                        .value_name("SECONDS")
                        .value_parser(clap::value_parser!(u64))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help(t!("arg_json", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("list")
                .about(t!("cmd_list_about", locale = locale).to_string())
                .args(module_args(locale)),
        )
}

/// Installs the diagnostic log subscriber. Logs go to stderr so that stdout
/// stays reserved for the run itself.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second initialization (e.g. in tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn module_options(matches: &ArgMatches) -> commands::ModuleOptions {
    commands::ModuleOptions {
        config: matches.get_one::<PathBuf>("config").cloned(),
        module_dir: matches.get_one::<String>("module-dir").cloned(),
        module_name: matches.get_one::<String>("module").cloned(),
    }
}

pub async fn run() -> Result<ExitCode> {
    // Pre-parse language so help text is localized.
    let language = pre_parse_language();
    let help_locale = crate::resolve_locale(language.as_deref());
    rust_i18n::set_locale(&help_locale);

    let matches = build_cli(&help_locale).get_matches();
    init_logging(matches.get_flag("verbose"));
    let language = matches.get_one::<String>("lang").cloned();

    match matches.subcommand() {
        Some(("run", run_matches)) => {
            let args = commands::run::RunArgs {
                module: module_options(run_matches),
                language,
                test_name: run_matches.get_one::<String>("test-name").cloned(),
                output_format: run_matches.get_one::<String>("format").cloned(),
                query: run_matches.get_one::<String>("query").cloned(),
                timeout_secs: run_matches.get_one::<u64>("timeout").copied(),
                json: run_matches.get_flag("json"),
            };
            commands::run::execute(args).await
        }
        Some(("list", list_matches)) => {
            commands::list::execute(module_options(list_matches), language).await
        }
        // `subcommand_required` makes clap print help and exit before this.
        _ => Ok(ExitCode::SUCCESS),
    }
}
