use anyhow::Result;
use colored::*;
use std::process::ExitCode;

use crate::{
    cli::commands::{ModuleOptions, loader_for},
    core::orchestrator::discover_tests,
    infra::t,
};

/// Prints the tests the configured module lists, one per line.
pub async fn execute(options: ModuleOptions, language: Option<String>) -> Result<ExitCode> {
    let config = options.resolve_config()?;
    let locale = crate::resolve_locale(language.as_deref().or(config.language.as_deref()));
    rust_i18n::set_locale(&locale);

    let loader = loader_for(&config);
    let names = discover_tests(&loader, &config.module_name).await?;

    println!(
        "{}",
        t!("run.listing", locale = &locale, name = &config.module_name).bold()
    );
    let names: Vec<&String> = names.iter().filter(|name| !name.is_empty()).collect();
    if names.is_empty() {
        println!("{}", t!("run.no_tests", locale = &locale).yellow());
    }
    for name in names {
        println!("  {}", name);
    }
    Ok(ExitCode::SUCCESS)
}
