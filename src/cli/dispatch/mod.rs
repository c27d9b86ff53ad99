use std::io::{self, Write};
use std::time::Instant;

use serde::Serialize;

use crate::cli::{Cli, CliError, Command};
use crate::config::FrontendConfig;
use crate::driver::{check_compile_options, check_link_options};
use crate::error::{Error, Result};
use crate::options::{CheckFailure, CompileReconciler, EffectiveConfiguration};
use crate::session::session;

mod logging;
mod reporting;

/// Execute a parsed CLI command. Logging is configured here so the binary entrypoint can stay
/// thin.
pub fn run(cli: Cli) -> Result<()> {
    let log_options = cli.log_options.resolved();
    logging::init_logging(&log_options);
    let start = Instant::now();
    logging::log_run_start(&cli.command, &log_options);
    let mut stdout = io::stdout().lock();
    let result = execute(&cli.command, &FrontendConfig::from_env(), &mut stdout);
    logging::log_run_complete(&cli.command, start.elapsed(), &result);
    result
}

pub fn report_error(err: &Error) {
    reporting::report_error(err);
}

#[derive(Serialize)]
struct FlagsReport<'a> {
    config: &'a FrontendConfig,
    effective: &'a EffectiveConfiguration,
    command_line: String,
}

fn execute(command: &Command, config: &FrontendConfig, out: &mut dyn Write) -> Result<()> {
    match command {
        Command::CheckCompile { options } => {
            check_compile_options(options).map_err(|failure| rejected("compile", &failure))?;
            writeln!(out, "compile options are valid")?;
        }
        Command::CheckLink { options } => {
            check_link_options(options).map_err(|failure| rejected("link", &failure))?;
            writeln!(out, "link options are valid")?;
        }
        Command::Flags {
            options,
            extra,
            opencl_version,
            json,
        } => {
            let reconciler = CompileReconciler::from_config(config);
            let version = opencl_version.as_deref().unwrap_or(&config.opencl_version);
            let effective =
                reconciler.process(options, extra, version, session().next_program_id());
            if *json {
                let report = FlagsReport {
                    config,
                    effective: &effective,
                    command_line: effective.command_line(),
                };
                let rendered = serde_json::to_string_pretty(&report)
                    .map_err(|err| Error::internal(format!("failed to render JSON: {err}")))?;
                writeln!(out, "{rendered}")?;
            } else {
                for flag in &effective.flags {
                    writeln!(out, "{flag}")?;
                }
            }
        }
        Command::Help { topic } => {
            let text = match topic {
                Some(topic) => Cli::help_for(topic)?,
                None => Cli::usage(),
            };
            write!(out, "{text}")?;
        }
        Command::Version => writeln!(out, "{}", crate::version::formatted())?,
    }
    Ok(())
}

fn rejected(kind: &str, failure: &CheckFailure) -> Error {
    Error::Cli(CliError::new(format!("invalid {kind} options: {failure}")))
}
