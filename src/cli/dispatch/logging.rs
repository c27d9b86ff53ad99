use std::time::Duration;

use tracing_subscriber::EnvFilter;

use crate::cli::Command;
use crate::logging::{LogFormat, LogOptions};

pub(super) fn init_logging(options: &LogOptions) {
    use std::io::IsTerminal;
    use std::sync::OnceLock;
    use tracing_subscriber::fmt;

    static INITIALISED: OnceLock<()> = OnceLock::new();

    let _ = INITIALISED.get_or_init(|| {
        let use_ansi = std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal();
        let filter = env_filter(options, std::env::var("RUST_LOG").ok().as_deref());

        match options.format {
            LogFormat::Json => {
                let subscriber = fmt::fmt()
                    .with_env_filter(filter)
                    .with_ansi(false)
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true)
                    .json()
                    .finish();
                let _ = tracing::subscriber::set_global_default(subscriber);
            }
            LogFormat::Auto | LogFormat::Text => {
                let subscriber = fmt::fmt()
                    .with_env_filter(filter)
                    .with_ansi(use_ansi)
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true)
                    .compact()
                    .finish();
                let _ = tracing::subscriber::set_global_default(subscriber);
            }
        }
    });
}

/// `RUST_LOG` when it holds valid directives, otherwise the level from `options`.
fn env_filter(options: &LogOptions, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(options.filter_directive()))
}

pub(super) fn log_run_start(command: &Command, options: &LogOptions) {
    tracing::info!(
        target: "clfe",
        stage = "cli.run.start",
        command = command.name(),
        log_level = %options.level,
        log_format = %options.format,
    );
}

pub(super) fn log_run_complete(
    command: &Command,
    elapsed: Duration,
    result: &crate::error::Result<()>,
) {
    let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    match result {
        Ok(()) => tracing::info!(
            target: "clfe",
            stage = "cli.run.footer",
            command = command.name(),
            status = "ok",
            elapsed_ms
        ),
        Err(err) => tracing::error!(
            target: "clfe",
            stage = "cli.run.footer",
            command = command.name(),
            status = "error",
            elapsed_ms,
            error = %err
        ),
    }
}
