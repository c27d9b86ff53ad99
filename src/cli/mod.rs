//! CLI front-end: command parsing and dispatch helpers used by the `clfe` binary.

mod help;

use std::env;
use std::error::Error as StdError;
use std::fmt;

use crate::logging::{LogFormat, LogLevel, LogOptions, LogSettings};

pub mod dispatch;

/// Top-level commands supported by the `clfe` CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CheckCompile {
        options: String,
    },
    CheckLink {
        options: String,
    },
    Flags {
        options: String,
        extra: String,
        opencl_version: Option<String>,
        json: bool,
    },
    Help {
        topic: Option<String>,
    },
    Version,
}

impl Command {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Command::CheckCompile { .. } => "check-compile",
            Command::CheckLink { .. } => "check-link",
            Command::Flags { .. } => "flags",
            Command::Help { .. } => "help",
            Command::Version => "version",
        }
    }
}

/// Parsed CLI invocation.
#[derive(Debug, Clone)]
pub struct Cli {
    pub command: Command,
    pub log_options: LogOptions,
}

/// Error emitted while parsing command-line arguments.
#[derive(Debug, Clone)]
pub struct CliError {
    message: String,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn with_usage(message: impl Into<String>) -> Self {
        let mut owned = message.into();
        owned.push_str("\n\n");
        let usage = Cli::usage();
        owned.push_str(&usage);
        Self::new(owned)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for CliError {}

fn is_help_flag(value: &str) -> bool {
    matches!(value, "-h" | "--help")
}

impl Cli {
    /// Parse arguments from the environment.
    ///
    /// # Errors
    /// Returns a [`CliError`] when the arguments cannot be interpreted as a supported command.
    pub fn parse() -> Result<Self, CliError> {
        Self::parse_from(env::args().skip(1))
    }

    /// Parse arguments from an iterator (useful for testing).
    ///
    /// # Errors
    /// Returns a [`CliError`] when the provided iterator does not describe a valid invocation.
    pub fn parse_from<I, T>(args: I) -> Result<Self, CliError>
    where
        I: Iterator<Item = T>,
        T: Into<String>,
    {
        let mut iter = args.map(Into::<String>::into).peekable();
        let mut settings = LogSettings::default();
        while let Some(flag) = iter.peek().cloned() {
            if !flag.starts_with("--log-") {
                break;
            }
            iter.next();
            consume_log_option(&flag, &mut iter, &mut settings)?;
        }

        let Some(raw_command) = iter.next() else {
            return Err(CliError::with_usage("missing command"));
        };
        let rest: Vec<String> = iter.collect();

        let command = match raw_command.as_str() {
            "--help" | "-h" | "help" => Command::Help {
                topic: rest
                    .first()
                    .filter(|value| !is_help_flag(value))
                    .map(|value| value.to_ascii_lowercase()),
            },
            "--version" | "-V" | "version" => {
                if rest.iter().any(|value| is_help_flag(value)) {
                    Command::Help {
                        topic: Some("version".into()),
                    }
                } else if let Some(extra) = rest.first() {
                    return Err(CliError::with_usage(format!(
                        "unsupported option '{extra}' for command"
                    )));
                } else {
                    Command::Version
                }
            }
            "check-compile" | "check-link" | "flags" => {
                if rest.first().is_some_and(|value| is_help_flag(value)) {
                    Command::Help {
                        topic: Some(raw_command.clone()),
                    }
                } else {
                    parse_option_command(&raw_command, rest, &mut settings)?
                }
            }
            other => {
                return Err(CliError::with_usage(format!("unknown command '{other}'")));
            }
        };

        Ok(Cli {
            command,
            log_options: settings.merged_with_env(),
        })
    }

    /// Return formatted general help text.
    #[must_use]
    pub fn usage() -> String {
        help::render_general_help()
    }

    /// Return help text for a specific command.
    ///
    /// # Errors
    /// Returns a [`CliError`] when the requested topic is unknown.
    pub fn help_for(topic: &str) -> Result<String, CliError> {
        help::render_command_help(topic)
            .ok_or_else(|| CliError::with_usage(help::format_unknown_topic(topic)))
    }
}

fn consume_log_option<I>(
    flag: &str,
    iter: &mut I,
    settings: &mut LogSettings,
) -> Result<(), CliError>
where
    I: Iterator<Item = String>,
{
    let value = iter
        .next()
        .ok_or_else(|| CliError::with_usage(format!("expected value after {flag}")))?;
    match flag {
        "--log-format" => {
            settings.format = Some(LogFormat::parse(&value).ok_or_else(|| {
                CliError::new(format!("unsupported log format '{value}'"))
            })?);
        }
        "--log-level" => {
            settings.level = Some(
                LogLevel::parse(&value)
                    .ok_or_else(|| CliError::new(format!("unsupported log level '{value}'")))?,
            );
        }
        _ => {
            return Err(CliError::with_usage(format!(
                "unsupported global option '{flag}'"
            )));
        }
    }
    Ok(())
}

/// Remaining arguments form the OpenCL option string; `--` ends clfe's own flags.
fn parse_option_command(
    name: &str,
    args: Vec<String>,
    settings: &mut LogSettings,
) -> Result<Command, CliError> {
    let mut options = Vec::new();
    let mut extra = String::new();
    let mut opencl_version = None;
    let mut json = false;
    let flags_command = name == "flags";

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--" => {
                options.extend(iter.by_ref());
                break;
            }
            "--log-format" | "--log-level" => consume_log_option(&arg, &mut iter, settings)?,
            "--extra" if flags_command => {
                extra = iter
                    .next()
                    .ok_or_else(|| CliError::with_usage("expected value after --extra"))?;
            }
            "--opencl-version" if flags_command => {
                opencl_version = Some(iter.next().ok_or_else(|| {
                    CliError::with_usage("expected value after --opencl-version")
                })?);
            }
            "--json" if flags_command => json = true,
            _ if arg.starts_with("--") => {
                return Err(CliError::with_usage(format!(
                    "unsupported option '{arg}' for {name}"
                )));
            }
            _ => options.push(arg),
        }
    }

    let options = options.join(" ");
    Ok(match name {
        "check-compile" => Command::CheckCompile { options },
        "check-link" => Command::CheckLink { options },
        _ => Command::Flags {
            options,
            extra,
            opencl_version,
            json,
        },
    })
}
