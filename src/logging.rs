//! Log format/level selection for the `clfe` binary.
//!
//! Library code only emits `tracing` events under the `clfe` target; installing a subscriber is
//! left to the binary (see `cli::dispatch::logging`).

use std::env;
use std::fmt;

/// Environment variable selecting the log format.
pub const ENV_LOG_FORMAT: &str = "CLFE_LOG_FORMAT";
/// Environment variable selecting the log level.
pub const ENV_LOG_LEVEL: &str = "CLFE_LOG_LEVEL";
/// Target used by every event this crate emits.
pub const LOG_TARGET: &str = "clfe";

/// Output format for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Auto,
    Text,
    Json,
}

/// Accepted spellings; the first entry for a value is its canonical name.
const FORMAT_NAMES: &[(&str, LogFormat)] = &[
    ("auto", LogFormat::Auto),
    ("text", LogFormat::Text),
    ("plain", LogFormat::Text),
    ("json", LogFormat::Json),
];

const LEVEL_NAMES: &[(&str, LogLevel)] = &[
    ("error", LogLevel::Error),
    ("err", LogLevel::Error),
    ("warn", LogLevel::Warn),
    ("warning", LogLevel::Warn),
    ("info", LogLevel::Info),
    ("debug", LogLevel::Debug),
    ("trace", LogLevel::Trace),
    ("verbose", LogLevel::Trace),
];

fn lookup<T: Copy>(names: &[(&str, T)], raw: &str) -> Option<T> {
    let wanted = raw.trim();
    names
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
        .map(|(_, value)| *value)
}

fn canonical<T: Copy + PartialEq>(names: &'static [(&'static str, T)], value: T) -> &'static str {
    names
        .iter()
        .find(|(_, candidate)| *candidate == value)
        .map_or("", |(name, _)| *name)
}

impl LogFormat {
    /// Case-insensitive; surrounding whitespace is ignored.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        lookup(FORMAT_NAMES, raw)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        canonical(FORMAT_NAMES, self)
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logging verbosity, least to most verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        lookup(LEVEL_NAMES, raw)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        canonical(LEVEL_NAMES, self)
    }

    #[must_use]
    pub fn as_tracing_level(self) -> tracing::Level {
        match self {
            Self::Error => tracing::Level::ERROR,
            Self::Warn => tracing::Level::WARN,
            Self::Info => tracing::Level::INFO,
            Self::Debug => tracing::Level::DEBUG,
            Self::Trace => tracing::Level::TRACE,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effective log configuration: defaults, then environment, then CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogOptions {
    pub format: LogFormat,
    pub level: LogLevel,
}

impl LogOptions {
    /// Warnings only; option reconciliation is chatty at `debug`.
    pub const DEFAULT: Self = Self {
        format: LogFormat::Auto,
        level: LogLevel::Warn,
    };

    /// Fields set in `overrides` replace those of `base`.
    #[must_use]
    pub fn with_overrides(base: Self, overrides: LogSettings) -> Self {
        Self {
            format: overrides.format.unwrap_or(base.format),
            level: overrides.level.unwrap_or(base.level),
        }
    }

    /// Defaults with `CLFE_LOG_FORMAT` / `CLFE_LOG_LEVEL` applied. Unparseable values are ignored.
    #[must_use]
    pub fn from_env() -> Self {
        Self::with_overrides(
            Self::DEFAULT,
            LogSettings::from_raw(
                env::var(ENV_LOG_FORMAT).ok().as_deref(),
                env::var(ENV_LOG_LEVEL).ok().as_deref(),
            ),
        )
    }

    /// `Auto` resolves to text.
    #[must_use]
    pub fn resolved(self) -> Self {
        if self.format == LogFormat::Auto {
            Self {
                format: LogFormat::Text,
                ..self
            }
        } else {
            self
        }
    }

    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[must_use]
    pub fn filter_directive(&self) -> String {
        format!("{LOG_TARGET}={}", self.level)
    }
}

impl Default for LogOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Partial logging selection, as given on the command line or in the environment.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LogSettings {
    pub format: Option<LogFormat>,
    pub level: Option<LogLevel>,
}

impl LogSettings {
    fn from_raw(format: Option<&str>, level: Option<&str>) -> Self {
        Self {
            format: format.and_then(LogFormat::parse),
            level: level.and_then(LogLevel::parse),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.format.is_none() && self.level.is_none()
    }

    /// Environment settings first, then these on top.
    #[must_use]
    pub fn merged_with_env(self) -> LogOptions {
        LogOptions::with_overrides(LogOptions::from_env(), self)
    }
}
