use std::backtrace::Backtrace;
use std::collections::TryReserveError;
use std::error::Error as StdError;
use std::fmt;
use std::io;

use crate::cli::CliError;
use crate::kernel_arg_info::KernelArgInfoError;
use crate::services::{ServiceError, ServiceKind};

/// Unified error type for the front-end layer.
#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    Cli(CliError),
    ResourceUnavailable {
        id: String,
    },
    Service {
        service: ServiceKind,
        message: String,
    },
    OutOfMemory,
    KernelArgInfo(KernelArgInfoError),
    Internal {
        message: String,
        backtrace: Option<Backtrace>,
    },
}

/// Convenience result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Construct a new internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            backtrace: capture_backtrace(),
        }
    }

    pub fn resource_unavailable(id: impl Into<String>) -> Self {
        Self::ResourceUnavailable { id: id.into() }
    }

    /// Return the captured backtrace, if any.
    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self {
            Error::Internal { backtrace, .. } => backtrace.as_ref(),
            _ => None,
        }
    }

    /// Text placed in a result log. Collaborator failures surface their own message verbatim.
    #[must_use]
    pub fn log_message(&self) -> String {
        match self {
            Error::Service { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

fn capture_backtrace() -> Option<Backtrace> {
    if cfg!(debug_assertions) {
        Some(Backtrace::force_capture())
    } else {
        None
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {err}"),
            Error::Cli(err) => write!(f, "{err}"),
            Error::ResourceUnavailable { id } => write!(f, "resource `{id}` is not available"),
            Error::Service { service, message } => write!(f, "{service} error: {message}"),
            Error::OutOfMemory => f.write_str("out of host memory"),
            Error::KernelArgInfo(err) => write!(f, "kernel argument info unavailable: {err}"),
            Error::Internal { message, .. } => write!(f, "internal error: {message}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Cli(err) => Some(err),
            Error::KernelArgInfo(err) => Some(err),
            Error::ResourceUnavailable { .. }
            | Error::Service { .. }
            | Error::OutOfMemory
            | Error::Internal { .. } => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::Io(error)
    }
}

impl From<CliError> for Error {
    fn from(error: CliError) -> Self {
        Error::Cli(error)
    }
}

impl From<ServiceError> for Error {
    fn from(error: ServiceError) -> Self {
        Error::Service {
            service: error.kind,
            message: error.message,
        }
    }
}

impl From<KernelArgInfoError> for Error {
    fn from(error: KernelArgInfoError) -> Self {
        Error::KernelArgInfo(error)
    }
}

impl From<TryReserveError> for Error {
    fn from(_: TryReserveError) -> Self {
        Error::OutOfMemory
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::internal(message)
    }
}
