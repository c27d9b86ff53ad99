#![deny(clippy::all, clippy::pedantic, clippy::perf, clippy::suspicious)] // Catch correctness + perf + suspicious patterns early.
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![allow(clippy::module_name_repetitions)]

//! OpenCL front-end option layer: translates OpenCL compile options into frontend flags,
//! validates option strings, and reconciles per-module compiler configuration at link time.

pub mod cli;
pub mod config;
pub mod defines;
pub mod driver;
pub mod error;
pub mod kernel_arg_info;
pub mod link;
pub mod logging;
pub mod options;
pub mod resources;
pub mod result;
pub mod services;
pub mod session;
pub mod target;
pub mod version;

pub use config::FrontendConfig;
pub use driver::{CompileRequest, Frontend};
pub use error::{Error, Result};
pub use link::{LinkMetadata, MetadataLinker};
pub use result::{BinaryResult, IrType, Outcome, Status};
