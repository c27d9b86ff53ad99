//! Front-end configuration: build-host defaults refined by `CLFE_*` environment variables.

use std::env;
use std::path::PathBuf;

use serde::Serialize;

use crate::target::HostPlatform;

/// OpenCL version string the validation entry points reconcile against.
pub const DEFAULT_OPENCL_VERSION: &str = "200";

pub const ENV_OPENCL_VERSION: &str = "CLFE_OPENCL_VERSION";
pub const ENV_PCH_EXTENSIONS: &str = "CLFE_PCH_EXTENSIONS";
pub const ENV_OPTIONS_DIR: &str = "CLFE_OPTIONS_DIR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrontendConfig {
    pub host: HostPlatform,
    pub opencl_version: String,
    /// Replaces the default extension seed when set; every listed extension starts enabled.
    pub pch_extensions: Option<Vec<String>>,
    /// Directory receiving a reproduction log per compile call.
    pub options_dump_dir: Option<PathBuf>,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            host: HostPlatform::host(),
            opencl_version: DEFAULT_OPENCL_VERSION.to_string(),
            pch_extensions: None,
            options_dump_dir: None,
        }
    }
}

/// Raw environment values, captured once so overrides can be applied without touching the
/// process environment.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnvOverrides {
    pub opencl_version: Option<String>,
    pub pch_extensions: Option<String>,
    pub options_dir: Option<PathBuf>,
}

impl EnvOverrides {
    #[must_use]
    pub fn capture() -> Self {
        Self {
            opencl_version: env::var(ENV_OPENCL_VERSION).ok(),
            pch_extensions: env::var(ENV_PCH_EXTENSIONS).ok(),
            options_dir: env::var_os(ENV_OPTIONS_DIR).map(PathBuf::from),
        }
    }
}

impl FrontendConfig {
    #[must_use]
    pub fn from_env() -> Self {
        apply_env_overrides(Self::default(), &EnvOverrides::capture())
    }

    #[must_use]
    pub fn with_host(mut self, host: HostPlatform) -> Self {
        self.host = host;
        self
    }

    #[must_use]
    pub fn with_options_dump_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options_dump_dir = Some(dir.into());
        self
    }
}

/// Layer environment values over `base`. Blank values are ignored.
#[must_use]
pub fn apply_env_overrides(mut base: FrontendConfig, overrides: &EnvOverrides) -> FrontendConfig {
    if let Some(version) = overrides.opencl_version.as_deref().map(str::trim) {
        if !version.is_empty() {
            base.opencl_version = version.to_string();
        }
    }
    if let Some(list) = overrides.pch_extensions.as_deref() {
        let names: Vec<String> = list
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        if !names.is_empty() {
            base.pch_extensions = Some(names);
        }
    }
    if let Some(dir) = &overrides.options_dir {
        if !dir.as_os_str().is_empty() {
            base.options_dump_dir = Some(dir.clone());
        }
    }
    base
}
