//! Build metadata stamped by `build.rs`, rendered for `clfe --version`.

use std::fmt;

const UNKNOWN: &str = "unknown";

/// Everything `build.rs` recorded about the binary. Fields are `"unknown"` when the build
/// environment could not provide them (no git checkout, for example).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: &'static str,
    pub commit: &'static str,
    pub commit_full: &'static str,
    pub dirty: &'static str,
    pub commit_unix: &'static str,
    pub built_unix: &'static str,
    pub profile: &'static str,
    pub target: &'static str,
}

impl BuildInfo {
    #[must_use]
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            commit: option_env!("CLFE_GIT_HASH").unwrap_or(UNKNOWN),
            commit_full: option_env!("CLFE_GIT_HASH_FULL").unwrap_or(UNKNOWN),
            dirty: option_env!("CLFE_GIT_DIRTY").unwrap_or(UNKNOWN),
            commit_unix: option_env!("CLFE_GIT_COMMIT_UNIX").unwrap_or(UNKNOWN),
            built_unix: option_env!("CLFE_BUILD_UNIX").unwrap_or(UNKNOWN),
            profile: option_env!("CLFE_BUILD_PROFILE").unwrap_or(UNKNOWN),
            target: option_env!("CLFE_BUILD_TARGET").unwrap_or(UNKNOWN),
        }
    }

    fn commit_line(&self) -> String {
        if self.commit_full != UNKNOWN && self.commit_full != self.commit {
            format!("{} ({})", self.commit, self.commit_full)
        } else {
            self.commit.to_string()
        }
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "clfe {}", self.version)?;
        writeln!(f, "commit: {}", self.commit_line())?;
        writeln!(f, "commit_unix: {}", self.commit_unix)?;
        writeln!(f, "dirty: {}", self.dirty)?;
        writeln!(f, "built: {}", self.built_unix)?;
        writeln!(f, "profile: {}", self.profile)?;
        write!(f, "target: {}", self.target)
    }
}

/// Render a scripting-friendly version string.
#[must_use]
pub fn formatted() -> String {
    BuildInfo::current().to_string()
}
