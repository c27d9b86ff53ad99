//! Target triple families and the host platform description.

use std::env;
use std::fmt;

use serde::Serialize;

/// Default triple on 64-bit hosts.
pub const SPIR64_TRIPLE: &str = "spir64-unknown-unknown";
/// Default triple on 32-bit hosts.
pub const SPIR_TRIPLE: &str = "spir-unknown-unknown";

/// SPIR triple family used for precompiled bundle selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TripleFamily {
    Spir,
    Spir64,
    Other,
}

impl TripleFamily {
    /// Classify a triple by substring, checking `spir64` before `spir`.
    #[must_use]
    pub fn classify(triple: &str) -> Self {
        if triple.contains("spir64") {
            TripleFamily::Spir64
        } else if triple.contains("spir") {
            TripleFamily::Spir
        } else {
            TripleFamily::Other
        }
    }

    /// Name used in bundle file names, when the family has bundles.
    #[must_use]
    pub fn bundle_component(self) -> Option<&'static str> {
        match self {
            TripleFamily::Spir => Some("spir"),
            TripleFamily::Spir64 => Some("spir64"),
            TripleFamily::Other => None,
        }
    }
}

impl fmt::Display for TripleFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TripleFamily::Spir => f.write_str("spir"),
            TripleFamily::Spir64 => f.write_str("spir64"),
            TripleFamily::Other => f.write_str("other"),
        }
    }
}

/// Pointer width of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PointerWidth {
    #[serde(rename = "32")]
    Bits32,
    #[serde(rename = "64")]
    Bits64,
}

impl PointerWidth {
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim() {
            "32" => Some(PointerWidth::Bits32),
            "64" => Some(PointerWidth::Bits64),
            _ => None,
        }
    }
}

/// Properties of the host that influence flag construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HostPlatform {
    pub pointer_width: PointerWidth,
    /// Debug info drops column information and `cl_khr_gl_msaa_sharing` is a default extension.
    pub windows: bool,
    /// Source names are lower-cased.
    pub case_insensitive_fs: bool,
}

impl HostPlatform {
    /// Construct the platform representing the current build host.
    #[must_use]
    pub fn host() -> Self {
        let pointer_width = if cfg!(target_pointer_width = "64") {
            PointerWidth::Bits64
        } else {
            PointerWidth::Bits32
        };
        let windows = env::consts::OS == "windows";
        Self {
            pointer_width,
            windows,
            case_insensitive_fs: windows,
        }
    }

    /// A 64-bit non-Windows platform, independent of the build host.
    #[must_use]
    pub fn linux64() -> Self {
        Self {
            pointer_width: PointerWidth::Bits64,
            windows: false,
            case_insensitive_fs: false,
        }
    }

    /// A 64-bit Windows platform, independent of the build host.
    #[must_use]
    pub fn windows64() -> Self {
        Self {
            pointer_width: PointerWidth::Bits64,
            windows: true,
            case_insensitive_fs: true,
        }
    }

    /// Triple used when the options do not name one.
    #[must_use]
    pub fn default_triple(self) -> &'static str {
        match self.pointer_width {
            PointerWidth::Bits64 => SPIR64_TRIPLE,
            PointerWidth::Bits32 => SPIR_TRIPLE,
        }
    }
}

impl Default for HostPlatform {
    fn default() -> Self {
        Self::host()
    }
}
