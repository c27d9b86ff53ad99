//! Extension feature folding, fp64 directive scanning and precompiled bundle selection.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::target::{HostPlatform, TripleFamily};

/// Prefix of an extension directive flag.
pub const CL_EXT_PREFIX: &str = "-cl-ext=";

const DEFAULT_EXTENSIONS: &[&str] = &[
    "cl_khr_3d_image_writes",
    "cl_khr_depth_images",
    "cl_khr_fp16",
    "cl_khr_global_int32_base_atomics",
    "cl_khr_global_int32_extended_atomics",
    "cl_khr_int64_base_atomics",
    "cl_khr_int64_extended_atomics",
    "cl_khr_local_int32_base_atomics",
    "cl_khr_local_int32_extended_atomics",
    "cl_khr_mipmap_image",
    "cl_khr_mipmap_image_writes",
    "cl_khr_subgroups",
    "cl_intel_device_side_avc_motion_estimation",
    "cl_intel_planar_yuv",
    "cl_intel_subgroups",
    "cl_intel_subgroups_short",
];

const WINDOWS_EXTENSIONS: &[&str] = &["cl_khr_gl_msaa_sharing"];

/// Default extension seed for `host`.
#[must_use]
pub fn default_extensions(host: HostPlatform) -> Vec<&'static str> {
    let mut names = DEFAULT_EXTENSIONS.to_vec();
    if host.windows {
        names.extend_from_slice(WINDOWS_EXTENSIONS);
    }
    names
}

/// Enabled/disabled state for every known extension.
///
/// The key set is fixed at construction; directives naming unknown extensions are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionFeatureSet {
    states: BTreeMap<String, bool>,
}

impl ExtensionFeatureSet {
    /// Seed with every name enabled.
    pub fn seeded<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            states: names.into_iter().map(|name| (name.into(), true)).collect(),
        }
    }

    /// Fold one directive list (`+all,-cl_khr_fp16,cl_intel_subgroups`) left to right.
    pub fn apply(&mut self, list: &str) {
        for entry in list.split(',') {
            let (enabled, name) = match entry.as_bytes().first() {
                Some(b'-') => (false, &entry[1..]),
                Some(b'+') => (true, &entry[1..]),
                _ => (true, entry),
            };
            if name == "all" {
                for state in self.states.values_mut() {
                    *state = enabled;
                }
            } else if let Some(state) = self.states.get_mut(name) {
                *state = enabled;
            }
        }
    }

    /// Fold every `-cl-ext=` flag of `flags` in order.
    pub fn apply_flags<'a, I>(&mut self, flags: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for flag in flags {
            if let Some(list) = flag.strip_prefix(CL_EXT_PREFIX) {
                self.apply(list);
            }
        }
    }

    #[must_use]
    pub fn is_enabled(&self, name: &str) -> Option<bool> {
        self.states.get(name).copied()
    }

    /// Whether every known extension ended enabled, which makes module bundles usable.
    #[must_use]
    pub fn all_enabled(&self) -> bool {
        self.states.values().all(|enabled| *enabled)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.states.iter().map(|(name, enabled)| (name.as_str(), *enabled))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// State of `cl_khr_fp64` after scanning the flag sequence; the last directive wins.
#[must_use]
pub fn scan_fp64<'a, I>(flags: I) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    const NAME: &str = "cl_khr_fp64";
    let mut enabled = false;
    for flag in flags {
        if flag == "-Dcl_khr_fp64" || flag == "-D cl_khr_fp64=1" {
            enabled = true;
        } else if flag == "-U cl_khr_fp64" {
            enabled = false;
        } else if flag.contains(NAME) {
            let negative = flag.rfind("-cl_khr_fp64");
            let positive = flag.rfind("+cl_khr_fp64");
            enabled = match (positive, negative) {
                (Some(pos), Some(neg)) => pos > neg,
                (None, Some(_)) => false,
                _ => true,
            };
        }
    }
    enabled
}

/// Language standard bucket of a precompiled bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BundleStd {
    #[serde(rename = "12")]
    Cl12,
    #[serde(rename = "20")]
    Cl20,
    #[serde(rename = "30")]
    Cl30,
}

impl BundleStd {
    /// Bucket a standard ordinal: `<=120`, `200` or `300`. Other values have no bundle.
    #[must_use]
    pub fn from_ordinal(ordinal: u32) -> Option<Self> {
        match ordinal {
            0..=120 => Some(BundleStd::Cl12),
            200 => Some(BundleStd::Cl20),
            300 => Some(BundleStd::Cl30),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BundleStd::Cl12 => "12",
            BundleStd::Cl20 => "20",
            BundleStd::Cl30 => "30",
        }
    }
}

/// Key of a precompiled module bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModuleBundle {
    pub std: BundleStd,
    pub family: TripleFamily,
    pub fp64: bool,
}

impl ModuleBundle {
    /// Select a bundle from (triple family, standard ordinal, fp64 state).
    #[must_use]
    pub fn select(family: TripleFamily, std_ordinal: u32, fp64: bool) -> Option<Self> {
        family.bundle_component()?;
        let std = BundleStd::from_ordinal(std_ordinal)?;
        Some(Self { std, family, fp64 })
    }

    /// Resource file name, e.g. `opencl-c-20-spir64-fp64.pcm`.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.to_string()
    }

    /// Frontend flag loading this bundle.
    #[must_use]
    pub fn module_file_flag(&self) -> String {
        format!("-fmodule-file={self}")
    }
}

impl fmt::Display for ModuleBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let family = self.family.bundle_component().unwrap_or("spir");
        write!(f, "opencl-c-{}-{family}", self.std.as_str())?;
        if self.fp64 {
            f.write_str("-fp64")?;
        }
        f.write_str(".pcm")
    }
}
