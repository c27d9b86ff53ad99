//! Compile option reconciliation: parsed OpenCL options to frontend flags.

use serde::Serialize;

use super::args::{ArgList, parse};
use super::extensions::{ExtensionFeatureSet, ModuleBundle, default_extensions, scan_fp64};
use super::table::{COMPILE_OPTIONS, CompileOpt};
use super::tokenize::{TokenizerConfig, tokenize};
use crate::config::FrontendConfig;
use crate::defines::DefineFlag;
use crate::target::{HostPlatform, TripleFamily};

/// Bitcode emission flag used as the default emit mode.
pub const EMIT_LLVM_BC: &str = "-emit-llvm-bc";
/// Emit-mode flag that requests SPIR-V; rewritten to [`EMIT_LLVM_BC`] after reconciliation.
pub const EMIT_SPIRV: &str = "-emit-spirv";
/// Flag that disables optimisation of the produced module.
pub const CL_OPT_DISABLE: &str = "-cl-opt-disable";
/// Standard used when none is requested.
pub const DEFAULT_STD_FLAG: &str = "-cl-std=CL1.2";
const DEFAULT_STD_ORDINAL: u32 = 120;

/// Fully resolved compile configuration.
#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfiguration {
    /// Frontend arguments; the source name is the final entry.
    pub flags: Vec<String>,
    pub source_name: String,
    pub emit_spirv: bool,
    pub opt_disable: bool,
    pub std_ordinal: u32,
    pub triple: String,
    pub fp64: bool,
    pub extensions: ExtensionFeatureSet,
    /// Whether `-fmodules` was requested (every known extension enabled).
    pub use_modules: bool,
    pub bundle: Option<ModuleBundle>,
}

impl EffectiveConfiguration {
    /// Flags without the trailing source name.
    #[must_use]
    pub fn options(&self) -> &[String] {
        self.flags.split_last().map_or(&[][..], |(_, rest)| rest)
    }

    /// Space-joined flag list.
    #[must_use]
    pub fn command_line(&self) -> String {
        self.flags.join(" ")
    }
}

/// Result of the per-argument translation loop.
#[derive(Debug)]
struct Translated {
    flags: Vec<String>,
    std_ordinal: Option<u32>,
    triple: Option<String>,
    source_name: String,
}

/// Maps compile options onto frontend flags for one host.
#[derive(Debug, Clone)]
pub struct CompileReconciler {
    host: HostPlatform,
    extension_seed: Vec<String>,
}

impl CompileReconciler {
    #[must_use]
    pub fn new(host: HostPlatform) -> Self {
        Self {
            host,
            extension_seed: default_extensions(host).into_iter().map(str::to_string).collect(),
        }
    }

    /// Replace the default extension seed.
    #[must_use]
    pub fn with_extension_seed(mut self, names: Vec<String>) -> Self {
        self.extension_seed = names;
        self
    }

    #[must_use]
    pub fn from_config(config: &FrontendConfig) -> Self {
        let reconciler = Self::new(config.host);
        match &config.pch_extensions {
            Some(names) => reconciler.with_extension_seed(names.clone()),
            None => reconciler,
        }
    }

    #[must_use]
    pub fn host(&self) -> HostPlatform {
        self.host
    }

    /// Tokenize, parse and reconcile. Missing option values are ignored in this mode; the
    /// arguments parsed before the missing value still apply.
    #[must_use]
    pub fn process(
        &self,
        options: &str,
        extra_options: &str,
        opencl_version: &str,
        program_id: u64,
    ) -> EffectiveConfiguration {
        let parsed = parse(&COMPILE_OPTIONS, options);
        self.reconcile(&parsed.args, extra_options, opencl_version, program_id)
    }

    /// Build the effective configuration. `program_id` names the translation unit when the
    /// options do not.
    #[must_use]
    pub fn reconcile(
        &self,
        args: &ArgList<CompileOpt>,
        extra_options: &str,
        opencl_version: &str,
        program_id: u64,
    ) -> EffectiveConfiguration {
        let translated = self.translate(args, program_id);
        let Translated {
            mut flags,
            std_ordinal,
            triple,
            source_name,
        } = translated;

        let std_ordinal = std_ordinal.unwrap_or_else(|| {
            flags.push(DEFAULT_STD_FLAG.to_string());
            DEFAULT_STD_ORDINAL
        });
        let triple = triple
            .filter(|triple| !triple.is_empty())
            .unwrap_or_else(|| self.host.default_triple().to_string());

        let tail = epilogue(&flags, opencl_version, &triple);
        flags.extend(tail);
        flags.extend(tokenize(extra_options, TokenizerConfig::RAW));

        let mut extensions = ExtensionFeatureSet::seeded(self.extension_seed.iter().cloned());
        extensions.apply_flags(flags.iter().map(String::as_str));
        let fp64 = scan_fp64(flags.iter().map(String::as_str));
        let use_modules = extensions.all_enabled();
        let family = TripleFamily::classify(&triple);
        let bundle = if use_modules {
            ModuleBundle::select(family, std_ordinal, fp64)
        } else {
            None
        };
        let bundle_name = bundle.map(|b| b.file_name()).unwrap_or_default();
        tracing::debug!(
            target: "clfe",
            stage = "options.extensions.resolve",
            known = extensions.len(),
            use_modules,
            fp64,
            family = %family,
            bundle = %bundle_name,
        );
        if use_modules {
            flags.push("-fmodules".to_string());
            if let Some(bundle) = bundle {
                flags.push(bundle.module_file_flag());
            }
        }

        flags.push(source_name.clone());
        let (flags, emit_spirv, opt_disable) = post_process(flags);

        tracing::debug!(
            target: "clfe",
            stage = "options.compile.reconcile",
            source_name = %source_name,
            std = std_ordinal,
            triple = %triple,
            emit_spirv,
            opt_disable,
            flag_count = flags.len(),
        );

        EffectiveConfiguration {
            flags,
            source_name,
            emit_spirv,
            opt_disable,
            std_ordinal,
            triple,
            fp64,
            extensions,
            use_modules,
            bundle,
        }
    }

    fn translate(&self, args: &ArgList<CompileOpt>, program_id: u64) -> Translated {
        let mut out = Translated {
            flags: Vec::with_capacity(args.len() + 32),
            std_ordinal: None,
            triple: None,
            source_name: program_id.to_string(),
        };

        for arg in args.iter() {
            match arg.id() {
                CompileOpt::W
                | CompileOpt::D
                | CompileOpt::I
                | CompileOpt::Werror
                | CompileOpt::ClSinglePrecisionConstant
                | CompileOpt::ClFp32CorrectlyRoundedDivideSqrt
                | CompileOpt::ClOptDisable
                | CompileOpt::ClMadEnable
                | CompileOpt::ClNoSignedZeros
                | CompileOpt::ClNoSignedZeroes
                | CompileOpt::ClUnsafeMathOptimizations
                | CompileOpt::ClExt => out.flags.push(arg.as_string()),
                CompileOpt::ClDenormsAreZero => {
                    out.flags.push("-fdenormal-fp-math=preserve-sign".to_string());
                }
                CompileOpt::S => {
                    if let Some(name) = arg.value().filter(|name| !name.is_empty()) {
                        out.source_name = self.normalize_source_name(name);
                    }
                    out.flags.push("-main-file-name".to_string());
                    out.flags.push(file_component(&out.source_name).to_string());
                }
                CompileOpt::ClFiniteMathOnly => {
                    out.flags.push(arg.as_string());
                    out.flags
                        .extend(DefineFlag::with_value("__FINITE_MATH_ONLY__", "1").to_args());
                }
                CompileOpt::ClFastRelaxedMath => {
                    out.flags.push(arg.as_string());
                    out.flags
                        .extend(DefineFlag::with_value("__FAST_RELAXED_MATH__", "1").to_args());
                }
                CompileOpt::ClStdCl11
                | CompileOpt::ClStdCl12
                | CompileOpt::ClStdCl20
                | CompileOpt::ClStdCl30 => {
                    out.std_ordinal = std_ordinal(arg.id());
                    out.flags.push(arg.as_string());
                }
                CompileOpt::Triple => {
                    out.triple = arg.value().map(str::to_string);
                }
                CompileOpt::X => {
                    if arg.value() != Some("spir") {
                        tracing::warn!(
                            target: "clfe",
                            stage = "options.compile.reconcile",
                            language = arg.value().unwrap_or_default(),
                            "ignoring -x with a language other than spir"
                        );
                    }
                }
                CompileOpt::Profiling | CompileOpt::GLineTablesOnly => {
                    out.flags.push("-debug-info-kind=line-tables-only".to_string());
                    out.flags.push("-dwarf-version=4".to_string());
                }
                CompileOpt::G => {
                    out.flags.push("-debug-info-kind=limited".to_string());
                    out.flags.push("-dwarf-version=4".to_string());
                    if self.host.windows {
                        out.flags.push("-gno-column-info".to_string());
                    }
                }
                CompileOpt::ClUniformWorkGroupSize
                | CompileOpt::ClNoSubgroupIfp
                | CompileOpt::TargetTriple
                | CompileOpt::SpirStd10
                | CompileOpt::SpirStd12
                | CompileOpt::ClKernelArgInfo
                | CompileOpt::DumpOptLlvm
                | CompileOpt::DumpOptAsm
                | CompileOpt::AutoPrefetchLevel0
                | CompileOpt::AutoPrefetchLevel1
                | CompileOpt::AutoPrefetchLevel2
                | CompileOpt::AutoPrefetchLevel3
                | CompileOpt::Input
                | CompileOpt::Unknown => {}
            }
        }

        out
    }

    fn normalize_source_name(&self, name: &str) -> String {
        let name = name.replace('\\', "/");
        if self.host.case_insensitive_fs {
            name.to_lowercase()
        } else {
            name
        }
    }
}

fn std_ordinal(id: CompileOpt) -> Option<u32> {
    match id {
        CompileOpt::ClStdCl11 => Some(110),
        CompileOpt::ClStdCl12 => Some(120),
        CompileOpt::ClStdCl20 => Some(200),
        CompileOpt::ClStdCl30 => Some(300),
        _ => None,
    }
}

fn file_component(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// Fixed flags appended after the translated arguments.
fn epilogue(flags: &[String], opencl_version: &str, triple: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(20);
    out.extend(DefineFlag::with_value("__OPENCL_VERSION__", opencl_version).to_args());
    out.extend(["-x", "cl"].map(String::from));
    out.extend(
        ["-cl-kernel-arg-info", "-fno-validate-pch", "-fno-caret-diagnostics"].map(String::from),
    );
    let has_emit_mode = flags
        .iter()
        .any(|flag| flag == "-S" || flag.starts_with("-emit"));
    if !has_emit_mode {
        out.push(EMIT_LLVM_BC.to_string());
    }
    out.extend(["-triple".to_string(), triple.to_string()]);
    out.extend(["-include", "opencl-c.h"].map(String::from));
    out.extend(
        [
            "-disable-llvm-passes",
            "-fgnu89-inline",
            "-cl-ext=-all",
            "-Werror=implicit-function-declaration",
        ]
        .map(String::from),
    );
    out
}

/// Detect `-cl-opt-disable` and rewrite `-emit-spirv` in place.
fn post_process(mut flags: Vec<String>) -> (Vec<String>, bool, bool) {
    let mut emit_spirv = false;
    let mut opt_disable = false;
    for flag in &mut flags {
        if flag == CL_OPT_DISABLE {
            opt_disable = true;
        } else if flag == EMIT_SPIRV {
            *flag = EMIT_LLVM_BC.to_string();
            emit_spirv = true;
        }
    }
    (flags, emit_spirv, opt_disable)
}

#[cfg(test)]
mod tests;
