//! Synchronous entry points: compile, link, option validation and kernel-argument queries.
//!
//! Every entry point converts failures into a [`Status`] at this boundary; nothing here panics
//! on bad input.

use std::fs;
use std::path::Path;

use crate::config::FrontendConfig;
use crate::error::{Error, Result};
use crate::kernel_arg_info::{self, KernelArgInfo};
use crate::link::MetadataLinker;
use crate::options::check::report_into;
use crate::options::{CheckFailure, CompileReconciler, EffectiveConfiguration, LinkDirectives};
use crate::resources::{BUILTIN_HEADERS, ResourceManager};
use crate::result::{BinaryResult, IrType, Outcome, Status};
use crate::services::{
    FrontendInvocation, ResourceProvider, Toolchain, TranslatorOptions, VirtualFile,
};
use crate::session::{ApiSurface, Session, session};

/// One compile call.
#[derive(Debug, Clone, Copy)]
pub struct CompileRequest<'a> {
    pub source: &'a [u8],
    /// Additional in-memory headers, registered after the builtin ones.
    pub headers: &'a [VirtualFile],
    pub options: &'a str,
    /// Appended after the reconciled flags, split on spaces only.
    pub extra_options: &'a str,
    pub opencl_version: &'a str,
}

impl<'a> CompileRequest<'a> {
    #[must_use]
    pub fn new(source: &'a [u8], options: &'a str) -> Self {
        Self {
            source,
            headers: &[],
            options,
            extra_options: "",
            opencl_version: crate::config::DEFAULT_OPENCL_VERSION,
        }
    }

    #[must_use]
    pub fn with_headers(mut self, headers: &'a [VirtualFile]) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn with_extra_options(mut self, extra_options: &'a str) -> Self {
        self.extra_options = extra_options;
        self
    }

    #[must_use]
    pub fn with_opencl_version(mut self, opencl_version: &'a str) -> Self {
        self.opencl_version = opencl_version;
        self
    }
}

/// Front end bound to a toolchain and a resource provider.
pub struct Frontend<T, P> {
    toolchain: T,
    resources: ResourceManager<P>,
    config: FrontendConfig,
    reconciler: CompileReconciler,
    session: &'static Session,
}

impl<T: Toolchain, P: ResourceProvider> Frontend<T, P> {
    /// Configuration comes from the environment.
    pub fn new(toolchain: T, provider: P) -> Self {
        Self::with_config(toolchain, provider, FrontendConfig::from_env())
    }

    pub fn with_config(toolchain: T, provider: P, config: FrontendConfig) -> Self {
        let reconciler = CompileReconciler::from_config(&config);
        Self {
            toolchain,
            resources: ResourceManager::new(provider),
            config,
            reconciler,
            session: session(),
        }
    }

    /// Use `session` instead of the process-wide one.
    #[must_use]
    pub fn with_session(mut self, session: &'static Session) -> Self {
        self.session = session;
        self
    }

    pub fn config(&self) -> &FrontendConfig {
        &self.config
    }

    pub fn toolchain(&self) -> &T {
        &self.toolchain
    }

    fn ensure_initialized(&self) {
        self.session.initialize_once(|| self.toolchain.initialize());
    }

    /// Release process-wide toolchain state. Runs at most once per session, and only when the
    /// toolchain was initialised; call it before process exit.
    pub fn shutdown(&self) {
        self.session.terminate_once(|| self.toolchain.terminate());
    }

    /// Compile one translation unit. Frontend diagnostics are returned in the log whether or
    /// not compilation succeeded.
    pub fn compile(&self, request: &CompileRequest<'_>) -> Outcome<BinaryResult> {
        self.ensure_initialized();
        let _guard = self.session.lock(ApiSurface::Compile);
        match self.try_compile(request) {
            Ok(result) => Outcome::new(result.status, result),
            Err(err) => failure(Status::CompileProgramFailure, &err),
        }
    }

    fn try_compile(&self, request: &CompileRequest<'_>) -> Result<BinaryResult> {
        let program_id = self.session.next_program_id();
        self.dump_options(request);
        let effective = self.reconciler.process(
            request.options,
            request.extra_options,
            request.opencl_version,
            program_id,
        );
        tracing::debug!(
            target: "clfe",
            stage = "driver.compile.start",
            program_id,
            command_line = %effective.command_line(),
        );
        let files = self.virtual_files(request, &effective)?;
        let output = self.toolchain.compile(&FrontendInvocation {
            args: &effective.flags,
            files: &files,
        })?;

        let mut result = BinaryResult {
            ir: Vec::new(),
            log: output.log,
            name: effective.source_name.clone(),
            ir_type: IrType::CompiledObject,
            status: Status::Success,
        };
        if !output.success {
            result.status = Status::CompileProgramFailure;
            tracing::debug!(target: "clfe", stage = "driver.compile.failed", program_id);
            return Ok(result);
        }

        result.ir = if effective.emit_spirv {
            let options = TranslatorOptions {
                all_extensions: true,
                mem_to_reg: !effective.opt_disable,
                preserve_kernel_arg_type_metadata: true,
            };
            match self.toolchain.translate_to_spirv(&output.ir, &options) {
                Ok(spirv) => spirv,
                Err(err) => {
                    if !result.log.is_empty() && !result.log.ends_with('\n') {
                        result.log.push('\n');
                    }
                    result.log.push_str(&err.message);
                    result.status = Status::CompileProgramFailure;
                    return Ok(result);
                }
            }
        } else {
            output.ir
        };
        tracing::debug!(
            target: "clfe",
            stage = "driver.compile.done",
            program_id,
            spirv = effective.emit_spirv,
            bytes = result.ir.len(),
        );
        Ok(result)
    }

    /// Source under the derived name, builtin headers, caller headers, then the module bundle.
    fn virtual_files(
        &self,
        request: &CompileRequest<'_>,
        effective: &EffectiveConfiguration,
    ) -> Result<Vec<VirtualFile>> {
        let mut files = Vec::new();
        files.try_reserve(BUILTIN_HEADERS.len() + request.headers.len() + 2)?;
        files.push(VirtualFile::new(
            effective.source_name.clone(),
            copy_bytes(request.source)?,
        ));
        for header in BUILTIN_HEADERS {
            let contents = self.resources.get(header, true)?;
            files.push(VirtualFile::new(header, copy_bytes(&contents)?));
        }
        for header in request.headers {
            files.push(VirtualFile::new(
                header.name.clone(),
                copy_bytes(&header.contents)?,
            ));
        }
        if let Some(bundle) = effective.bundle {
            let name = bundle.file_name();
            let contents = self.resources.get(&name, false)?;
            files.push(VirtualFile::new(name, copy_bytes(&contents)?));
        }
        Ok(files)
    }

    fn dump_options(&self, request: &CompileRequest<'_>) {
        let Some(dir) = self.config.options_dump_dir.as_deref() else {
            return;
        };
        let index = self.session.next_dump_index();
        if let Err(err) = write_options_dump(dir, index, request) {
            tracing::warn!(
                target: "clfe",
                stage = "driver.compile.dump",
                dir = %dir.display(),
                error = %err,
                "failed to write options dump"
            );
        }
    }

    /// Link compiled modules into one. Zero inputs yield an empty successful result.
    pub fn link(&self, binaries: &[&[u8]], options: &str) -> Outcome<BinaryResult> {
        if binaries.is_empty() {
            return Outcome::new(Status::Success, BinaryResult::empty());
        }
        self.ensure_initialized();
        let _guard = self.session.lock(ApiSurface::Link);
        match self.try_link(binaries, options) {
            Ok(result) => Outcome::new(result.status, result),
            Err(err) => failure(Status::LinkProgramFailure, &err),
        }
    }

    fn try_link(&self, binaries: &[&[u8]], options: &str) -> Result<BinaryResult> {
        let directives = LinkDirectives::parse(options);
        let ir_type = if directives.create_library {
            IrType::Library
        } else {
            IrType::Executable
        };
        let Some((first, rest)) = binaries.split_first() else {
            return Ok(BinaryResult::empty());
        };
        tracing::debug!(
            target: "clfe",
            stage = "driver.link.start",
            modules = binaries.len(),
            library = directives.create_library,
        );

        let mut composite = self.toolchain.parse_module(first)?;
        let mut linker = MetadataLinker::new(directives);
        linker.add_module(&composite);
        for bytes in rest {
            let module = self.toolchain.parse_module(bytes)?;
            linker.add_module(&module);
            self.toolchain.link_modules(&mut composite, module)?;
        }
        linker.save(&mut composite);
        let ir = self.toolchain.write_module(&composite)?;
        tracing::debug!(target: "clfe", stage = "driver.link.done", bytes = ir.len());
        Ok(BinaryResult {
            ir,
            log: String::new(),
            name: String::new(),
            ir_type,
            status: Status::Success,
        })
    }

    /// Argument info for `kernel` in a compiled module.
    pub fn get_kernel_arg_info(&self, module: &[u8], kernel: &str) -> Outcome<KernelArgInfo> {
        self.ensure_initialized();
        let _guard = self.session.lock(ApiSurface::KernelArgInfo);
        let result = self
            .toolchain
            .parse_module(module)
            .map_err(Error::from)
            .and_then(|module| kernel_arg_info::from_module(&module, kernel).map_err(Error::from));
        match result {
            Ok(info) => Outcome::new(Status::Success, info),
            Err(Error::OutOfMemory) => Outcome::out_of_memory(),
            Err(err) => {
                tracing::debug!(
                    target: "clfe",
                    stage = "driver.kernel_arg_info.failed",
                    kernel,
                    error = %err,
                );
                Outcome::new(Status::KernelArgInfoNotAvailable, KernelArgInfo::default())
            }
        }
    }

    /// See [`check_compile_options`].
    ///
    /// # Errors
    ///
    /// Returns the first failing [`CheckFailure`] category.
    pub fn check_compile_options(&self, options: &str) -> std::result::Result<(), CheckFailure> {
        check_compile_options_in(self.session, options, &self.config.opencl_version)
    }

    /// See [`check_link_options`].
    ///
    /// # Errors
    ///
    /// Returns the first failing [`CheckFailure`] category.
    pub fn check_link_options(&self, options: &str) -> std::result::Result<(), CheckFailure> {
        check_link_options_in(self.session, options)
    }
}

impl<T, P> std::fmt::Debug for Frontend<T, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frontend")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Validate a compile option string under the process-wide compile-check lock.
///
/// # Errors
///
/// Returns the first failing [`CheckFailure`] category.
pub fn check_compile_options(options: &str) -> std::result::Result<(), CheckFailure> {
    check_compile_options_in(session(), options, crate::config::DEFAULT_OPENCL_VERSION)
}

/// Validate a link option string under the process-wide link-check lock.
///
/// # Errors
///
/// Returns the first failing [`CheckFailure`] category.
pub fn check_link_options(options: &str) -> std::result::Result<(), CheckFailure> {
    check_link_options_in(session(), options)
}

/// Buffer form of [`check_compile_options`]: on failure `buffer` is NUL-filled and receives
/// the report, truncated to leave a final NUL.
pub fn check_compile_options_into(options: &str, buffer: &mut [u8]) -> bool {
    report_into(&check_compile_options(options), buffer)
}

/// Buffer form of [`check_link_options`].
pub fn check_link_options_into(options: &str, buffer: &mut [u8]) -> bool {
    report_into(&check_link_options(options), buffer)
}

fn check_compile_options_in(
    session: &Session,
    options: &str,
    opencl_version: &str,
) -> std::result::Result<(), CheckFailure> {
    let _guard = session.lock(ApiSurface::CompileOptionsCheck);
    let outcome = crate::options::check_compile(options);
    tracing::debug!(
        target: "clfe",
        stage = "driver.check.compile",
        opencl_version,
        valid = outcome.is_ok(),
    );
    outcome
}

fn check_link_options_in(session: &Session, options: &str) -> std::result::Result<(), CheckFailure> {
    let _guard = session.lock(ApiSurface::LinkOptionsCheck);
    let outcome = crate::options::check_link(options);
    tracing::debug!(target: "clfe", stage = "driver.check.link", valid = outcome.is_ok());
    outcome
}

fn failure(status: Status, err: &Error) -> Outcome<BinaryResult> {
    if matches!(err, Error::OutOfMemory) {
        return Outcome::out_of_memory();
    }
    tracing::debug!(target: "clfe", stage = "driver.failure", status = %status, error = %err);
    Outcome::new(status, BinaryResult::failed(status, err.log_message()))
}

fn copy_bytes(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    out.try_reserve_exact(bytes.len())?;
    out.extend_from_slice(bytes);
    Ok(out)
}

fn write_options_dump(dir: &Path, index: u64, request: &CompileRequest<'_>) -> Result<()> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("log_{}_{index}.txt", std::process::id()));
    let mut contents = format!(
        "options={}\nextra_options={}\nopencl_version={}\n",
        request.options, request.extra_options, request.opencl_version
    );
    contents.push_str(&String::from_utf8_lossy(request.source));
    fs::write(&path, contents)?;
    tracing::debug!(target: "clfe", stage = "driver.compile.dump", path = %path.display());
    Ok(())
}
