//! Seams to the external collaborators: frontend compiler, IR linker, IR-to-SPIR-V translator
//! and the resource provider.

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;

/// Which collaborator reported a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Frontend,
    Linker,
    Translator,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKind::Frontend => f.write_str("frontend"),
            ServiceKind::Linker => f.write_str("linker"),
            ServiceKind::Translator => f.write_str("translator"),
        }
    }
}

/// Failure reported by a collaborator, with its diagnostic text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    pub kind: ServiceKind,
    pub message: String,
}

impl ServiceError {
    pub fn new(kind: ServiceKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for ServiceError {}

/// In-memory file visible to the frontend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualFile {
    pub name: String,
    pub contents: Vec<u8>,
}

impl VirtualFile {
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

/// One frontend run: ordered arguments (primary input last) plus the virtual file set.
#[derive(Debug, Clone, Copy)]
pub struct FrontendInvocation<'a> {
    pub args: &'a [String],
    pub files: &'a [VirtualFile],
}

impl FrontendInvocation<'_> {
    /// The primary input, which is always the final argument.
    #[must_use]
    pub fn primary_input(&self) -> Option<&str> {
        self.args.last().map(String::as_str)
    }

    #[must_use]
    pub fn file(&self, name: &str) -> Option<&VirtualFile> {
        self.files.iter().find(|file| file.name == name)
    }
}

/// What the frontend produced. Diagnostics are returned even when compilation fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontendOutput {
    pub success: bool,
    pub ir: Vec<u8>,
    pub log: String,
}

/// Options for the IR-to-SPIR-V translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslatorOptions {
    pub all_extensions: bool,
    pub mem_to_reg: bool,
    pub preserve_kernel_arg_type_metadata: bool,
}

/// Constant attached to function metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataValue {
    Int(u64),
    String(String),
}

impl MetadataValue {
    #[must_use]
    pub fn as_int(&self) -> Option<u64> {
        match self {
            MetadataValue::Int(value) => Some(*value),
            MetadataValue::String(_) => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::String(value) => Some(value),
            MetadataValue::Int(_) => None,
        }
    }
}

/// A function as seen through a parsed module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionDecl {
    pub name: String,
    /// Whether the function uses the SPIR kernel calling convention.
    pub is_kernel: bool,
    pub metadata: BTreeMap<String, Vec<MetadataValue>>,
}

impl FunctionDecl {
    #[must_use]
    pub fn metadata(&self, kind: &str) -> Option<&[MetadataValue]> {
        self.metadata.get(kind).map(Vec::as_slice)
    }
}

/// A parsed IR module handle.
pub trait IrModule {
    /// Operands of a named metadata list; each operand is a node of string values.
    fn named_metadata(&self, name: &str) -> Option<Vec<Vec<String>>>;

    /// Replace a named metadata list wholesale.
    fn replace_named_metadata(&mut self, name: &str, operands: Vec<Vec<String>>);

    fn function(&self, name: &str) -> Option<FunctionDecl>;
}

/// The frontend, IR linker and translator. Implementations need not be thread-safe
/// internally; callers serialise access per API surface.
pub trait Toolchain: Send + Sync {
    type Module: IrModule;

    /// One-time process initialisation (target registration and similar).
    fn initialize(&self) {}

    /// Release what [`Toolchain::initialize`] set up. Called at most once, before exit.
    fn terminate(&self) {}

    /// Run the frontend.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError`] when the frontend aborts rather than reporting diagnostics.
    fn compile(&self, invocation: &FrontendInvocation<'_>) -> Result<FrontendOutput, ServiceError>;

    /// Parse serialised IR.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError`] when the bytes are not a valid module.
    fn parse_module(&self, bytes: &[u8]) -> Result<Self::Module, ServiceError>;

    /// Link `other` into `composite`.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError`] when linking fails.
    fn link_modules(&self, composite: &mut Self::Module, other: Self::Module)
    -> Result<(), ServiceError>;

    /// Serialise a module.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError`] when serialisation fails.
    fn write_module(&self, module: &Self::Module) -> Result<Vec<u8>, ServiceError>;

    /// Translate serialised IR to SPIR-V.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError`] with the translator's message on failure.
    fn translate_to_spirv(
        &self,
        ir: &[u8],
        options: &TranslatorOptions,
    ) -> Result<Vec<u8>, ServiceError>;
}

/// Source of built-in headers and precompiled bundles, keyed by resource id.
pub trait ResourceProvider: Send + Sync {
    fn load(&self, id: &str) -> Option<Vec<u8>>;
}

impl<F> ResourceProvider for F
where
    F: Fn(&str) -> Option<Vec<u8>> + Send + Sync,
{
    fn load(&self, id: &str) -> Option<Vec<u8>> {
        self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocation_primary_input_is_last_argument() {
        let args = vec!["-x".to_string(), "cl".to_string(), "1".to_string()];
        let files = vec![VirtualFile::new("1", "kernel void k() {}")];
        let invocation = FrontendInvocation {
            args: &args,
            files: &files,
        };
        assert_eq!(invocation.primary_input(), Some("1"));
        assert!(invocation.file("1").is_some());
        assert!(invocation.file("2").is_none());
    }

    #[test]
    fn closures_are_resource_providers() {
        let provider = |id: &str| (id == "opencl-c.h").then(|| b"header".to_vec());
        assert_eq!(provider.load("opencl-c.h").as_deref(), Some(&b"header"[..]));
        assert_eq!(provider.load("missing"), None);
    }

    #[test]
    fn metadata_values_expose_their_payload() {
        assert_eq!(MetadataValue::Int(3).as_int(), Some(3));
        assert_eq!(MetadataValue::Int(3).as_str(), None);
        assert_eq!(MetadataValue::String("x".into()).as_str(), Some("x"));
    }
}
