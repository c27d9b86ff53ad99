//! Per-argument kernel information recovered from function metadata.

use std::error::Error as StdError;
use std::fmt;
use std::ops::BitOr;

use crate::services::{FunctionDecl, IrModule, MetadataValue};

pub const ADDR_SPACE_KIND: &str = "kernel_arg_addr_space";
pub const ACCESS_QUAL_KIND: &str = "kernel_arg_access_qual";
pub const TYPE_KIND: &str = "kernel_arg_type";
pub const TYPE_QUAL_KIND: &str = "kernel_arg_type_qual";
pub const NAME_KIND: &str = "kernel_arg_name";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressQualifier {
    Private,
    Global,
    Constant,
    Local,
}

impl AddressQualifier {
    #[must_use]
    pub fn from_address_space(space: u64) -> Option<Self> {
        match space {
            0 => Some(AddressQualifier::Private),
            1 => Some(AddressQualifier::Global),
            2 => Some(AddressQualifier::Constant),
            3 => Some(AddressQualifier::Local),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessQualifier {
    #[default]
    None,
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl AccessQualifier {
    #[must_use]
    pub fn parse(qualifier: &str) -> Self {
        match qualifier {
            "read_only" => AccessQualifier::ReadOnly,
            "write_only" => AccessQualifier::WriteOnly,
            "read_write" => AccessQualifier::ReadWrite,
            _ => AccessQualifier::None,
        }
    }
}

/// Bit set of type qualifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TypeQualifier(u32);

impl TypeQualifier {
    pub const NONE: Self = Self(0);
    pub const CONST: Self = Self(1);
    pub const RESTRICT: Self = Self(1 << 1);
    pub const VOLATILE: Self = Self(1 << 2);
    pub const PIPE: Self = Self(1 << 3);

    /// Keywords are matched anywhere in the qualifier string.
    #[must_use]
    pub fn parse(qualifiers: &str) -> Self {
        [
            ("const", Self::CONST),
            ("restrict", Self::RESTRICT),
            ("volatile", Self::VOLATILE),
            ("pipe", Self::PIPE),
        ]
        .into_iter()
        .filter(|(keyword, _)| qualifiers.contains(keyword))
        .fold(Self::NONE, |acc, (_, bit)| acc | bit)
    }

    #[must_use]
    pub fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for TypeQualifier {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgInfo {
    pub address_qualifier: AddressQualifier,
    pub access_qualifier: AccessQualifier,
    pub type_name: String,
    pub type_qualifier: TypeQualifier,
    /// Empty when the module carries no argument names.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KernelArgInfo {
    pub args: Vec<ArgInfo>,
}

impl KernelArgInfo {
    #[must_use]
    pub fn len(&self) -> usize {
        self.args.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelArgInfoError {
    FunctionNotFound(String),
    NotAKernel(String),
    MissingMetadata(&'static str),
    OperandCountMismatch {
        kind: &'static str,
        expected: usize,
        found: usize,
    },
    MalformedMetadata {
        kind: &'static str,
        index: usize,
    },
}

impl fmt::Display for KernelArgInfoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelArgInfoError::FunctionNotFound(name) => write!(f, "function `{name}` not found"),
            KernelArgInfoError::NotAKernel(name) => write!(f, "function `{name}` is not a kernel"),
            KernelArgInfoError::MissingMetadata(kind) => write!(f, "missing `{kind}` metadata"),
            KernelArgInfoError::OperandCountMismatch {
                kind,
                expected,
                found,
            } => write!(f, "`{kind}` has {found} operands, expected {expected}"),
            KernelArgInfoError::MalformedMetadata { kind, index } => {
                write!(f, "malformed `{kind}` operand {index}")
            }
        }
    }
}

impl StdError for KernelArgInfoError {}

/// Look up `kernel` in `module` and extract its argument info.
///
/// # Errors
///
/// Fails when the function is missing, is not a kernel, or its metadata is incomplete.
pub fn from_module<M: IrModule + ?Sized>(
    module: &M,
    kernel: &str,
) -> Result<KernelArgInfo, KernelArgInfoError> {
    let function = module
        .function(kernel)
        .ok_or_else(|| KernelArgInfoError::FunctionNotFound(kernel.to_string()))?;
    extract(&function)
}

/// Extract argument info from a kernel's metadata.
///
/// # Errors
///
/// Fails when the function is not a kernel or its metadata is incomplete.
pub fn extract(function: &FunctionDecl) -> Result<KernelArgInfo, KernelArgInfoError> {
    if !function.is_kernel {
        return Err(KernelArgInfoError::NotAKernel(function.name.clone()));
    }
    let address_spaces = required(function, ADDR_SPACE_KIND)?;
    let count = address_spaces.len();
    let access = sized(function, ACCESS_QUAL_KIND, count)?;
    let types = sized(function, TYPE_KIND, count)?;
    let type_quals = sized(function, TYPE_QUAL_KIND, count)?;
    let names = match function.metadata(NAME_KIND) {
        Some(names) => Some(check_count(NAME_KIND, names, count)?),
        None => None,
    };

    let mut args = Vec::with_capacity(count);
    for (index, space) in address_spaces.iter().enumerate() {
        let address_qualifier = space
            .as_int()
            .and_then(AddressQualifier::from_address_space)
            .ok_or(KernelArgInfoError::MalformedMetadata {
                kind: ADDR_SPACE_KIND,
                index,
            })?;
        let name = match names {
            Some(names) => string_at(names, NAME_KIND, index)?.to_string(),
            None => String::new(),
        };
        args.push(ArgInfo {
            address_qualifier,
            access_qualifier: AccessQualifier::parse(string_at(access, ACCESS_QUAL_KIND, index)?),
            type_name: string_at(types, TYPE_KIND, index)?.to_string(),
            type_qualifier: TypeQualifier::parse(string_at(type_quals, TYPE_QUAL_KIND, index)?),
            name,
        });
    }
    tracing::debug!(
        target: "clfe",
        stage = "driver.kernel_arg_info.extract",
        kernel = %function.name,
        args = args.len(),
    );
    Ok(KernelArgInfo { args })
}

fn required<'f>(
    function: &'f FunctionDecl,
    kind: &'static str,
) -> Result<&'f [MetadataValue], KernelArgInfoError> {
    function
        .metadata(kind)
        .ok_or(KernelArgInfoError::MissingMetadata(kind))
}

fn sized<'f>(
    function: &'f FunctionDecl,
    kind: &'static str,
    expected: usize,
) -> Result<&'f [MetadataValue], KernelArgInfoError> {
    check_count(kind, required(function, kind)?, expected)
}

fn check_count<'f>(
    kind: &'static str,
    values: &'f [MetadataValue],
    expected: usize,
) -> Result<&'f [MetadataValue], KernelArgInfoError> {
    if values.len() == expected {
        Ok(values)
    } else {
        Err(KernelArgInfoError::OperandCountMismatch {
            kind,
            expected,
            found: values.len(),
        })
    }
}

fn string_at<'f>(
    values: &'f [MetadataValue],
    kind: &'static str,
    index: usize,
) -> Result<&'f str, KernelArgInfoError> {
    values[index]
        .as_str()
        .ok_or(KernelArgInfoError::MalformedMetadata { kind, index })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn strings(values: &[&str]) -> Vec<MetadataValue> {
        values
            .iter()
            .map(|value| MetadataValue::String((*value).to_string()))
            .collect()
    }

    fn kernel(with_names: bool) -> FunctionDecl {
        let mut metadata = BTreeMap::new();
        metadata.insert(
            ADDR_SPACE_KIND.to_string(),
            vec![MetadataValue::Int(1), MetadataValue::Int(3), MetadataValue::Int(0)],
        );
        metadata.insert(
            ACCESS_QUAL_KIND.to_string(),
            strings(&["read_only", "read_write", "none"]),
        );
        metadata.insert(TYPE_KIND.to_string(), strings(&["float*", "int*", "uint"]));
        metadata.insert(
            TYPE_QUAL_KIND.to_string(),
            strings(&["const restrict", "volatile", ""]),
        );
        if with_names {
            metadata.insert(NAME_KIND.to_string(), strings(&["src", "scratch", "n"]));
        }
        FunctionDecl {
            name: "scale".into(),
            is_kernel: true,
            metadata,
        }
    }

    #[test]
    fn extracts_every_argument() {
        let info = extract(&kernel(true)).expect("kernel info");
        assert_eq!(info.len(), 3);

        let first = &info.args[0];
        assert_eq!(first.address_qualifier, AddressQualifier::Global);
        assert_eq!(first.access_qualifier, AccessQualifier::ReadOnly);
        assert_eq!(first.type_name, "float*");
        assert!(first.type_qualifier.contains(TypeQualifier::CONST));
        assert!(first.type_qualifier.contains(TypeQualifier::RESTRICT));
        assert!(!first.type_qualifier.contains(TypeQualifier::VOLATILE));
        assert_eq!(first.name, "src");

        assert_eq!(info.args[1].address_qualifier, AddressQualifier::Local);
        assert_eq!(info.args[1].access_qualifier, AccessQualifier::ReadWrite);
        assert_eq!(info.args[1].type_qualifier, TypeQualifier::VOLATILE);
        assert_eq!(info.args[2].address_qualifier, AddressQualifier::Private);
        assert_eq!(info.args[2].access_qualifier, AccessQualifier::None);
        assert!(info.args[2].type_qualifier.is_empty());
    }

    #[test]
    fn names_are_optional() {
        let info = extract(&kernel(false)).expect("kernel info");
        assert!(info.args.iter().all(|arg| arg.name.is_empty()));
    }

    #[test]
    fn non_kernel_is_rejected() {
        let mut function = kernel(true);
        function.is_kernel = false;
        assert_eq!(
            extract(&function),
            Err(KernelArgInfoError::NotAKernel("scale".into()))
        );
    }

    #[test]
    fn operand_count_mismatch_is_rejected() {
        let mut function = kernel(true);
        function
            .metadata
            .insert(TYPE_KIND.to_string(), strings(&["float*"]));
        assert_eq!(
            extract(&function),
            Err(KernelArgInfoError::OperandCountMismatch {
                kind: TYPE_KIND,
                expected: 3,
                found: 1,
            })
        );
    }

    #[test]
    fn unknown_address_space_is_malformed() {
        let mut function = kernel(true);
        function.metadata.insert(
            ADDR_SPACE_KIND.to_string(),
            vec![MetadataValue::Int(1), MetadataValue::Int(7), MetadataValue::Int(0)],
        );
        assert_eq!(
            extract(&function),
            Err(KernelArgInfoError::MalformedMetadata {
                kind: ADDR_SPACE_KIND,
                index: 1,
            })
        );
    }

    #[test]
    fn pipe_qualifier_is_detected() {
        let quals = TypeQualifier::parse("pipe");
        assert_eq!(quals.bits(), TypeQualifier::PIPE.bits());
    }
}
