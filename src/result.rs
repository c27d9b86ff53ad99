//! Status codes and result containers returned by the driver entry points.

use std::fmt;

use serde::Serialize;

/// Numeric status reported to callers. Values match the OpenCL error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Status {
    Success,
    OutOfHostMemory,
    CompileProgramFailure,
    LinkProgramFailure,
    KernelArgInfoNotAvailable,
}

impl Status {
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Status::Success => 0,
            Status::OutOfHostMemory => -6,
            Status::CompileProgramFailure => -15,
            Status::LinkProgramFailure => -17,
            Status::KernelArgInfoNotAvailable => -19,
        }
    }

    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Status::Success),
            -6 => Some(Status::OutOfHostMemory),
            -15 => Some(Status::CompileProgramFailure),
            -17 => Some(Status::LinkProgramFailure),
            -19 => Some(Status::KernelArgInfoNotAvailable),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_success(self) -> bool {
        self == Status::Success
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Success => "CL_SUCCESS",
            Status::OutOfHostMemory => "CL_OUT_OF_HOST_MEMORY",
            Status::CompileProgramFailure => "CL_COMPILE_PROGRAM_FAILURE",
            Status::LinkProgramFailure => "CL_LINK_PROGRAM_FAILURE",
            Status::KernelArgInfoNotAvailable => "CL_KERNEL_ARG_INFO_NOT_AVAILABLE",
        };
        write!(f, "{name} ({})", self.code())
    }
}

/// What kind of binary a result holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum IrType {
    #[default]
    Unknown,
    Executable,
    Library,
    CompiledObject,
}

/// Output of a compile or link call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BinaryResult {
    #[serde(skip)]
    pub ir: Vec<u8>,
    pub log: String,
    pub name: String,
    pub ir_type: IrType,
    pub status: Status,
}

impl BinaryResult {
    /// An empty successful result.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            ir: Vec::new(),
            log: String::new(),
            name: String::new(),
            ir_type: IrType::Unknown,
            status: Status::Success,
        }
    }

    #[must_use]
    pub fn failed(status: Status, log: impl Into<String>) -> Self {
        Self {
            log: log.into(),
            status,
            ..Self::empty()
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

impl Default for BinaryResult {
    fn default() -> Self {
        Self::empty()
    }
}

/// Status plus output. The output is absent only when the result itself could not be
/// allocated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T> {
    pub status: Status,
    pub output: Option<T>,
}

impl<T> Outcome<T> {
    #[must_use]
    pub fn new(status: Status, output: T) -> Self {
        Self {
            status,
            output: Some(output),
        }
    }

    #[must_use]
    pub fn out_of_memory() -> Self {
        Self {
            status: Status::OutOfHostMemory,
            output: None,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_opencl_values() {
        let expected = [
            (Status::Success, 0),
            (Status::OutOfHostMemory, -6),
            (Status::CompileProgramFailure, -15),
            (Status::LinkProgramFailure, -17),
            (Status::KernelArgInfoNotAvailable, -19),
        ];
        for (status, code) in expected {
            assert_eq!(status.code(), code);
            assert_eq!(Status::from_code(code), Some(status));
        }
        assert_eq!(Status::from_code(-1), None);
        assert_eq!(Status::LinkProgramFailure.to_string(), "CL_LINK_PROGRAM_FAILURE (-17)");
    }

    #[test]
    fn failed_result_keeps_log_and_status() {
        let result = BinaryResult::failed(Status::CompileProgramFailure, "boom");
        assert!(!result.is_success());
        assert_eq!(result.log, "boom");
        assert_eq!(result.ir_type, IrType::Unknown);
        assert!(result.ir.is_empty());
    }

    #[test]
    fn out_of_memory_outcome_has_no_output() {
        let outcome: Outcome<BinaryResult> = Outcome::out_of_memory();
        assert_eq!(outcome.status.code(), -6);
        assert!(outcome.output.is_none());
    }
}
