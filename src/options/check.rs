//! Validation-only entry points for compile and link option strings.

use std::error::Error as StdError;
use std::fmt;

use super::args::{ArgList, ParsedArg, parse};
use super::table::{COMPILE_OPTIONS, LINK_OPTIONS, OptionGroup, OptionId, OptionTable};

/// Why an option string was rejected. Categories are checked in declaration order and only
/// the first non-empty one is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckFailure {
    /// Raw token of the first option whose value was missing.
    MissingArgument(String),
    /// Every unrecognised option, in input order.
    Unrecognized(Vec<String>),
    /// Every positional token; positionals are not accepted in validation mode.
    Positional(Vec<String>),
}

impl CheckFailure {
    /// Text written into the caller's report buffer.
    #[must_use]
    pub fn report(&self) -> String {
        match self {
            CheckFailure::MissingArgument(spelling) => spelling.clone(),
            CheckFailure::Unrecognized(spellings) | CheckFailure::Positional(spellings) => {
                spellings.join(" ")
            }
        }
    }
}

impl fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckFailure::MissingArgument(spelling) => {
                write!(f, "missing value for option `{spelling}`")
            }
            CheckFailure::Unrecognized(_) => write!(f, "unknown options: {}", self.report()),
            CheckFailure::Positional(_) => {
                write!(f, "positional arguments are not allowed: {}", self.report())
            }
        }
    }
}

impl StdError for CheckFailure {}

/// Validate `options` against `table`.
///
/// # Errors
///
/// Returns the first failing [`CheckFailure`] category.
pub fn check<Id: OptionId>(table: &OptionTable<Id>, options: &str) -> Result<(), CheckFailure> {
    let outcome = parse(table, options);
    if let Some(spelling) = outcome.missing_spelling() {
        return Err(CheckFailure::MissingArgument(spelling.to_string()));
    }
    let unknown = spellings(&outcome.args, OptionGroup::Unknown);
    if !unknown.is_empty() {
        return Err(CheckFailure::Unrecognized(unknown));
    }
    let inputs = spellings(&outcome.args, OptionGroup::Input);
    if !inputs.is_empty() {
        return Err(CheckFailure::Positional(inputs));
    }
    Ok(())
}

/// Validate a compile option string.
///
/// # Errors
///
/// See [`check`].
pub fn check_compile(options: &str) -> Result<(), CheckFailure> {
    check(&COMPILE_OPTIONS, options)
}

/// Validate a link option string.
///
/// # Errors
///
/// See [`check`].
pub fn check_link(options: &str) -> Result<(), CheckFailure> {
    check(&LINK_OPTIONS, options)
}

fn spellings<Id: OptionId>(args: &ArgList<Id>, group: OptionGroup) -> Vec<String> {
    args.filtered(group)
        .map(|arg: &ParsedArg<Id>| arg.spelling.clone())
        .collect()
}

/// Fill `buffer` with NULs, then copy as much of `report` as fits while keeping a final NUL.
pub fn write_report(buffer: &mut [u8], report: &str) {
    buffer.fill(0);
    let Some(capacity) = buffer.len().checked_sub(1) else {
        return;
    };
    let bytes = report.as_bytes();
    let len = bytes.len().min(capacity);
    buffer[..len].copy_from_slice(&bytes[..len]);
}

/// Apply a check result to the caller's report buffer; returns whether the options were valid.
/// The buffer is untouched on success.
pub fn report_into(result: &Result<(), CheckFailure>, buffer: &mut [u8]) -> bool {
    match result {
        Ok(()) => true,
        Err(failure) => {
            write_report(buffer, &failure.report());
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_compile_options_pass() {
        assert_eq!(
            check_compile("-cl-std=CL2.0 -D FOO -Iinc -s name -cl-ext=+all -g"),
            Ok(())
        );
    }

    #[test]
    fn missing_argument_takes_priority() {
        let failure = check_compile("-bogus -s").expect_err("missing value");
        assert_eq!(failure, CheckFailure::MissingArgument("-s".to_string()));
        assert_eq!(failure.report(), "-s");
    }

    #[test]
    fn unknown_options_are_space_joined() {
        let failure = check_compile("-w -foo file.cl -bar").expect_err("unknown options");
        assert_eq!(failure.report(), "-foo -bar");
    }

    #[test]
    fn positional_tokens_fail_validation() {
        let failure = check_link("-create-library a.bc b.bc").expect_err("positionals");
        assert_eq!(failure, CheckFailure::Positional(vec!["a.bc".into(), "b.bc".into()]));
        assert_eq!(failure.report(), "a.bc b.bc");
    }

    #[test]
    fn link_dialect_rejects_compile_only_options() {
        let failure = check_link("-enable-link-options -cl-mad-enable").expect_err("unknown");
        assert_eq!(failure.report(), "-cl-mad-enable");
    }

    #[test]
    fn report_buffer_is_nul_padded_and_truncated() {
        let mut buffer = [b'x'; 8];
        write_report(&mut buffer, "-foo");
        assert_eq!(&buffer, b"-foo\0\0\0\0");

        let mut small = [b'x'; 4];
        write_report(&mut small, "-toolong");
        assert_eq!(&small, b"-to\0");

        let mut empty: [u8; 0] = [];
        write_report(&mut empty, "-foo");
    }

    #[test]
    fn successful_check_leaves_buffer_untouched() {
        let mut buffer = [b'x'; 4];
        assert!(report_into(&check_compile("-w"), &mut buffer));
        assert_eq!(&buffer, b"xxxx");
        assert!(!report_into(&check_compile("-nope"), &mut buffer));
        assert_eq!(&buffer, b"-no\0");
    }

    #[test]
    fn display_names_the_category() {
        let failure = CheckFailure::Unrecognized(vec!["-a".into(), "-b".into()]);
        assert_eq!(failure.to_string(), "unknown options: -a -b");
    }
}
