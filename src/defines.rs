//! Macro definitions synthesised into frontend flag lists.

use std::fmt;

/// A `-D NAME[=VALUE]` definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefineFlag {
    pub name: String,
    pub value: Option<String>,
}

impl DefineFlag {
    #[must_use]
    pub fn new(name: impl Into<String>, value: Option<String>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// `NAME=VALUE` definition.
    #[must_use]
    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, Some(value.into()))
    }

    /// The two frontend arguments `-D` and `NAME[=VALUE]`.
    #[must_use]
    pub fn to_args(&self) -> [String; 2] {
        ["-D".to_string(), self.to_string()]
    }
}

impl fmt::Display for DefineFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}={value}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_as_two_arguments() {
        let define = DefineFlag::with_value("__FAST_RELAXED_MATH__", "1");
        assert_eq!(define.to_args(), ["-D".to_string(), "__FAST_RELAXED_MATH__=1".to_string()]);
        assert_eq!(DefineFlag::new("FOO", None).to_string(), "FOO");
    }
}
