//! Compiler configuration recorded in a module's `opencl.compiler.options` metadata.

use serde::Serialize;

use crate::services::IrModule;

/// Name of the metadata list holding the recorded options.
pub const METADATA_NAME: &str = "opencl.compiler.options";

/// Boolean compiler settings tracked across a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompilerFlag {
    DebugInfo,
    Profiling,
    OptDisable,
    FastRelaxedMath,
    DenormsAreZero,
}

impl CompilerFlag {
    /// Every flag, in the order they are saved.
    pub const ALL: [CompilerFlag; 5] = [
        CompilerFlag::DebugInfo,
        CompilerFlag::Profiling,
        CompilerFlag::OptDisable,
        CompilerFlag::FastRelaxedMath,
        CompilerFlag::DenormsAreZero,
    ];

    #[must_use]
    pub fn spelling(self) -> &'static str {
        match self {
            CompilerFlag::DebugInfo => "-g",
            CompilerFlag::Profiling => "-profiling",
            CompilerFlag::OptDisable => "-cl-opt-disable",
            CompilerFlag::FastRelaxedMath => "-cl-fast-relaxed-math",
            CompilerFlag::DenormsAreZero => "-cl-denorms-are-zero",
        }
    }

    #[must_use]
    pub fn from_spelling(spelling: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|flag| flag.spelling() == spelling)
    }
}

/// Recorded compiler configuration of one module (or of a link in progress).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkMetadata {
    pub debug_info: bool,
    pub profiling: bool,
    pub opt_disable: bool,
    pub fast_relaxed_math: bool,
    pub denorms_are_zero: bool,
    /// Free-form options in first-seen order, without duplicates.
    options: Vec<String>,
}

impl LinkMetadata {
    /// Classify recorded tokens: flag spellings set booleans, anything else is a free-form option.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut metadata = Self::default();
        for token in tokens {
            metadata.insert(token.as_ref());
        }
        metadata
    }

    /// Read the first operand of the module's metadata list. Absent or empty metadata yields
    /// all flags cleared and no options.
    pub fn load<M: IrModule + ?Sized>(module: &M) -> Self {
        module
            .named_metadata(METADATA_NAME)
            .and_then(|operands| operands.into_iter().next())
            .map(Self::from_tokens)
            .unwrap_or_default()
    }

    /// Replace the module's metadata list with a single operand holding this configuration.
    pub fn save<M: IrModule + ?Sized>(&self, module: &mut M) {
        module.replace_named_metadata(METADATA_NAME, vec![self.to_tokens()]);
    }

    /// Set flags in their fixed order, then free-form options.
    #[must_use]
    pub fn to_tokens(&self) -> Vec<String> {
        CompilerFlag::ALL
            .into_iter()
            .filter(|flag| self.flag(*flag))
            .map(|flag| flag.spelling().to_string())
            .chain(self.options.iter().cloned())
            .collect()
    }

    pub fn insert(&mut self, token: &str) {
        match CompilerFlag::from_spelling(token) {
            Some(flag) => self.set_flag(flag, true),
            None => self.add_option(token),
        }
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn flag(&self, flag: CompilerFlag) -> bool {
        match flag {
            CompilerFlag::DebugInfo => self.debug_info,
            CompilerFlag::Profiling => self.profiling,
            CompilerFlag::OptDisable => self.opt_disable,
            CompilerFlag::FastRelaxedMath => self.fast_relaxed_math,
            CompilerFlag::DenormsAreZero => self.denorms_are_zero,
        }
    }

    pub fn set_flag(&mut self, flag: CompilerFlag, value: bool) {
        let slot = match flag {
            CompilerFlag::DebugInfo => &mut self.debug_info,
            CompilerFlag::Profiling => &mut self.profiling,
            CompilerFlag::OptDisable => &mut self.opt_disable,
            CompilerFlag::FastRelaxedMath => &mut self.fast_relaxed_math,
            CompilerFlag::DenormsAreZero => &mut self.denorms_are_zero,
        };
        *slot = value;
    }

    /// Fold `other` in: capabilities survive only when every module has them, a module that
    /// needs unoptimised code keeps the result unoptimised, and free-form options are unioned.
    pub fn merge(&mut self, other: &LinkMetadata) {
        self.debug_info &= other.debug_info;
        self.profiling &= other.profiling;
        self.fast_relaxed_math &= other.fast_relaxed_math;
        self.denorms_are_zero &= other.denorms_are_zero;
        self.opt_disable |= other.opt_disable;
        for option in &other.options {
            self.add_option(option);
        }
    }

    fn add_option(&mut self, option: &str) {
        if !self.options.iter().any(|existing| existing == option) {
            self.options.push(option.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(tokens: &[&str]) -> LinkMetadata {
        LinkMetadata::from_tokens(tokens)
    }

    #[test]
    fn tokens_split_into_flags_and_options() {
        let metadata = meta(&["-g", "-cl-mad-enable", "-cl-denorms-are-zero", "-cl-mad-enable"]);
        assert!(metadata.debug_info);
        assert!(metadata.denorms_are_zero);
        assert!(!metadata.profiling);
        assert_eq!(metadata.options(), ["-cl-mad-enable"]);
    }

    #[test]
    fn saved_tokens_put_flags_first_in_fixed_order() {
        let metadata = meta(&["-x-custom", "-cl-denorms-are-zero", "-g", "-profiling"]);
        assert_eq!(
            metadata.to_tokens(),
            vec!["-g", "-profiling", "-cl-denorms-are-zero", "-x-custom"]
        );
    }

    #[test]
    fn merge_applies_per_field_operators() {
        let mut left = meta(&["-g", "-profiling", "-cl-fast-relaxed-math", "-cl-denorms-are-zero"]);
        let right = meta(&["-g", "-cl-opt-disable"]);
        left.merge(&right);
        assert!(left.debug_info);
        assert!(!left.profiling);
        assert!(!left.fast_relaxed_math);
        assert!(!left.denorms_are_zero);
        assert!(left.opt_disable);
    }

    #[test]
    fn merge_is_commutative_and_idempotent() {
        let samples = [
            meta(&["-g", "-opt-a"]),
            meta(&["-cl-opt-disable", "-cl-fast-relaxed-math"]),
            meta(&["-profiling", "-g", "-cl-denorms-are-zero", "-opt-b"]),
            meta(&[]),
        ];
        let booleans = |m: &LinkMetadata| CompilerFlag::ALL.map(|flag| m.flag(flag));
        for a in &samples {
            let mut same = a.clone();
            same.merge(a);
            assert_eq!(&same, a);
            for b in &samples {
                let mut ab = a.clone();
                ab.merge(b);
                let mut ba = b.clone();
                ba.merge(a);
                assert_eq!(booleans(&ab), booleans(&ba));
                let mut ab_opts = ab.options().to_vec();
                let mut ba_opts = ba.options().to_vec();
                ab_opts.sort();
                ba_opts.sort();
                assert_eq!(ab_opts, ba_opts);
                for c in &samples {
                    let mut left = ab.clone();
                    left.merge(c);
                    let mut bc = b.clone();
                    bc.merge(c);
                    let mut right = a.clone();
                    right.merge(&bc);
                    assert_eq!(booleans(&left), booleans(&right));
                }
            }
        }
    }

    #[test]
    fn dropped_flag_does_not_return_through_union() {
        let mut aggregate = meta(&["-g"]);
        aggregate.merge(&meta(&["-opt"]));
        aggregate.merge(&meta(&["-g"]));
        assert!(!aggregate.debug_info);
        assert_eq!(aggregate.to_tokens(), vec!["-opt"]);
    }

    #[test]
    fn flag_spellings_round_trip() {
        for flag in CompilerFlag::ALL {
            assert_eq!(CompilerFlag::from_spelling(flag.spelling()), Some(flag));
        }
        assert_eq!(CompilerFlag::from_spelling("-cl-mad-enable"), None);
    }
}
