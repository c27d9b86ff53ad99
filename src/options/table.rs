//! Static option registries for the compile and link dialects.
//!
//! Each dialect is a closed enum of option identities plus a static table mapping spellings to
//! those identities, so downstream `match`es stay exhaustive.

use std::fmt;

/// How an option consumes its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// Positional argument (does not start with an option prefix).
    Input,
    /// Token that starts with an option prefix but matches nothing.
    Unknown,
    /// No value: `-w`.
    Flag,
    /// Value glued to the spelling: `-dump-opt-llvm=file`.
    Joined,
    /// Value in the next token: `-s name`.
    Separate,
    /// Either glued or in the next token: `-Dfoo` or `-D foo`.
    JoinedOrSeparate,
}

impl OptionKind {
    /// Whether the option participates in spelling lookup.
    #[must_use]
    pub fn is_matchable(self) -> bool {
        !matches!(self, OptionKind::Input | OptionKind::Unknown)
    }
}

/// Coarse classification used for filtering parsed arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionGroup {
    Input,
    Unknown,
    Preprocessor,
    Diagnostics,
    Math,
    Standard,
    Debug,
    Target,
    Extensions,
    Ignored,
    Link,
}

/// Identity type of one option dialect.
pub trait OptionId: Copy + Eq + fmt::Debug + 'static {
    /// Identity assigned to positional arguments.
    const INPUT: Self;
    /// Identity assigned to unrecognised options.
    const UNKNOWN: Self;
}

/// Immutable option descriptor.
#[derive(Debug)]
pub struct OptionInfo<Id: 'static> {
    pub id: Id,
    pub prefixes: &'static [&'static str],
    pub name: &'static str,
    pub kind: OptionKind,
    pub group: OptionGroup,
    /// When set, downstream dispatch sees this identity instead of `id`.
    pub alias: Option<Id>,
}

impl<Id: OptionId> OptionInfo<Id> {
    /// Identity after alias resolution.
    #[must_use]
    pub fn effective_id(&self) -> Id {
        self.alias.unwrap_or(self.id)
    }

    /// Remainder of `token` after this option's spelling, if the spelling is a prefix of it.
    /// Returns the spelling length alongside so callers can prefer the longest match.
    #[must_use]
    pub fn strip_spelling<'t>(&self, token: &'t str) -> Option<(&'t str, usize)> {
        self.prefixes.iter().find_map(|prefix| {
            token
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix(self.name))
                .map(|rest| (rest, prefix.len() + self.name.len()))
        })
    }

    /// Canonical spelling using the first prefix.
    #[must_use]
    pub fn spelling(&self) -> String {
        let prefix = self.prefixes.first().copied().unwrap_or_default();
        format!("{prefix}{}", self.name)
    }
}

/// A dialect's full option registry.
#[derive(Debug)]
pub struct OptionTable<Id: 'static> {
    dialect: &'static str,
    infos: &'static [OptionInfo<Id>],
}

impl<Id: OptionId> OptionTable<Id> {
    #[must_use]
    pub const fn new(dialect: &'static str, infos: &'static [OptionInfo<Id>]) -> Self {
        Self { dialect, infos }
    }

    #[must_use]
    pub fn dialect(&self) -> &'static str {
        self.dialect
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static OptionInfo<Id>> {
        self.infos.iter()
    }

    /// Look up the descriptor registered for `id`.
    #[must_use]
    pub fn info(&self, id: Id) -> Option<&'static OptionInfo<Id>> {
        self.infos.iter().find(|info| info.id == id)
    }

    /// Descriptors whose spelling prefixes `token`, longest spelling first.
    #[must_use]
    pub fn candidates<'t>(&self, token: &'t str) -> Vec<(&'static OptionInfo<Id>, &'t str)> {
        let mut found: Vec<_> = self
            .infos
            .iter()
            .filter(|info| info.kind.is_matchable())
            .filter_map(|info| {
                info.strip_spelling(token)
                    .map(|(rest, len)| (info, rest, len))
            })
            .collect();
        found.sort_by(|a, b| b.2.cmp(&a.2));
        found.into_iter().map(|(info, rest, _)| (info, rest)).collect()
    }

    /// Whether `token` starts with any prefix this dialect uses for options.
    #[must_use]
    pub fn has_option_prefix(&self, token: &str) -> bool {
        self.infos
            .iter()
            .flat_map(|info| info.prefixes.iter())
            .any(|prefix| token.starts_with(prefix))
    }

    pub(crate) fn special(&self, id: Id) -> &'static OptionInfo<Id> {
        match self.info(id) {
            Some(info) => info,
            None => unreachable!("{} option table lacks {id:?}", self.dialect),
        }
    }
}

const DASH: &[&str] = &["-"];

const fn special<Id>(id: Id, name: &'static str, kind: OptionKind, group: OptionGroup) -> OptionInfo<Id> {
    OptionInfo {
        id,
        prefixes: &[],
        name,
        kind,
        group,
        alias: None,
    }
}

const fn opt<Id>(id: Id, name: &'static str, kind: OptionKind, group: OptionGroup) -> OptionInfo<Id> {
    OptionInfo {
        id,
        prefixes: DASH,
        name,
        kind,
        group,
        alias: None,
    }
}

const fn alias<Id>(id: Id, name: &'static str, group: OptionGroup, target: Id) -> OptionInfo<Id> {
    OptionInfo {
        id,
        prefixes: DASH,
        name,
        kind: OptionKind::Flag,
        group,
        alias: Some(target),
    }
}

/// Compile-time option identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompileOpt {
    Input,
    Unknown,
    W,
    D,
    I,
    Werror,
    ClSinglePrecisionConstant,
    ClDenormsAreZero,
    ClFp32CorrectlyRoundedDivideSqrt,
    ClOptDisable,
    ClMadEnable,
    ClNoSignedZeros,
    ClNoSignedZeroes,
    ClUnsafeMathOptimizations,
    ClFiniteMathOnly,
    ClFastRelaxedMath,
    ClStdCl11,
    ClStdCl12,
    ClStdCl20,
    ClStdCl30,
    ClUniformWorkGroupSize,
    ClNoSubgroupIfp,
    ClKernelArgInfo,
    ClExt,
    X,
    S,
    Triple,
    TargetTriple,
    SpirStd10,
    SpirStd12,
    DumpOptLlvm,
    DumpOptAsm,
    AutoPrefetchLevel0,
    AutoPrefetchLevel1,
    AutoPrefetchLevel2,
    AutoPrefetchLevel3,
    Profiling,
    G,
    GLineTablesOnly,
}

impl OptionId for CompileOpt {
    const INPUT: Self = CompileOpt::Input;
    const UNKNOWN: Self = CompileOpt::Unknown;
}

/// Link-time option identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkOpt {
    Input,
    Unknown,
    CreateLibrary,
    EnableLinkOptions,
    ClDenormsAreZero,
    ClNoSignedZeros,
    ClNoSignedZeroes,
    ClUnsafeMathOptimizations,
    ClFiniteMathOnly,
    ClFastRelaxedMath,
}

impl OptionId for LinkOpt {
    const INPUT: Self = LinkOpt::Input;
    const UNKNOWN: Self = LinkOpt::Unknown;
}

use OptionGroup as G;
use OptionKind as K;

static COMPILE_INFOS: [OptionInfo<CompileOpt>; 39] = [
    special(CompileOpt::Input, "<input>", K::Input, G::Input),
    special(CompileOpt::Unknown, "<unknown>", K::Unknown, G::Unknown),
    opt(CompileOpt::W, "w", K::Flag, G::Diagnostics),
    opt(CompileOpt::D, "D", K::JoinedOrSeparate, G::Preprocessor),
    opt(CompileOpt::I, "I", K::JoinedOrSeparate, G::Preprocessor),
    opt(CompileOpt::Werror, "Werror", K::Flag, G::Diagnostics),
    opt(CompileOpt::ClSinglePrecisionConstant, "cl-single-precision-constant", K::Flag, G::Math),
    opt(CompileOpt::ClDenormsAreZero, "cl-denorms-are-zero", K::Flag, G::Math),
    opt(
        CompileOpt::ClFp32CorrectlyRoundedDivideSqrt,
        "cl-fp32-correctly-rounded-divide-sqrt",
        K::Flag,
        G::Math,
    ),
    opt(CompileOpt::ClOptDisable, "cl-opt-disable", K::Flag, G::Math),
    opt(CompileOpt::ClMadEnable, "cl-mad-enable", K::Flag, G::Math),
    opt(CompileOpt::ClNoSignedZeros, "cl-no-signed-zeros", K::Flag, G::Math),
    alias(CompileOpt::ClNoSignedZeroes, "cl-no-signed-zeroes", G::Math, CompileOpt::ClNoSignedZeros),
    opt(CompileOpt::ClUnsafeMathOptimizations, "cl-unsafe-math-optimizations", K::Flag, G::Math),
    opt(CompileOpt::ClFiniteMathOnly, "cl-finite-math-only", K::Flag, G::Math),
    opt(CompileOpt::ClFastRelaxedMath, "cl-fast-relaxed-math", K::Flag, G::Math),
    opt(CompileOpt::ClStdCl11, "cl-std=CL1.1", K::Flag, G::Standard),
    opt(CompileOpt::ClStdCl12, "cl-std=CL1.2", K::Flag, G::Standard),
    opt(CompileOpt::ClStdCl20, "cl-std=CL2.0", K::Flag, G::Standard),
    opt(CompileOpt::ClStdCl30, "cl-std=CL3.0", K::Flag, G::Standard),
    opt(CompileOpt::ClUniformWorkGroupSize, "cl-uniform-work-group-size", K::Flag, G::Ignored),
    opt(CompileOpt::ClNoSubgroupIfp, "cl-no-subgroup-ifp", K::Flag, G::Ignored),
    opt(CompileOpt::ClKernelArgInfo, "cl-kernel-arg-info", K::Flag, G::Ignored),
    opt(CompileOpt::ClExt, "cl-ext=", K::Joined, G::Extensions),
    opt(CompileOpt::X, "x", K::Separate, G::Target),
    opt(CompileOpt::S, "s", K::Separate, G::Debug),
    opt(CompileOpt::Triple, "triple", K::Separate, G::Target),
    opt(CompileOpt::TargetTriple, "target-triple", K::Separate, G::Ignored),
    opt(CompileOpt::SpirStd10, "spir-std=1.0", K::Flag, G::Ignored),
    opt(CompileOpt::SpirStd12, "spir-std=1.2", K::Flag, G::Ignored),
    opt(CompileOpt::DumpOptLlvm, "dump-opt-llvm=", K::Joined, G::Ignored),
    opt(CompileOpt::DumpOptAsm, "dump-opt-asm=", K::Joined, G::Ignored),
    opt(CompileOpt::AutoPrefetchLevel0, "auto-prefetch-level=0", K::Flag, G::Ignored),
    opt(CompileOpt::AutoPrefetchLevel1, "auto-prefetch-level=1", K::Flag, G::Ignored),
    opt(CompileOpt::AutoPrefetchLevel2, "auto-prefetch-level=2", K::Flag, G::Ignored),
    opt(CompileOpt::AutoPrefetchLevel3, "auto-prefetch-level=3", K::Flag, G::Ignored),
    opt(CompileOpt::Profiling, "profiling", K::Flag, G::Debug),
    opt(CompileOpt::G, "g", K::Flag, G::Debug),
    opt(CompileOpt::GLineTablesOnly, "gline-tables-only", K::Flag, G::Debug),
];

static LINK_INFOS: [OptionInfo<LinkOpt>; 10] = [
    special(LinkOpt::Input, "<input>", K::Input, G::Input),
    special(LinkOpt::Unknown, "<unknown>", K::Unknown, G::Unknown),
    opt(LinkOpt::CreateLibrary, "create-library", K::Flag, G::Link),
    opt(LinkOpt::EnableLinkOptions, "enable-link-options", K::Flag, G::Link),
    opt(LinkOpt::ClDenormsAreZero, "cl-denorms-are-zero", K::Flag, G::Math),
    opt(LinkOpt::ClNoSignedZeros, "cl-no-signed-zeros", K::Flag, G::Math),
    alias(LinkOpt::ClNoSignedZeroes, "cl-no-signed-zeroes", G::Math, LinkOpt::ClNoSignedZeros),
    opt(LinkOpt::ClUnsafeMathOptimizations, "cl-unsafe-math-optimizations", K::Flag, G::Math),
    opt(LinkOpt::ClFiniteMathOnly, "cl-finite-math-only", K::Flag, G::Math),
    opt(LinkOpt::ClFastRelaxedMath, "cl-fast-relaxed-math", K::Flag, G::Math),
];

/// Compile-time option registry.
pub static COMPILE_OPTIONS: OptionTable<CompileOpt> = OptionTable::new("compile", &COMPILE_INFOS);

/// Link-time option registry.
pub static LINK_OPTIONS: OptionTable<LinkOpt> = OptionTable::new("link", &LINK_INFOS);
