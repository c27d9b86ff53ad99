//! Link option reconciliation.

use serde::Serialize;

use super::args::{ArgList, parse};
use super::table::{LINK_OPTIONS, LinkOpt};

/// Presence flags derived from link options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkDirectives {
    pub create_library: bool,
    pub enable_link_options: bool,
    pub denorms_are_zero: bool,
    pub no_signed_zeros: bool,
    pub unsafe_math: bool,
    pub finite_math_only: bool,
    pub fast_relaxed_math: bool,
}

impl LinkDirectives {
    #[must_use]
    pub fn from_args(args: &ArgList<LinkOpt>) -> Self {
        Self {
            create_library: args.has(LinkOpt::CreateLibrary),
            enable_link_options: args.has(LinkOpt::EnableLinkOptions),
            denorms_are_zero: args.has(LinkOpt::ClDenormsAreZero),
            no_signed_zeros: args.has(LinkOpt::ClNoSignedZeros),
            unsafe_math: args.has(LinkOpt::ClUnsafeMathOptimizations),
            finite_math_only: args.has(LinkOpt::ClFiniteMathOnly),
            fast_relaxed_math: args.has(LinkOpt::ClFastRelaxedMath),
        }
    }

    /// Parse `options`. A missing value is ignored: earlier arguments still apply.
    #[must_use]
    pub fn parse(options: &str) -> Self {
        let outcome = parse(&LINK_OPTIONS, options);
        let directives = Self::from_args(&outcome.args);
        tracing::debug!(
            target: "clfe",
            stage = "options.link.reconcile",
            create_library = directives.create_library,
            enable_link_options = directives.enable_link_options,
            overrides = directives.overrides_apply(),
        );
        directives
    }

    /// Link-time overrides replace module settings only for libraries built with explicit
    /// permission.
    #[must_use]
    pub fn overrides_apply(&self) -> bool {
        self.enable_link_options && self.create_library
    }
}
