//! OpenCL option handling: tokenizing, table-driven parsing, compile/link reconciliation and
//! validation.

pub mod args;
pub mod check;
pub mod compile;
pub mod extensions;
pub mod link;
pub mod table;
pub mod tokenize;

pub use args::{ArgList, ParseOutcome, ParsedArg, parse};
pub use check::{CheckFailure, check_compile, check_link};
pub use compile::{CompileReconciler, EffectiveConfiguration};
pub use extensions::{ExtensionFeatureSet, ModuleBundle};
pub use link::LinkDirectives;
pub use table::{COMPILE_OPTIONS, CompileOpt, LINK_OPTIONS, LinkOpt, OptionGroup, OptionKind};
pub use tokenize::{TokenizerConfig, tokenize};
