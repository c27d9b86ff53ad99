//! Table-driven argument parsing.

use std::fmt::Write as _;

use super::table::{OptionGroup, OptionId, OptionInfo, OptionKind, OptionTable};
use super::tokenize::{TokenizerConfig, tokenize_to_vec};

/// One matched occurrence of an option (or a positional / unknown token).
#[derive(Debug, Clone)]
pub struct ParsedArg<Id: 'static> {
    /// Descriptor whose spelling matched.
    pub info: &'static OptionInfo<Id>,
    /// Alias-resolved descriptor; equal to `info` for non-aliases.
    pub target: &'static OptionInfo<Id>,
    /// Text that matched the option spelling. For inputs and unknowns this is the whole token.
    pub spelling: String,
    pub values: Vec<String>,
    /// Position of the option's token in [`ArgList::tokens`].
    pub index: usize,
}

impl<Id: OptionId> ParsedArg<Id> {
    /// Identity used for dispatch (alias target when the option is an alias).
    #[must_use]
    pub fn id(&self) -> Id {
        self.target.id
    }

    #[must_use]
    pub fn group(&self) -> OptionGroup {
        self.info.group
    }

    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    /// Render the argument the way it is forwarded to the frontend.
    ///
    /// Aliases render with their target's spelling. Separate and joined-or-separate options
    /// render as a single `"<spelling> <value>"` string, so `-Dfoo` and `-D foo` forward
    /// identically.
    #[must_use]
    pub fn as_string(&self) -> String {
        let mut out = if self.target.kind.is_matchable() {
            self.target.spelling()
        } else {
            self.spelling.clone()
        };
        match self.target.kind {
            OptionKind::Input | OptionKind::Unknown | OptionKind::Flag => {}
            OptionKind::Joined => {
                for value in &self.values {
                    out.push_str(value);
                }
            }
            OptionKind::Separate | OptionKind::JoinedOrSeparate => {
                for value in &self.values {
                    let _ = write!(out, " {value}");
                }
            }
        }
        out
    }
}

/// Ordered parsed arguments plus the raw tokens they were parsed from.
#[derive(Debug, Clone)]
pub struct ArgList<Id: 'static> {
    tokens: Vec<String>,
    args: Vec<ParsedArg<Id>>,
}

impl<Id: OptionId> ArgList<Id> {
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    #[must_use]
    pub fn token(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParsedArg<Id>> {
        self.args.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.args.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Arguments classified under `group`, in input order.
    pub fn filtered(&self, group: OptionGroup) -> impl Iterator<Item = &ParsedArg<Id>> {
        self.args.iter().filter(move |arg| arg.group() == group)
    }

    /// Whether any argument dispatches as `id`.
    #[must_use]
    pub fn has(&self, id: Id) -> bool {
        self.args.iter().any(|arg| arg.id() == id)
    }

    /// Value of the last argument dispatching as `id`.
    #[must_use]
    pub fn last_value(&self, id: Id) -> Option<&str> {
        self.args
            .iter()
            .rev()
            .find(|arg| arg.id() == id)
            .and_then(ParsedArg::value)
    }
}

/// Parser result. A non-zero `missing_count` means parsing stopped at `missing_index`.
#[derive(Debug, Clone)]
pub struct ParseOutcome<Id: 'static> {
    pub args: ArgList<Id>,
    pub missing_index: usize,
    pub missing_count: usize,
}

impl<Id: OptionId> ParseOutcome<Id> {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_count == 0
    }

    /// Raw token of the option whose value was missing.
    #[must_use]
    pub fn missing_spelling(&self) -> Option<&str> {
        if self.is_complete() {
            None
        } else {
            self.args.token(self.missing_index)
        }
    }
}

/// Tokenize `options` with the option-string rules and parse against `table`.
#[must_use]
pub fn parse<Id: OptionId>(table: &OptionTable<Id>, options: &str) -> ParseOutcome<Id> {
    parse_tokens(table, tokenize_to_vec(options, TokenizerConfig::OPTIONS))
}

/// Parse pre-split tokens against `table`.
#[must_use]
pub fn parse_tokens<Id: OptionId>(table: &OptionTable<Id>, tokens: Vec<String>) -> ParseOutcome<Id> {
    let mut args = Vec::with_capacity(tokens.len());
    let mut missing_index = 0;
    let mut missing_count = 0;
    let mut index = 0;

    while index < tokens.len() {
        let token = &tokens[index];
        if token.is_empty() {
            index += 1;
            continue;
        }

        if !table.has_option_prefix(token) {
            let info = table.special(Id::INPUT);
            args.push(ParsedArg {
                info,
                target: info,
                spelling: token.clone(),
                values: Vec::new(),
                index,
            });
            index += 1;
            continue;
        }

        match match_option(table, token) {
            Some(Match::Complete { info, spelling, value }) => {
                args.push(ParsedArg {
                    info,
                    target: resolve(table, info),
                    spelling: spelling.to_string(),
                    values: value.into_iter().collect(),
                    index,
                });
                index += 1;
            }
            Some(Match::NeedsNext { info, spelling }) => {
                let Some(next) = tokens.get(index + 1) else {
                    missing_index = index;
                    missing_count = 1;
                    break;
                };
                args.push(ParsedArg {
                    info,
                    target: resolve(table, info),
                    spelling: spelling.to_string(),
                    values: vec![next.clone()],
                    index,
                });
                index += 2;
            }
            None => {
                let info = table.special(Id::UNKNOWN);
                args.push(ParsedArg {
                    info,
                    target: info,
                    spelling: token.clone(),
                    values: Vec::new(),
                    index,
                });
                index += 1;
            }
        }
    }

    tracing::debug!(
        target: "clfe",
        stage = "options.parse",
        dialect = table.dialect(),
        tokens = tokens.len(),
        args = args.len(),
        missing = missing_count,
    );

    ParseOutcome {
        args: ArgList { tokens, args },
        missing_index,
        missing_count,
    }
}

fn resolve<Id: OptionId>(
    table: &OptionTable<Id>,
    info: &'static OptionInfo<Id>,
) -> &'static OptionInfo<Id> {
    info.alias.and_then(|id| table.info(id)).unwrap_or(info)
}

enum Match<'t, Id: 'static> {
    Complete {
        info: &'static OptionInfo<Id>,
        spelling: &'t str,
        value: Option<String>,
    },
    NeedsNext {
        info: &'static OptionInfo<Id>,
        spelling: &'t str,
    },
}

fn match_option<'t, Id: OptionId>(table: &OptionTable<Id>, token: &'t str) -> Option<Match<'t, Id>> {
    for (info, rest) in table.candidates(token) {
        let spelling = &token[..token.len() - rest.len()];
        match info.kind {
            OptionKind::Flag if rest.is_empty() => {
                return Some(Match::Complete { info, spelling, value: None });
            }
            OptionKind::Joined => {
                return Some(Match::Complete {
                    info,
                    spelling,
                    value: Some(rest.to_string()),
                });
            }
            OptionKind::Separate if rest.is_empty() => {
                return Some(Match::NeedsNext { info, spelling });
            }
            OptionKind::JoinedOrSeparate => {
                if rest.is_empty() {
                    return Some(Match::NeedsNext { info, spelling });
                }
                return Some(Match::Complete {
                    info,
                    spelling,
                    value: Some(rest.to_string()),
                });
            }
            _ => {}
        }
    }
    None
}
