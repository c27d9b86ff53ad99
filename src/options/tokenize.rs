//! Quote- and escape-aware splitting of a single option string.

/// Characters that control how an option string is split into tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenizerConfig<'d> {
    /// Any of these characters terminates a token outside of quotes.
    pub delimiters: &'d str,
    /// Toggles quoting; `None` disables quoting entirely.
    pub quote: Option<char>,
    /// Escapes the following quote; `None` disables escaping entirely.
    pub escape: Option<char>,
}

impl TokenizerConfig<'static> {
    /// Space/tab separated, double-quoted, backslash-escaped. Used for user option strings.
    pub const OPTIONS: Self = Self {
        delimiters: " \t",
        quote: Some('"'),
        escape: Some('\\'),
    };

    /// Space/tab separated and double-quoted, with escaping disabled. Used for the extra
    /// options string supplied by the runtime.
    pub const RAW: Self = Self {
        delimiters: " \t",
        quote: Some('"'),
        escape: None,
    };
}

/// Lazy token iterator over an option string.
///
/// Cloning the iterator restarts nothing; call [`tokenize`] again (or clone before advancing)
/// to walk the same input twice.
#[derive(Debug, Clone)]
pub struct QuotedTokens<'s, 'd> {
    rest: &'s str,
    config: TokenizerConfig<'d>,
}

/// Tokenize `input` according to `config`.
#[must_use]
pub fn tokenize<'s, 'd>(input: &'s str, config: TokenizerConfig<'d>) -> QuotedTokens<'s, 'd> {
    QuotedTokens {
        rest: input,
        config,
    }
}

/// Tokenize and collect into owned strings.
#[must_use]
pub fn tokenize_to_vec(input: &str, config: TokenizerConfig<'_>) -> Vec<String> {
    tokenize(input, config).collect()
}

impl QuotedTokens<'_, '_> {
    fn is_delimiter(&self, c: char) -> bool {
        self.config.delimiters.contains(c)
    }

    fn skip_delimiters(&mut self) {
        let delimiters = self.config.delimiters;
        self.rest = self.rest.trim_start_matches(|c: char| delimiters.contains(c));
    }
}

impl Iterator for QuotedTokens<'_, '_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.skip_delimiters();
        if self.rest.is_empty() {
            return None;
        }

        let mut token = String::new();
        let mut in_quote = false;
        let mut is_escaped = false;

        for (offset, c) in self.rest.char_indices() {
            if Some(c) == self.config.escape {
                token.push(c);
                is_escaped = !is_escaped;
            } else if Some(c) == self.config.quote {
                if is_escaped {
                    token.push(c);
                    is_escaped = false;
                } else {
                    in_quote = !in_quote;
                }
            } else if self.is_delimiter(c) {
                is_escaped = false;
                if in_quote {
                    token.push(c);
                } else {
                    // A token made only of quotes still terminates here, possibly empty.
                    self.rest = &self.rest[offset..];
                    return Some(token);
                }
            } else {
                is_escaped = false;
                token.push(c);
            }
        }

        self.rest = "";
        if token.is_empty() { None } else { Some(token) }
    }
}
