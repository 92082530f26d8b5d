//! Keyword path compiling and matching.
//!
//! A keyword path such as `MEASure[:VOLTage][:DC]?` compiles into a sequence
//! of [`KeywordToken`]s, each carrying a required (long-form uppercase) part,
//! an optional (short-form lowercase) part, and whether the token itself may
//! be omitted from input. Grounded on the character-scanning algorithm in
//! `examples/original_source/scpidev/keyword.py` (`SCPIKeywordList.__init__`)
//! and the walk in `scpidev/command.py::match_keyword`.

use crate::grammar::errors::CompileError;

/// One `:`-delimited segment of a compiled keyword path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordToken {
    required: String,
    optional: String,
    is_optional: bool,
}

impl KeywordToken {
    /// The mandatory (uppercase / long-form) portion of the token.
    pub fn required(&self) -> &str {
        &self.required
    }

    /// The portion that may be elided when using the short form.
    pub fn optional(&self) -> &str {
        &self.optional
    }

    /// Whether the whole token may be absent from a matching input.
    pub fn is_optional(&self) -> bool {
        self.is_optional
    }

    /// `required` followed by `optional`, the longest accepted spelling.
    fn long_form(&self) -> String {
        format!("{}{}", self.required, self.optional)
    }

    /// Does `input_token` spell a valid instance of this keyword, short or
    /// long form? `required` is already uppercase but `optional` is not, so
    /// both sides are uppercased before comparing, matching
    /// `grammar::value::discrete_prefix_match`.
    fn accepts(&self, input_token: &str) -> bool {
        if self.required.is_empty() {
            return false;
        }
        let input = input_token.to_ascii_uppercase();
        let long_form = self.long_form().to_ascii_uppercase();
        input.starts_with(self.required.as_str()) && long_form.starts_with(&input)
    }
}

/// A compiled keyword path: an ordered list of tokens plus the query flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordPath {
    tokens: Vec<KeywordToken>,
    is_query: bool,
}

impl KeywordPath {
    /// Compile a raw spec string such as `MEASure[:VOLTage][:DC]?`.
    pub fn compile(spec: &str) -> Result<Self, CompileError> {
        let trimmed = spec.trim();
        if trimmed.is_empty() {
            return Err(CompileError::EmptyKeywordPath);
        }

        let is_query = trimmed.ends_with('?');
        let body = if is_query {
            &trimmed[..trimmed.len() - 1]
        } else {
            trimmed
        };

        let mut tokens = Vec::new();
        let mut required = String::new();
        let mut optional = String::new();
        let mut in_optional = false;
        let mut first_char = true;

        // Tracks which buffer a trailing digit run should extend.
        enum Active {
            None,
            Required,
            Optional,
        }
        let mut active = Active::None;

        let mut emit = |required: &mut String, optional: &mut String, in_optional: bool| {
            if !required.is_empty() {
                tokens.push(KeywordToken {
                    required: std::mem::take(required),
                    optional: std::mem::take(optional),
                    is_optional: in_optional,
                });
            }
            required.clear();
            optional.clear();
        };

        for c in body.chars() {
            match c {
                '*' if first_char && required.is_empty() && optional.is_empty() => {
                    required.push(c);
                    active = Active::Required;
                }
                c if c.is_ascii_uppercase() => {
                    required.push(c);
                    active = Active::Required;
                }
                c if c.is_ascii_lowercase() => {
                    optional.push(c);
                    active = Active::Optional;
                }
                c if c.is_ascii_digit() => match active {
                    Active::Optional => optional.push(c),
                    _ => required.push(c),
                },
                ':' => emit(&mut required, &mut optional, in_optional),
                '[' => {
                    emit(&mut required, &mut optional, in_optional);
                    in_optional = true;
                }
                ']' => {
                    emit(&mut required, &mut optional, in_optional);
                    in_optional = false;
                }
                _ => {
                    return Err(CompileError::UnbalancedKeywordBrackets(trimmed.to_string()));
                }
            }
            first_char = false;
        }
        emit(&mut required, &mut optional, in_optional);

        if in_optional {
            return Err(CompileError::UnbalancedKeywordBrackets(trimmed.to_string()));
        }
        if tokens.is_empty() {
            return Err(CompileError::EmptyKeywordPath);
        }

        Ok(KeywordPath { tokens, is_query })
    }

    /// Whether this path was declared as a query (trailing `?`).
    pub fn is_query(&self) -> bool {
        self.is_query
    }

    pub fn tokens(&self) -> &[KeywordToken] {
        &self.tokens
    }

    /// Render the compiled path back to its canonical spec text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for token in &self.tokens {
            if token.is_optional {
                out.push('[');
                out.push(':');
                out.push_str(&token.required);
                out.push_str(&token.optional);
                out.push(']');
            } else {
                if !out.is_empty() {
                    out.push(':');
                }
                out.push_str(&token.required);
                out.push_str(&token.optional);
            }
        }
        if self.is_query {
            out.push('?');
        }
        out
    }

    /// Match a normalized, already-uppercased input path (`kw1:kw2:...`,
    /// with any trailing `?` stripped by the caller alongside the query
    /// flag it observed).
    pub fn matches(&self, input_tokens: &[&str], input_is_query: bool) -> bool {
        if input_is_query != self.is_query {
            return false;
        }

        let mut input_iter = input_tokens.iter();
        let mut current = input_iter.next();

        for token in &self.tokens {
            match current {
                Some(input_token) if token.accepts(input_token) => {
                    current = input_iter.next();
                }
                _ => {
                    if token.is_optional {
                        continue;
                    }
                    return false;
                }
            }
        }

        current.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_long_and_short_forms() {
        let path = KeywordPath::compile("MEASure[:VOLTage][:DC]?").unwrap();
        assert!(path.is_query());
        assert_eq!(path.tokens().len(), 3);
        assert_eq!(path.tokens()[0].required(), "MEAS");
        assert_eq!(path.tokens()[0].optional(), "ure");
        assert!(!path.tokens()[0].is_optional());
        assert!(path.tokens()[1].is_optional());
        assert!(path.tokens()[2].is_optional());
    }

    #[test]
    fn star_commands_keep_leading_asterisk() {
        let path = KeywordPath::compile("*IDN?").unwrap();
        assert_eq!(path.tokens()[0].required(), "*IDN");
    }

    #[test]
    fn matches_short_and_long_form_input() {
        let path = KeywordPath::compile("MEASure[:VOLTage][:DC]?").unwrap();
        assert!(path.matches(&["MEAS", "VOLT", "DC"], true));
        assert!(path.matches(&["MEASURE", "VOLTAGE", "DC"], true));
        assert!(path.matches(&["MEAS"], true));
        assert!(!path.matches(&["MEAS"], false));
    }

    #[test]
    fn matches_partial_and_lowercase_long_form_input() {
        // Input using more than the bare `required` prefix but less than
        // the full `optional` tail, in lowercase, must still match: the
        // comparison has to uppercase both `input_token` and `long_form`
        // before comparing, not just `required`.
        let path = KeywordPath::compile("MEASure:CURRent:DC?").unwrap();
        assert!(path.matches(&["meas", "curre", "DC"], true));
        assert!(path.matches(&["MEASURE", "CURRENT", "dc"], true));
    }

    #[test]
    fn rejects_unmatched_required_token() {
        let path = KeywordPath::compile("MEASure:CURRent?").unwrap();
        assert!(!path.matches(&["MEAS", "VOLT"], true));
    }

    #[test]
    fn rejects_leftover_input_tokens() {
        let path = KeywordPath::compile("MEASure?").unwrap();
        assert!(!path.matches(&["MEAS", "VOLT"], true));
    }

    #[test]
    fn empty_path_is_rejected() {
        assert_eq!(KeywordPath::compile(""), Err(CompileError::EmptyKeywordPath));
        assert_eq!(KeywordPath::compile("?"), Err(CompileError::EmptyKeywordPath));
    }

    #[test]
    fn unbalanced_brackets_are_rejected() {
        assert!(matches!(
            KeywordPath::compile("MEASure[:VOLTage"),
            Err(CompileError::UnbalancedKeywordBrackets(_))
        ));
    }

    #[test]
    fn render_round_trips_canonical_form() {
        let path = KeywordPath::compile("MEASure[:VOLTage]?").unwrap();
        assert_eq!(path.render(), "MEASure[:VOLTage]?");
    }
}
