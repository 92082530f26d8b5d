//! Parameter list compiling and matching.
//!
//! A parameter list such as `<voltage>,<range>[,<resolution>]` compiles into
//! a [`ParameterList`] of [`Parameter`]s, each either required or optional.
//! Optional brackets cascade: once a parameter inside `[...]` is omitted, all
//! parameters after it are also treated as omitted. Grounded on
//! `examples/original_source/scpidev/parameter.py`
//! (`SCPIParameter`/`SCPIParameterList`), though the original's bracket/comma
//! bookkeeping is inconsistent; the algorithm below follows spec.md's prose
//! description instead of the original code.

use crate::grammar::errors::CompileError;
use crate::grammar::value::ValueAlternatives;

/// One parameter: a value alternation plus whether it may be omitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    alternatives: ValueAlternatives,
    optional: bool,
}

impl Parameter {
    pub fn alternatives(&self) -> &ValueAlternatives {
        &self.alternatives
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

/// A full, comma-separated parameter list compiled from a spec string such
/// as `<freq>,<range>[,<resolution>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterList {
    raw: String,
    params: Vec<Parameter>,
}

impl ParameterList {
    /// Compile a parameter list spec. An empty (or all-whitespace) `spec`
    /// compiles to a list with no parameters, for commands like `*IDN?`.
    pub fn compile(spec: &str) -> Result<Self, CompileError> {
        let trimmed = spec.trim();
        let mut depth: i32 = 0;
        let mut buffer = String::new();
        let mut buffer_start_depth: i32 = 0;
        let mut raw_params: Vec<(String, bool)> = Vec::new();

        for c in trimmed.chars() {
            match c {
                '[' => depth += 1,
                ']' => {
                    depth -= 1;
                    if depth < 0 {
                        return Err(CompileError::UnbalancedParameterBrackets(
                            trimmed.to_string(),
                        ));
                    }
                }
                ',' => {
                    raw_params.push((buffer.trim().to_string(), buffer_start_depth > 0));
                    buffer.clear();
                    buffer_start_depth = depth;
                }
                _ => {
                    if buffer.is_empty() {
                        buffer_start_depth = depth;
                    }
                    buffer.push(c);
                }
            }
        }
        if depth != 0 {
            return Err(CompileError::UnbalancedParameterBrackets(
                trimmed.to_string(),
            ));
        }
        if !buffer.trim().is_empty() || !raw_params.is_empty() {
            raw_params.push((buffer.trim().to_string(), buffer_start_depth > 0));
        }

        let mut params = Vec::with_capacity(raw_params.len());
        for (text, optional) in raw_params {
            params.push(Parameter {
                alternatives: ValueAlternatives::compile(&text)?,
                optional,
            });
        }

        Ok(ParameterList {
            raw: trimmed.to_string(),
            params,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Match `tokens` (already comma-split, with empty strings preserved for
    /// an omitted optional parameter such as the `,MAX` in `? ,MAX`) against
    /// this list. Every required parameter must be satisfied by a token in
    /// order, every token must be consumed, and an empty token may only
    /// satisfy an optional parameter.
    pub fn matches(&self, tokens: &[&str]) -> bool {
        let mut idx = 0;
        for param in &self.params {
            if idx >= tokens.len() {
                if param.optional {
                    continue;
                }
                return false;
            }
            let tok = tokens[idx];
            if tok.is_empty() {
                if param.optional {
                    idx += 1;
                    continue;
                }
                return false;
            }
            if param.alternatives.matches(tok) {
                idx += 1;
            } else if !param.optional {
                return false;
            }
            // optional, non-empty, non-matching token: leave idx where it is
            // and let the next parameter try the same token.
        }
        idx == tokens.len()
    }

    /// Like [`ParameterList::matches`], but on success returns the token
    /// resolved for each parameter (`None` for an omitted optional one)
    /// instead of a bare bool, so a caller can build an
    /// [`crate::command::action::ActionRequest`] from the result.
    pub fn resolve<'a>(&self, tokens: &[&'a str]) -> Option<Vec<Option<&'a str>>> {
        let mut idx = 0;
        let mut resolved = Vec::with_capacity(self.params.len());
        for param in &self.params {
            if idx >= tokens.len() {
                if param.optional {
                    resolved.push(None);
                    continue;
                }
                return None;
            }
            let tok = tokens[idx];
            if tok.is_empty() {
                if param.optional {
                    resolved.push(None);
                    idx += 1;
                    continue;
                }
                return None;
            }
            if param.alternatives.matches(tok) {
                resolved.push(Some(tok));
                idx += 1;
            } else if param.optional {
                resolved.push(None);
            } else {
                return None;
            }
        }
        if idx == tokens.len() {
            Some(resolved)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_spec_has_no_parameters() {
        let list = ParameterList::compile("").unwrap();
        assert!(list.is_empty());
        assert!(list.matches(&[]));
        assert!(!list.matches(&["1"]));
    }

    #[test]
    fn required_only_list() {
        let list = ParameterList::compile("<voltage>,<range>").unwrap();
        assert_eq!(list.params().len(), 2);
        assert!(!list.params()[0].is_optional());
        assert!(list.matches(&["10", "5"]));
        assert!(!list.matches(&["10"]));
        assert!(!list.matches(&["10", "5", "3"]));
    }

    #[test]
    fn resolve_reports_omitted_optional_as_none() {
        let list = ParameterList::compile("<freq>,<range>[,<resolution>]").unwrap();
        assert_eq!(
            list.resolve(&["10", "5"]),
            Some(vec![Some("10"), Some("5"), None])
        );
        assert_eq!(list.resolve(&["10"]), None);
    }

    #[test]
    fn single_bracket_optional_tail() {
        let list = ParameterList::compile("<freq>,<range>[,<resolution>]").unwrap();
        assert!(list.params()[2].is_optional());
        assert!(list.matches(&["10", "5", "0.1"]));
        assert!(list.matches(&["10", "5"]));
        assert!(!list.matches(&["10"]));
    }

    #[test]
    fn nested_bracket_cascade() {
        let list = ParameterList::compile("<p1>[,<p2>[,<p3>]]").unwrap();
        assert!(!list.params()[0].is_optional());
        assert!(list.params()[1].is_optional());
        assert!(list.params()[2].is_optional());
        assert!(list.matches(&["1", "2", "3"]));
        assert!(list.matches(&["1", "2"]));
        assert!(list.matches(&["1"]));
        assert!(!list.matches(&[]));
    }

    #[test]
    fn leading_comma_omits_optional_parameter() {
        let list = ParameterList::compile("<range>[,<resolution>]").unwrap();
        // "? ,MAX" splits to ["", "MAX"]: the first (required) slot is
        // empty and must fail, matching the documented rule that an empty
        // token can only satisfy an optional parameter.
        assert!(!list.matches(&["", "5"]));

        let list2 = ParameterList::compile("[<range>],<resolution>").unwrap();
        assert!(list2.matches(&["", "5"]));
    }

    #[test]
    fn unbalanced_brackets_are_rejected() {
        assert!(matches!(
            ParameterList::compile("<p1>[,<p2>"),
            Err(CompileError::UnbalancedParameterBrackets(_))
        ));
        assert!(matches!(
            ParameterList::compile("<p1>],<p2>"),
            Err(CompileError::UnbalancedParameterBrackets(_))
        ));
    }
}
