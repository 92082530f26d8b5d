//! A single registered SCPI command: its compiled grammar plus the action
//! it runs when matched.
//!
//! Grounded on `examples/original_source/scpidev/scpicommand.py`
//! (`SCPICommand`), whose two-stage `match_keyword`/`match_parameters` split
//! becomes [`Command::match_kind`]'s [`MatchKind::NoMatch`] /
//! [`MatchKind::ParameterMismatch`] / [`MatchKind::Full`] outcomes, and whose
//! `__lt__` (sort by rendered spec string) becomes the `Ord` impl below, used
//! by `:SYSTem:HELP?` (see `device::standard`) to list commands in a stable
//! order.

pub mod action;
pub mod registry;
pub mod tokenizer;

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::grammar::{keyword::KeywordPath, parameter::ParameterList, CompileError};
use action::{Action, ActionError, ActionRequest};

/// The outcome of matching one input line against a single [`Command`].
pub enum MatchKind {
    /// The keyword path did not match at all.
    NoMatch,
    /// The keyword path matched but the parameters did not.
    ParameterMismatch,
    /// Both matched; the request is ready to execute.
    Full(ActionRequest),
}

/// A compiled command: a keyword path, a parameter list, and the action that
/// runs when both match an input line.
pub struct Command {
    path: KeywordPath,
    params: ParameterList,
    action: Arc<dyn Action>,
    label: String,
    description: String,
}

impl Command {
    /// Compile `spec` (a full specification string such as
    /// `MEASure:VOLTage:DC? <range>,<resolution>`) and pair it with
    /// `action`. `label` and `description` are purely documentary, surfaced
    /// by `Device::list_commands` and `:SYSTem:HELP?`.
    pub fn new(
        spec: &str,
        label: impl Into<String>,
        description: impl Into<String>,
        action: impl Action + 'static,
    ) -> Result<Self, CompileError> {
        let (path_text, tail_text) = tokenizer::split_path_and_tail(spec);
        let path = KeywordPath::compile(path_text)?;
        let params = ParameterList::compile(tail_text)?;
        Ok(Command {
            path,
            params,
            action: Arc::new(action),
            label: label.into(),
            description: description.into(),
        })
    }

    /// The canonical specification text, reconstructed from the compiled
    /// grammar rather than stored verbatim.
    pub fn spec_text(&self) -> String {
        let rendered_path = self.path.render();
        if self.params.is_empty() {
            rendered_path
        } else {
            format!("{} {}", rendered_path, self.params.raw())
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_query(&self) -> bool {
        self.path.is_query()
    }

    /// Match a single already-segmented, already-sanitized command string
    /// (one side of a `;`-split line) against this command.
    pub fn match_kind(&self, segment: &str) -> MatchKind {
        let (path_text, tail_text) = tokenizer::split_path_and_tail(segment);
        let path_text = path_text.trim_end();
        let is_query = path_text.ends_with('?');
        let path_body = path_text.trim_end_matches('?');
        let path_tokens = tokenizer::tokenize_path(path_body);
        let path_refs: Vec<&str> = path_tokens.iter().map(String::as_str).collect();

        if !self.path.matches(&path_refs, is_query) {
            return MatchKind::NoMatch;
        }

        // Parameter-tail text always has its internal whitespace stripped
        // entirely before comma-splitting, mirroring the original's
        // unconditional `remove_all_spaces=True` when sanitizing a parameter
        // string (`scpicommand.py`, `parameter.py`), unlike the
        // whitespace-collapsing-only sanitization applied to the whole line.
        let stripped_tail = tokenizer::sanitize(tail_text, true);
        let param_tokens = tokenizer::tokenize_params(&stripped_tail);
        let param_refs: Vec<&str> = param_tokens.iter().map(String::as_str).collect();

        match self.params.resolve(&param_refs) {
            Some(resolved) => {
                let values = resolved
                    .into_iter()
                    .flatten()
                    .map(str::to_string)
                    .collect();
                MatchKind::Full(ActionRequest::new(segment.trim().to_string(), values))
            }
            None => MatchKind::ParameterMismatch,
        }
    }

    /// Run this command's action against already-matched parameters. Per
    /// spec.md §4.5, a trailing newline is appended to any response that
    /// does not already end with one; the action itself never needs to
    /// think about wire framing.
    pub fn execute(&self, request: &ActionRequest) -> Result<Option<String>, ActionError> {
        self.action.call(request).map(|response| {
            response.map(|text| {
                if text.ends_with('\n') {
                    text
                } else {
                    let mut text = text;
                    text.push('\n');
                    text
                }
            })
        })
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("spec", &self.spec_text())
            .field("label", &self.label)
            .finish()
    }
}

impl PartialEq for Command {
    fn eq(&self, other: &Self) -> bool {
        self.spec_text() == other.spec_text()
    }
}

impl Eq for Command {}

impl PartialOrd for Command {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Command {
    fn cmp(&self, other: &Self) -> Ordering {
        self.spec_text().cmp(&other.spec_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_action() -> impl Action {
        |req: &ActionRequest| Ok(Some(format!("{:?}", req.params())))
    }

    #[test]
    fn full_match_yields_resolved_request() {
        let cmd = Command::new(
            "MEASure:VOLTage:DC? <range>[,{<resolution>|MINimum|MAXimum|DEFault}]",
            "measure_voltage_dc",
            "Measure DC voltage",
            echo_action(),
        )
        .unwrap();

        match cmd.match_kind("meas:volt:DC? 10,MAX") {
            MatchKind::Full(req) => {
                assert_eq!(req.params(), ["10", "MAX"]);
                assert_eq!(req.command_string(), "meas:volt:DC? 10,MAX");
            }
            _ => panic!("expected full match"),
        }
    }

    #[test]
    fn execute_appends_missing_trailing_newline_only_once() {
        let cmd = Command::new("*IDN?", "idn", "", |_: &ActionRequest| {
            Ok(Some("ACME,1,0,1.0".to_string()))
        })
        .unwrap();
        let request = ActionRequest::new("*IDN?", vec![]);
        assert_eq!(
            cmd.execute(&request).unwrap().as_deref(),
            Some("ACME,1,0,1.0\n")
        );

        let cmd_with_newline = Command::new("*IDN?", "idn", "", |_: &ActionRequest| {
            Ok(Some("ACME,1,0,1.0\n".to_string()))
        })
        .unwrap();
        assert_eq!(
            cmd_with_newline.execute(&request).unwrap().as_deref(),
            Some("ACME,1,0,1.0\n")
        );
    }

    #[test]
    fn keyword_mismatch_short_circuits_before_parameters() {
        let cmd = Command::new("MEASure:CURRent?", "measure_current", "", echo_action()).unwrap();
        assert!(matches!(cmd.match_kind("MEAS:VOLT?"), MatchKind::NoMatch));
    }

    #[test]
    fn parameter_mismatch_after_keyword_match() {
        let cmd = Command::new("MEASure:VOLTage:DC? <range>", "measure_voltage_dc", "", echo_action())
            .unwrap();
        assert!(matches!(
            cmd.match_kind("MEAS:VOLT:DC?"),
            MatchKind::ParameterMismatch
        ));
    }

    #[test]
    fn spec_text_reconstructs_canonical_form() {
        let cmd = Command::new(
            "MEASure:VOLTage:DC? <range>,<resolution>",
            "measure_voltage_dc",
            "",
            echo_action(),
        )
        .unwrap();
        assert_eq!(
            cmd.spec_text(),
            "MEASure:VOLTage:DC? <range>,<resolution>"
        );
    }

    #[test]
    fn ordering_is_by_spec_text() {
        let a = Command::new("*IDN?", "idn", "", echo_action()).unwrap();
        let b = Command::new("MEASure?", "measure", "", echo_action()).unwrap();
        assert!(a < b);
    }
}
