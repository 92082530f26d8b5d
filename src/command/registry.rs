//! The set of commands a device understands, and dispatch against it.
//!
//! Grounded on `examples/original_source/scpidev/command.py`
//! (`SCPICommandList.get_command`), which first looks for any command whose
//! keyword path matches regardless of parameters, then re-checks parameters
//! only among those path matches. [`CommandRegistry::dispatch`] keeps that
//! two-tier lookup so a keyword match with the wrong parameters is
//! distinguishable from no keyword match at all, matching
//! `device.py::execute`'s "Parameter mismatch." vs "No match found." alarm
//! text.

use super::action::ActionError;
use super::{Command, MatchKind};

/// The result of dispatching one already-segmented command string.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// A command matched fully and ran. `output` is `Some(text)` for a query
    /// response, `None` for a command with no reply; `spec` is the matched
    /// command's rendered specification text, recorded to command history.
    Response {
        spec: String,
        output: Option<String>,
    },
    /// A command matched fully but its action returned an error. Carries the
    /// command's label for the alarm text (spec.md §4.6).
    ActionFailed { label: String, error: ActionError },
    /// At least one command's keyword path matched, but none of their
    /// parameter lists did.
    ParameterMismatch,
    /// No registered command's keyword path matched at all.
    NoMatch,
}

/// An ordered collection of [`Command`]s. Commands are tried in registration
/// order; the first full match wins.
#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<Command>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        CommandRegistry {
            commands: Vec::new(),
        }
    }

    pub fn add(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// The spec text of every registered command, sorted for stable
    /// presentation (used by `:SYSTem:HELP?`).
    pub fn sorted_specs(&self) -> Vec<String> {
        let mut specs: Vec<String> = self.commands.iter().map(Command::spec_text).collect();
        specs.sort();
        specs
    }

    /// Dispatch one segment (one `;`-split command string) against every
    /// registered command, executing the first full match found.
    pub fn dispatch(&self, segment: &str) -> DispatchOutcome {
        let mut saw_path_match = false;
        for command in &self.commands {
            match command.match_kind(segment) {
                MatchKind::Full(request) => {
                    return match command.execute(&request) {
                        Ok(output) => DispatchOutcome::Response {
                            spec: command.spec_text(),
                            output,
                        },
                        Err(error) => DispatchOutcome::ActionFailed {
                            label: command.label().to_string(),
                            error,
                        },
                    };
                }
                MatchKind::ParameterMismatch => saw_path_match = true,
                MatchKind::NoMatch => {}
            }
        }
        if saw_path_match {
            DispatchOutcome::ParameterMismatch
        } else {
            DispatchOutcome::NoMatch
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::action::{Action, ActionRequest};

    fn ok_action(response: &'static str) -> impl Action {
        move |_: &ActionRequest| Ok(Some(response.to_string()))
    }

    fn build_registry() -> CommandRegistry {
        let mut registry = CommandRegistry::new();
        registry.add(Command::new("*IDN?", "idn", "", ok_action("ACME,1,0,1.0")).unwrap());
        registry.add(
            Command::new(
                "MEASure:VOLTage:DC? <range>,<resolution>",
                "measure_voltage_dc",
                "",
                ok_action("3.14"),
            )
            .unwrap(),
        );
        registry
    }

    #[test]
    fn full_match_executes_and_returns_response() {
        let registry = build_registry();
        match registry.dispatch("*IDN?") {
            DispatchOutcome::Response { spec, output } => {
                assert_eq!(output.as_deref(), Some("ACME,1,0,1.0\n"));
                assert_eq!(spec, "*IDN?");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn keyword_match_with_bad_parameters_is_distinguished_from_no_match() {
        let registry = build_registry();
        assert!(matches!(
            registry.dispatch("MEAS:VOLT:DC?"),
            DispatchOutcome::ParameterMismatch
        ));
        assert!(matches!(
            registry.dispatch("MEAS:CURR:DC? 10,MAX"),
            DispatchOutcome::NoMatch
        ));
    }

    #[test]
    fn sorted_specs_are_alphabetical() {
        let registry = build_registry();
        let specs = registry.sorted_specs();
        assert_eq!(specs.len(), 2);
        assert!(specs[0] < specs[1]);
    }

    #[test]
    fn action_failure_is_reported_distinctly() {
        let mut registry = CommandRegistry::new();
        registry.add(
            Command::new(
                "*RST",
                "reset",
                "",
                |_: &ActionRequest| Err(ActionError::new("reset failed")),
            )
            .unwrap(),
        );
        match registry.dispatch("*RST") {
            DispatchOutcome::ActionFailed { label, error } => {
                assert_eq!(label, "reset");
                assert_eq!(error.to_string(), "reset failed");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
