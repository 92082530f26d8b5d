//! The callback contract a registered command executes against.
//!
//! Grounded on `examples/original_source/scpidev/scpicommand.py`
//! (`SCPICommand.execute`, which calls the registered Python callable with
//! the matched parameters) generalized into a trait so closures, function
//! pointers and stateful handler objects are all usable as actions, the way
//! `examples/peat-brubeck/src/interpreter/executor.rs` dispatches to
//! per-instruction handler functions.

use thiserror::Error;

/// What failed while an [`Action`] ran. Always recorded to the alarm trace;
/// never written back to the wire directly (spec.md §5).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ActionError(String);

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        ActionError(message.into())
    }
}

impl From<String> for ActionError {
    fn from(message: String) -> Self {
        ActionError(message)
    }
}

impl From<&str> for ActionError {
    fn from(message: &str) -> Self {
        ActionError(message.to_string())
    }
}

/// The matched parameters handed to an [`Action`] at call time, in
/// declaration order, already stripped of surrounding whitespace, plus the
/// full command string the action was matched against. Grounded on
/// `scpidev/command.py::execute`, which calls the registered callable with
/// `*args` (the split parameters) and a `command_string` keyword argument.
#[derive(Debug, Clone, Default)]
pub struct ActionRequest {
    command_string: String,
    params: Vec<String>,
}

impl ActionRequest {
    pub fn new(command_string: impl Into<String>, params: Vec<String>) -> Self {
        ActionRequest {
            command_string: command_string.into(),
            params,
        }
    }

    /// The full command segment this action was matched against (one side of
    /// a `;`-split line), exactly as received, not the rendered spec.
    pub fn command_string(&self) -> &str {
        &self.command_string
    }

    /// All matched parameter tokens, in order. Omitted optional parameters
    /// are absent rather than empty strings.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// The `n`th parameter, if the caller supplied (or the input matched)
    /// that many.
    pub fn param(&self, n: usize) -> Option<&str> {
        self.params.get(n).map(String::as_str)
    }
}

/// A registered command's behavior: given the matched parameters, either
/// produce a response (for a query) or nothing (for a command), or fail.
///
/// Implemented for any `Fn(&ActionRequest) -> Result<Option<String>, ActionError>`,
/// so a plain closure is enough to register most commands; implement the
/// trait directly only when the handler needs a named type (e.g. to store
/// it outside the registry too).
pub trait Action: Send + Sync {
    fn call(&self, request: &ActionRequest) -> Result<Option<String>, ActionError>;
}

impl<F> Action for F
where
    F: Fn(&ActionRequest) -> Result<Option<String>, ActionError> + Send + Sync,
{
    fn call(&self, request: &ActionRequest) -> Result<Option<String>, ActionError> {
        self(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_implement_action() {
        let action = |req: &ActionRequest| -> Result<Option<String>, ActionError> {
            Ok(Some(format!("got {:?}", req.params())))
        };
        let request = ActionRequest::new("MEAS? 1", vec!["1".to_string()]);
        assert_eq!(
            action.call(&request).unwrap(),
            Some("got [\"1\"]".to_string())
        );
    }

    #[test]
    fn action_error_carries_message() {
        let err = ActionError::new("boom");
        assert_eq!(err.to_string(), "boom");
    }
}
