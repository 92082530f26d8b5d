//! State shared between every concurrency mode: the command registry, the
//! alarm trace, and the command history.
//!
//! Pulling this out of [`super::Device`] lets both `device::worker`'s
//! dispatcher thread and `device::single_task::poll` execute a line the
//! same way, against `Arc<SharedState>` clones, without either needing a
//! whole `Device`.

use std::sync::{Mutex, RwLock};

use log::warn;

use super::alarm::AlarmTrace;
use crate::command::action::ActionError;
use crate::command::registry::{CommandRegistry, DispatchOutcome};
use crate::command::tokenizer::{sanitize, split_segments};
use crate::command::Command;

pub struct SharedState {
    registry: RwLock<CommandRegistry>,
    alarms: Mutex<AlarmTrace>,
    history: Mutex<Vec<String>>,
    history_depth: usize,
    /// The `*SRE`/`*SRE?` service request enable mask; see `device::standard`.
    service_request_enable: Mutex<u8>,
}

impl SharedState {
    pub fn new(history_depth: usize) -> Self {
        SharedState {
            registry: RwLock::new(CommandRegistry::new()),
            alarms: Mutex::new(AlarmTrace::new()),
            history: Mutex::new(Vec::new()),
            history_depth,
            service_request_enable: Mutex::new(0),
        }
    }

    pub fn history_depth(&self) -> usize {
        self.history_depth
    }

    pub fn set_service_request_enable(&self, mask: u8) {
        *self
            .service_request_enable
            .lock()
            .expect("sre lock poisoned") = mask;
    }

    pub fn service_request_enable(&self) -> u8 {
        *self
            .service_request_enable
            .lock()
            .expect("sre lock poisoned")
    }

    /// The IEEE 488.2 status byte: bit 2 set when the error/alarm queue is
    /// non-empty, bit 6 (RQS) set when that condition is also enabled by the
    /// service request mask.
    pub fn status_byte(&self) -> u8 {
        const ERROR_QUEUE_BIT: u8 = 1 << 2;
        const RQS_BIT: u8 = 1 << 6;
        let mut byte = 0u8;
        if self.pending_alarm_count() > 0 {
            byte |= ERROR_QUEUE_BIT;
        }
        if byte & self.service_request_enable() != 0 {
            byte |= RQS_BIT;
        }
        byte
    }

    pub fn add_command(&self, command: Command) {
        self.registry
            .write()
            .expect("registry lock poisoned")
            .add(command);
    }

    pub fn list_commands(&self) -> Vec<String> {
        self.registry
            .read()
            .expect("registry lock poisoned")
            .sorted_specs()
    }

    pub fn get_command_history(&self) -> Vec<String> {
        self.history.lock().expect("history lock poisoned").clone()
    }

    pub fn set_alarm(&self, message: impl Into<String>) {
        self.alarms
            .lock()
            .expect("alarm lock poisoned")
            .push(message);
    }

    pub fn pop_alarm(&self) -> Option<String> {
        self.alarms.lock().expect("alarm lock poisoned").pop()
    }

    /// `clear_history = true` empties the entire alarm trace (`*CLS`);
    /// `false` only acknowledges the current (most recent) alarm, leaving
    /// older history available to subsequent `:SYSTem:ERRor?` polls. See
    /// `DESIGN.md` for why this crate resolves spec.md §4.7's ambiguous
    /// "keep_history"/"clear_history" naming this way.
    pub fn clear_alarm(&self, clear_history: bool) {
        self.alarms
            .lock()
            .expect("alarm lock poisoned")
            .clear(clear_history);
    }

    pub fn pending_alarm_count(&self) -> usize {
        self.alarms.lock().expect("alarm lock poisoned").len()
    }

    /// Record the rendered spec text of a *successfully executed* command
    /// (spec.md §4.7's `get_command_history`; the original's own history
    /// field is write-only and this crate completes it, see `DESIGN.md`).
    fn record_history(&self, spec: &str) {
        let mut history = self.history.lock().expect("history lock poisoned");
        history.push(spec.to_string());
        if history.len() > self.history_depth {
            let excess = history.len() - self.history_depth;
            history.drain(0..excess);
        }
    }

    /// Execute one raw input line, which may itself hold several
    /// `;`-separated segments. The line is sanitized first (spec.md §4.1;
    /// grounded on `device.py::execute`'s unconditional
    /// `utils.sanitize(command_string)`, always whitespace-collapsing
    /// rather than space-stripping — parameter tails get their own,
    /// unconditional all-space strip inside `Command::match_kind`), then
    /// each segment is matched and executed independently, in order;
    /// non-null results are concatenated in order, each already
    /// newline-terminated by `Command::execute`. Returns `None` when every
    /// segment produced no response text.
    pub fn execute_line(&self, line: &str) -> Option<String> {
        let line = sanitize(line, false);
        let registry = self.registry.read().expect("registry lock poisoned");
        let mut response = String::new();
        for segment in split_segments(&line) {
            match registry.dispatch(&segment) {
                DispatchOutcome::Response { spec, output } => {
                    self.record_history(&spec);
                    if let Some(text) = output {
                        response.push_str(&text);
                    }
                }
                DispatchOutcome::ActionFailed { label, error } => {
                    self.record_action_failure(&segment, &label, &error)
                }
                DispatchOutcome::ParameterMismatch => self.set_alarm(format!(
                    "Could not execute command {segment:?}. Parameter mismatch."
                )),
                DispatchOutcome::NoMatch => self.set_alarm(format!(
                    "Could not execute command {segment:?}. No match found."
                )),
            }
        }
        if response.is_empty() {
            None
        } else {
            Some(response)
        }
    }

    fn record_action_failure(&self, segment: &str, label: &str, error: &ActionError) {
        warn!("action {label:?} for {segment:?} failed: {error}");
        self.set_alarm(format!(
            "Could not execute command {segment:?}. Exception during execution of function {label:?}: {error}."
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::action::ActionRequest;

    fn build_shared() -> SharedState {
        let shared = SharedState::new(10);
        shared.add_command(
            Command::new("*IDN?", "idn", "", |_: &ActionRequest| {
                Ok(Some("ACME,1,0,1.0".to_string()))
            })
            .unwrap(),
        );
        shared.add_command(
            Command::new("MEASure:CURRent:DC?", "measure_current_dc", "", |_: &ActionRequest| {
                Ok(Some("0.5".to_string()))
            })
            .unwrap(),
        );
        shared
    }

    #[test]
    fn multi_command_line_concatenates_in_order() {
        let shared = build_shared();
        let response = shared.execute_line("*IDN?;MEAS:CURR:DC?").unwrap();
        assert_eq!(response, "ACME,1,0,1.0\n0.5\n");
        assert_eq!(
            shared.get_command_history(),
            vec!["*IDN?".to_string(), "MEASure:CURRent:DC?".to_string()]
        );
    }

    #[test]
    fn unmatched_segment_sets_an_alarm_and_produces_no_response() {
        let shared = build_shared();
        assert!(shared.execute_line("BOGUS:COMMAND?").is_none());
        assert_eq!(
            shared.pop_alarm().as_deref(),
            Some("Could not execute command \"BOGUS:COMMAND?\". No match found.")
        );
    }

    #[test]
    fn history_is_bounded_to_configured_depth() {
        let shared = SharedState::new(2);
        shared.add_command(Command::new("*CLS", "cls", "", |_: &ActionRequest| Ok(None)).unwrap());
        shared.execute_line("*CLS");
        shared.execute_line("*CLS");
        shared.execute_line("*CLS");
        assert_eq!(shared.get_command_history().len(), 2);
    }

    #[test]
    fn action_failure_alarm_names_the_label() {
        let shared = SharedState::new(10);
        shared.add_command(
            Command::new("*RST", "reset", "", |_: &ActionRequest| {
                Err(ActionError::new("reset failed"))
            })
            .unwrap(),
        );
        assert!(shared.execute_line("*RST").is_none());
        assert_eq!(
            shared.pop_alarm().as_deref(),
            Some("Could not execute command \"*RST\". Exception during execution of function \"reset\": reset failed.")
        );
    }

    #[test]
    fn parameter_tail_has_internal_whitespace_unconditionally_stripped() {
        let shared = SharedState::new(10);
        shared.add_command(
            Command::new("MEASure:CURRent:DC? <range>", "measure_current_dc", "", {
                |req: &ActionRequest| Ok(Some(req.param(0).unwrap().to_string()))
            })
            .unwrap(),
        );
        // "1 0" has an embedded space inside the one parameter token; the
        // tail is space-stripped before comma-splitting, so this becomes the
        // single token "10", not two.
        let response = shared.execute_line("MEAS:CURR:DC? 1 0").unwrap();
        assert_eq!(response, "10\n");
    }
}
