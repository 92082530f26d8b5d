//! A SCPI (Standard Commands for Programmable Instruments) command grammar
//! engine and dispatcher.
//!
//! [`grammar`] compiles IEEE 488.2 / SCPI-99 keyword paths, parameter lists
//! and value specifications; [`command`] pairs a compiled command with the
//! action it runs when matched and dispatches an input line against a whole
//! registry of them; [`device`] wires a registry, an alarm trace and command
//! history together behind one or more transports, in either a threaded
//! multi-worker mode or a synchronous single-task mode.
//!
//! ## Example
//!
//! ```
//! use scpi_device::command::action::ActionRequest;
//! use scpi_device::device::Device;
//!
//! let device = Device::new()
//!     .with_standard_commands("ACME,scpid,0,0.1.0")
//!     .unwrap();
//! device.add_command(
//!     scpi_device::command::Command::new(
//!         "MEASure:VOLTage:DC?",
//!         "measure_voltage_dc",
//!         "Measure DC voltage",
//!         |_: &ActionRequest| Ok(Some("3.14".to_string())),
//!     )
//!     .unwrap(),
//! );
//!
//! assert_eq!(device.execute_line("MEAS:VOLT:DC?").as_deref(), Some("3.14\n"));
//! ```

pub mod cli;
pub mod command;
pub mod device;
pub mod grammar;
