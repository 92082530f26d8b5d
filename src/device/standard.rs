//! The standard `*`-command and `:SYSTem` subsystem every device gets for
//! free.
//!
//! Grounded on `examples/original_source/scpidev/udevice.py`
//! (`_add_standard_commands`: `*IDN`, `*CLS`, `:SYSTem:ERRor?`, `*SRE`,
//! `*SRE?`, `*STB?`). `*RST` and `:SYSTem:HELP?` are not present in the
//! original and are supplemented per spec.md's completion of the command
//! set; `:SYSTem:ERRor[:NEXT]?`'s bracketed `:NEXT` form is likewise a
//! supplement so both the bare and explicit spellings are accepted.
//!
//! `:SYSTem:HELP?` lists every registered command, including itself and
//! commands registered after it. It closes over a clone of the device's
//! `Arc<SharedState>` and only reads the registry when the action actually
//! runs, which sidesteps the apparent ordering problem of a command needing
//! to describe a registry it is itself being added to.

use std::sync::Arc;

use crate::command::action::ActionRequest;
use crate::command::Command;
use crate::grammar::CompileError;

use super::shared::SharedState;
use super::Device;

pub(super) fn register(device: &Device, idn: String) -> Result<(), CompileError> {
    let shared = Arc::clone(&device.shared);

    device.add_command(Command::new(
        "*IDN?",
        "identify",
        "Identification query: manufacturer, model, serial, firmware revision",
        move |_: &ActionRequest| Ok(Some(idn.clone())),
    )?);

    device.add_command(Command::new(
        "*RST",
        "reset",
        "Reset the device to its power-on defaults",
        {
            let shared = Arc::clone(&shared);
            move |_: &ActionRequest| {
                shared.clear_alarm(true);
                shared.set_service_request_enable(0);
                Ok(None)
            }
        },
    )?);

    device.add_command(Command::new(
        "*CLS",
        "clear_status",
        "Clear the alarm/error queue",
        {
            let shared = Arc::clone(&shared);
            move |_: &ActionRequest| {
                shared.clear_alarm(true);
                Ok(None)
            }
        },
    )?);

    device.add_command(Command::new(
        "*SRE <mask>",
        "set_service_request_enable",
        "Set the service request enable mask",
        {
            let shared = Arc::clone(&shared);
            move |req: &ActionRequest| {
                let mask_text = req
                    .param(0)
                    .ok_or_else(|| crate::command::action::ActionError::new("missing mask"))?;
                let mask: u8 = mask_text.parse().map_err(|_| {
                    crate::command::action::ActionError::new(format!(
                        "{mask_text:?} is not a valid service request mask"
                    ))
                })?;
                shared.set_service_request_enable(mask);
                Ok(None)
            }
        },
    )?);

    device.add_command(Command::new(
        "*SRE?",
        "get_service_request_enable",
        "Query the service request enable mask",
        {
            let shared = Arc::clone(&shared);
            move |_: &ActionRequest| Ok(Some(shared.service_request_enable().to_string()))
        },
    )?);

    device.add_command(Command::new(
        "*STB?",
        "get_status_byte",
        "Query the IEEE 488.2 status byte",
        {
            let shared = Arc::clone(&shared);
            move |_: &ActionRequest| Ok(Some(shared.status_byte().to_string()))
        },
    )?);

    device.add_command(Command::new(
        ":SYSTem:ERRor[:NEXT]?",
        "get_next_error",
        "Pop and return the most recent alarm, or \"No error\"",
        {
            let shared = Arc::clone(&shared);
            move |_: &ActionRequest| {
                let message = shared
                    .pop_alarm()
                    .unwrap_or_else(|| "No error".to_string());
                Ok(Some(message))
            }
        },
    )?);

    device.add_command(Command::new(
        ":SYSTem:HELP?",
        "list_commands",
        "List every registered command's specification text, as block data",
        move |_: &ActionRequest| {
            let listing = shared.list_commands().join("\n");
            Ok(Some(crate::grammar::block::encode(&listing)))
        },
    )?);

    Ok(())
}
