//! Interactive console for a [`scpi_device::device::Device`].
//!
//! Concrete transports (TCP/UDP/serial) are out of scope for this crate (see
//! `scpi_device::device::transport`); this binary exercises the dispatcher
//! directly, feeding stdin lines to [`Device::execute_line`] the way
//! `examples/peat-brubeck/src/bin/brubeck.rs` feeds lines to its
//! interpreter.

use std::io::{self, BufRead, Write};

#[cfg(feature = "repl")]
use scpi_device::cli::Cli;
use scpi_device::device::Device;

#[cfg(feature = "repl")]
use clap::Parser;

#[cfg(feature = "repl")]
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    ExecutableCommand,
};

fn main() -> io::Result<()> {
    #[cfg(feature = "repl")]
    {
        env_logger::init();
        let cli = Cli::parse();
        let config = cli
            .to_config()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

        let device = build_device(
            &config.idn,
            config.history_depth,
            config.queue_capacity,
            config.watchdog_interval,
        )
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

        if !config.quiet {
            println!("scpid: a SCPI command dispatcher console");
            println!("no transport is registered; commands are read from stdin");
            println!("Ctrl-D to quit\n");
        }

        run(&device, !config.quiet)
    }

    #[cfg(not(feature = "repl"))]
    {
        let device = build_device(
            "ACME,scpid,0,0.1.0",
            100,
            64,
            std::time::Duration::from_millis(1000),
        )
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        run(&device, false)
    }
}

fn build_device(
    idn: &str,
    history_depth: usize,
    queue_capacity: usize,
    watchdog_interval: std::time::Duration,
) -> Result<Device, scpi_device::grammar::CompileError> {
    Device::new()
        .with_history_depth(history_depth)
        .with_queue_capacity(queue_capacity)
        .with_watchdog_interval(watchdog_interval)
        .with_standard_commands(idn)
}

fn run(device: &Device, use_color: bool) -> io::Result<()> {
    let stdin = io::stdin();
    loop {
        if use_color {
            print!("scpi> ");
            io::stdout().flush()?;
        }

        let mut line = String::new();
        let bytes_read = stdin.lock().read_line(&mut line)?;
        if bytes_read == 0 {
            println!();
            return Ok(());
        }

        if line.trim().is_empty() {
            continue;
        }

        if let Some(response) = device.execute_line(&line) {
            print_response(&response, use_color)?;
        }
    }
}

#[cfg(feature = "repl")]
fn print_response(response: &str, use_color: bool) -> io::Result<()> {
    if use_color {
        let mut stdout = io::stdout();
        stdout.execute(SetForegroundColor(Color::Green))?;
        stdout.execute(Print("● "))?;
        stdout.execute(ResetColor)?;
    }
    print!("{response}");
    io::stdout().flush()
}

#[cfg(not(feature = "repl"))]
fn print_response(response: &str, _use_color: bool) -> io::Result<()> {
    print!("{response}");
    io::stdout().flush()
}
