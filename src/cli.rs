//! Command-line interface for the `scpid` demo binary.
//!
//! This module handles parsing command-line arguments and turning them into
//! a validated [`Config`], following `examples/peat-brubeck/src/cli.rs`'s
//! `Cli`/`Config`/`to_config` split.

use std::time::Duration;

#[cfg(feature = "repl")]
use clap::Parser;
use thiserror::Error;

/// Command-line arguments for `scpid`.
#[cfg(feature = "repl")]
#[derive(Parser, Debug)]
#[command(name = "scpid")]
#[command(about = "A SCPI instrument command dispatcher", long_about = None)]
#[command(version)]
pub struct Cli {
    /// TCP port to listen on.
    #[arg(short = 'p', long = "port", default_value_t = 5025)]
    pub port: u16,

    /// Identification string returned by `*IDN?`.
    #[arg(long = "idn", default_value = "ACME,scpid,0,0.1.0")]
    pub idn: String,

    /// Bounded work queue capacity between transport workers and the
    /// dispatcher thread.
    #[arg(long = "queue-capacity", default_value_t = 64)]
    pub queue_capacity: usize,

    /// Watchdog liveness-check interval, in milliseconds.
    #[arg(long = "watchdog-interval-ms", default_value_t = 1000)]
    pub watchdog_interval_ms: u64,

    /// Number of past commands retained for `Device::get_command_history`.
    #[arg(long = "history-depth", default_value_t = 100)]
    pub history_depth: usize,

    /// Run in single-task mode (synchronous `poll()` loop) instead of
    /// multi-worker mode.
    #[arg(long = "single-task")]
    pub single_task: bool,

    /// Suppress startup banner and per-request logging.
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

/// Configuration derived from CLI arguments, with units normalized and
/// ranges validated.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub idn: String,
    pub queue_capacity: usize,
    pub watchdog_interval: Duration,
    pub history_depth: usize,
    pub single_task: bool,
    pub quiet: bool,
}

impl Config {
    /// Build a validated configuration, rejecting a zero queue capacity
    /// (the dispatcher would never receive anything) or watchdog interval
    /// (the thread would spin).
    pub fn new(
        port: u16,
        idn: String,
        queue_capacity: usize,
        watchdog_interval_ms: u64,
        history_depth: usize,
        single_task: bool,
        quiet: bool,
    ) -> Result<Self, ConfigError> {
        if queue_capacity == 0 {
            return Err(ConfigError::Invalid("queue capacity must be at least 1".to_string()));
        }
        if watchdog_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "watchdog interval must be at least 1ms".to_string(),
            ));
        }
        Ok(Config {
            port,
            idn,
            queue_capacity,
            watchdog_interval: Duration::from_millis(watchdog_interval_ms),
            history_depth,
            single_task,
            quiet,
        })
    }
}

/// Error building a [`Config`] from CLI arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(feature = "repl")]
impl Cli {
    /// Validate and convert parsed arguments into a [`Config`].
    pub fn to_config(&self) -> Result<Config, ConfigError> {
        Config::new(
            self.port,
            self.idn.clone(),
            self.queue_capacity,
            self.watchdog_interval_ms,
            self.history_depth,
            self.single_task,
            self.quiet,
        )
    }
}
