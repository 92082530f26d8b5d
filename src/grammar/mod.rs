//! The SCPI grammar engine: compiling specification strings into matchers.
//!
//! A full command specification (e.g. `MEASure:VOLTage:DC? <range>,<resolution>`)
//! is split at the first whitespace into a keyword path and a parameter
//! list, each compiled independently:
//!
//! - [`keyword::KeywordPath`] — short/long keyword forms with optional
//!   `[...]` cascading path segments.
//! - [`parameter::ParameterList`] — comma-separated, optionally bracketed
//!   parameters, each a [`value::ValueAlternatives`].
//! - [`block`] — IEEE 488.2 definite-length block data and radix-prefixed
//!   integer literals, used by response encoding rather than by matching.
//!
//! None of these modules know about transports, devices, or dispatch; they
//! are pure, allocation-light compile/match functions reused identically by
//! `command::Command` regardless of which concurrency mode is driving it.

pub mod block;
pub mod errors;
pub mod keyword;
pub mod parameter;
pub mod value;

pub use errors::CompileError;
pub use keyword::KeywordPath;
pub use parameter::ParameterList;
pub use value::{ValueAlternatives, ValueSpec};
