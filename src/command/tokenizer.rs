//! Splitting a raw wire line into dispatchable command segments.
//!
//! Grounded on `examples/original_source/scpidev/utils.py`
//! (`sanitize`, `create_keyword_string`, `create_parameter_string`,
//! `create_command_tuple`) and on `uinterface.SCPIInterfaceTCP._parselines`'s
//! accumulate-until-newline buffering, which this module generalizes into
//! [`LineBuffer`] so every transport (and both concurrency modes) shares one
//! line-splitting implementation instead of repeating it.

use thiserror::Error;

/// Errors recognizing a raw byte chunk as SCPI input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The accumulated bytes up to a newline were not valid UTF-8.
    #[error("line is not valid UTF-8")]
    InvalidUtf8,
}

/// Strip ASCII control characters (other than space) and either collapse
/// runs of whitespace to a single space, or — when `remove_all_spaces` is
/// set — drop every space entirely. Mirrors `utils.sanitize`, whose
/// `remove_all_spaces` keyword the original always passes `True` for when
/// sanitizing a parameter string (`scpicommand.py`, `parameter.py`) and
/// `False` (the default) for a whole command line (`device.py::execute`).
pub fn sanitize(line: &str, remove_all_spaces: bool) -> String {
    let mut out = String::with_capacity(line.len());
    let mut last_was_space = false;
    for c in line.chars() {
        if c.is_ascii_control() {
            continue;
        }
        if c.is_whitespace() {
            if remove_all_spaces {
                continue;
            }
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    out.trim().to_string()
}

/// Split a sanitized line into independently dispatchable segments on `;`.
/// Each segment is itself a complete `<path> <params>` command string.
pub fn split_segments(line: &str) -> Vec<String> {
    line.split(';')
        .map(|segment| segment.trim().to_string())
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Split one segment into its keyword-path text and parameter-tail text at
/// the first run of whitespace, mirroring `create_command_tuple`.
pub fn split_path_and_tail(segment: &str) -> (&str, &str) {
    match segment.trim().find(char::is_whitespace) {
        Some(idx) => (segment[..idx].trim(), segment[idx..].trim()),
        None => (segment.trim(), ""),
    }
}

/// Split a keyword path into its `:`-delimited tokens, uppercased so
/// [`crate::grammar::keyword::KeywordPath::matches`] can compare case
/// insensitively.
pub fn tokenize_path(path: &str) -> Vec<String> {
    let trimmed = path.trim_start_matches(':');
    trimmed
        .split(':')
        .map(|t| t.to_ascii_uppercase())
        .collect()
}

/// Split a parameter tail into comma-separated tokens. Empty tokens are
/// preserved (e.g. `",MAX"` yields `["", "MAX"]`) so a leading comma can
/// represent an omitted optional parameter.
pub fn tokenize_params(tail: &str) -> Vec<String> {
    if tail.is_empty() {
        return Vec::new();
    }
    tail.split(',').map(|t| t.trim().to_string()).collect()
}

/// Accumulates bytes from a stream-oriented transport and yields complete,
/// newline-terminated lines as they become available. One `LineBuffer` is
/// kept per connection so partial reads across multiple `recv()` calls are
/// never lost or double-processed.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed newly received bytes and drain every complete line they
    /// produce (terminated by `\n`, with an optional preceding `\r`
    /// stripped). Bytes after the last newline are retained for the next
    /// call.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<String>, DecodeError> {
        self.pending.extend_from_slice(bytes);
        let mut lines = Vec::new();

        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            let raw = &raw[..raw.len() - 1];
            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
            let line = std::str::from_utf8(raw)
                .map_err(|_| DecodeError::InvalidUtf8)?
                .to_string();
            lines.push(line);
        }

        Ok(lines)
    }
}
