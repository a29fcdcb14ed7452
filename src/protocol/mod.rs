//! Tracker protocol handling.
//!
//! A line-oriented text protocol for driving one battle session over
//! stdin/stdout. Each input line is one command; the engine answers with
//! one or more response lines, ending errors with an `error <message>` line.

pub mod parser;

pub use parser::{parse_command, Command};
