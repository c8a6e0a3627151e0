//! Error types for configuration, position lookup and command parsing.

use thiserror::Error;

/// Result type for fret-quiz operations.
pub type FretResult<T> = Result<T, FretError>;

/// Errors raised at the configuration and input boundaries.
///
/// None of these reach the round state machine: guesses outside the note
/// alphabet are scored as wrong answers rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FretError {
    /// A configuration value outside the supported set.
    #[error("invalid configuration: {field}={value} ({reason})")]
    InvalidConfiguration {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: i64,
        /// What the value should have been.
        reason: String,
    },

    /// A string number outside 1–6.
    #[error("invalid fret position: string {string}, fret {fret}")]
    InvalidPosition { string: u8, fret: u8 },

    /// Configuration changes are refused while a round is running.
    #[error("configuration cannot change while a round is active")]
    RoundActive,

    /// Unparseable line on the command input.
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),
}
