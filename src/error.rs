//! Error types for rule construction and date arithmetic.

use thiserror::Error;

/// The error type shared by every fallible operation in this crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A malformed option value, textual rule, or parameter.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A (year, month, day) triple that the active calendar rejects.
    #[error("invalid Hijri date {year:04}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u8, day: u8 },

    /// Date arithmetic that would leave the supported year range.
    #[error("date arithmetic out of the supported Hijri epoch")]
    OutOfEpoch,
}

impl Error {
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub(crate) fn invalid_date(year: i32, month: u8, day: u8) -> Self {
        Self::InvalidDate { year, month, day }
    }
}
