//! Error types for blackout-engine operations.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid interval: start {start} is after end {end}")]
    InvalidInterval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Calendar text could not be tokenized or validated.
    /// `line` is 1-based and counts unfolded content lines.
    #[error("Calendar parse error at line {line}: {message}")]
    CalendarParse { line: usize, message: String },

    #[error("Time out of range: {start} + {duration}")]
    OutOfRange {
        start: DateTime<Utc>,
        duration: Duration,
    },

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Recurrence evaluation error: {0}")]
    RecurrenceEvaluation(String),

    #[error("Snapshot corrupt: {0}")]
    SnapshotCorrupt(String),

    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
