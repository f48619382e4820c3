//! Closed time ranges.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::timestamp;

/// A closed time range `[start, end]`.
///
/// Ordering and equality compare `(start, end)`. Zero-length intervals are
/// valid. An interval never changes once built; operations that "move" an
/// edge return a new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct Interval {
    #[serde(with = "timestamp::utc")]
    start: DateTime<Utc>,
    #[serde(with = "timestamp::utc")]
    end: DateTime<Utc>,
}

impl Interval {
    /// Build an interval, rejecting `start > end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(EngineError::InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    /// Build an interval starting at `start` and lasting `duration`.
    ///
    /// # Errors
    /// `EngineError::OutOfRange` if the end is not representable, and
    /// `EngineError::InvalidInterval` for a negative `duration`.
    pub fn starting_at(start: DateTime<Utc>, duration: Duration) -> Result<Self> {
        Self::new(start, offset(start, duration)?)
    }

    /// Callers guarantee `start <= end`.
    pub(crate) fn from_ordered(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        debug_assert!(start <= end, "interval edges out of order");
        Self { start, end }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// True iff `start <= instant <= end`.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// `start + duration`, or `OutOfRange` instead of overflowing.
pub(crate) fn offset(start: DateTime<Utc>, duration: Duration) -> Result<DateTime<Utc>> {
    start
        .checked_add_signed(duration)
        .ok_or(EngineError::OutOfRange { start, duration })
}

#[derive(Deserialize)]
struct RawInterval {
    #[serde(with = "timestamp::utc")]
    start: DateTime<Utc>,
    #[serde(with = "timestamp::utc")]
    end: DateTime<Utc>,
}

impl TryFrom<RawInterval> for Interval {
    type Error = EngineError;

    fn try_from(raw: RawInterval) -> Result<Self> {
        Interval::new(raw.start, raw.end)
    }
}
