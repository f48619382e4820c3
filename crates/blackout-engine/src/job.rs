//! Jobs waiting for a free window.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::timestamp;

/// Identifier assigned by [`Schedule`](crate::schedule::Schedule) on
/// registration. `0` means "not registered yet".
pub type JobId = u64;

/// A named task with a fixed duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    #[serde(default)]
    pub id: JobId,
    pub name: String,
    /// Whole seconds in snapshots.
    #[serde(with = "timestamp::seconds")]
    pub duration: Duration,
    #[serde(default)]
    pub description: String,
}

impl Job {
    /// An unregistered job.
    ///
    /// # Errors
    /// `EngineError::InvalidDuration` unless `duration` is a non-negative
    /// whole number of seconds, the form snapshots store.
    pub fn new(name: impl Into<String>, duration: Duration) -> Result<Self> {
        if duration < Duration::zero() {
            return Err(EngineError::InvalidDuration(format!(
                "{} is negative",
                duration
            )));
        }
        if duration.subsec_nanos() != 0 {
            return Err(EngineError::InvalidDuration(format!(
                "{} is not a whole number of seconds",
                duration
            )));
        }
        Ok(Self {
            id: 0,
            name: name.into(),
            duration,
            description: String::new(),
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_registered(&self) -> bool {
        self.id != 0
    }
}
