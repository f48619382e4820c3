//! Snapshot codec and file store.
//!
//! A snapshot is the whole [`Schedule`] state as one JSON document:
//!
//! ```json
//! {
//!   "calendar": { "events": [ { "kind": "single", "start": "...", "end": "...", "name": "..." },
//!                             { "kind": "recurring", "start": "...", "end": "...",
//!                               "recurrence_rule": "FREQ=DAILY", "stop_date": "..." } ] },
//!   "exclusions": { "intervals": [ { "start": "...", "end": "..." } ] },
//!   "jobs": [ { "id": 1, "name": "...", "duration": 3600, "description": "" } ],
//!   "last_job_id": 1
//! }
//! ```
//!
//! Instants are UTC RFC 3339; naive instants are read as UTC. Durations are
//! whole seconds.

use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::calendar::Calendar;
use crate::error::{EngineError, Result};
use crate::interval_set::IntervalSet;
use crate::job::{Job, JobId};
use crate::recurrence::{RRuleEvaluator, RecurrenceEvaluator};
use crate::schedule::Schedule;

/// Serializable form of a [`Schedule`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub calendar: Calendar,
    #[serde(default)]
    pub exclusions: IntervalSet,
    #[serde(default)]
    pub jobs: Vec<Job>,
    /// Absent in older snapshots; the largest job id is used instead.
    #[serde(default)]
    pub last_job_id: JobId,
}

impl Snapshot {
    /// Decode and validate a snapshot document.
    ///
    /// # Errors
    /// Returns `EngineError::SnapshotCorrupt` if the JSON is malformed, an
    /// interval or event ends before it starts, or job ids are zero or repeated.
    pub fn from_json(text: &str) -> Result<Self> {
        let snapshot: Snapshot =
            serde_json::from_str(text).map_err(|e| EngineError::SnapshotCorrupt(e.to_string()))?;

        let mut seen = HashSet::with_capacity(snapshot.jobs.len());
        for job in &snapshot.jobs {
            if job.id == 0 {
                return Err(EngineError::SnapshotCorrupt(format!(
                    "job {:?} has no id",
                    job.name
                )));
            }
            if !seen.insert(job.id) {
                return Err(EngineError::SnapshotCorrupt(format!(
                    "duplicate job id {}",
                    job.id
                )));
            }
        }
        Ok(snapshot)
    }

    /// Encode as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| EngineError::SnapshotCorrupt(format!("cannot encode snapshot: {}", e)))
    }

    /// Rebuild a schedule that expands recurring events with `evaluator`.
    pub fn into_schedule<E: RecurrenceEvaluator>(self, evaluator: E) -> Schedule<E> {
        Schedule::from_parts(
            self.calendar,
            self.exclusions,
            self.jobs,
            self.last_job_id,
            evaluator,
        )
    }
}

impl<E: RecurrenceEvaluator> Schedule<E> {
    /// Capture the current state.
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            calendar: self.calendar().clone(),
            exclusions: self.exclusions().clone(),
            jobs: self.jobs().to_vec(),
            last_job_id: self.last_job_id(),
        }
    }
}

/// A snapshot kept in one file.
///
/// Saves go to a temporary file in the same directory which then replaces the
/// target in one rename, so readers see either the old or the new snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored snapshot; `None` if the file does not exist.
    pub fn load(&self) -> Result<Option<Snapshot>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => {
                let snapshot = Snapshot::from_json(&text)?;
                tracing::info!(
                    path = %self.path.display(),
                    events = snapshot.calendar.len(),
                    jobs = snapshot.jobs.len(),
                    "snapshot loaded"
                );
                Ok(Some(snapshot))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no snapshot on disk");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Load the stored schedule, or start an empty one if there is none.
    /// A corrupt snapshot is still an error.
    pub fn load_or_default(&self) -> Result<Schedule> {
        self.load_or_default_with(RRuleEvaluator)
    }

    pub fn load_or_default_with<E: RecurrenceEvaluator>(&self, evaluator: E) -> Result<Schedule<E>> {
        Ok(match self.load()? {
            Some(snapshot) => snapshot.into_schedule(evaluator),
            None => Schedule::with_evaluator(evaluator),
        })
    }

    /// Atomically replace the stored snapshot with `schedule`'s state.
    pub fn save<E: RecurrenceEvaluator>(&self, schedule: &Schedule<E>) -> Result<()> {
        let json = schedule.to_snapshot().to_json()?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut staged = NamedTempFile::new_in(dir)?;
        staged.write_all(json.as_bytes())?;
        staged.as_file().sync_all()?;
        staged.persist(&self.path).map_err(|e| {
            tracing::warn!(path = %self.path.display(), error = %e.error, "snapshot rename failed");
            e.error
        })?;

        tracing::info!(path = %self.path.display(), bytes = json.len(), "snapshot saved");
        Ok(())
    }
}
