//! # blackout-engine
//!
//! Decides when time-bounded jobs may run, given a calendar of one-off and
//! recurring blackout periods plus manual overrides that reopen blacked-out
//! time.
//!
//! The engine is pure, synchronous computation over in-memory structures.
//! Recurrence expansion and calendar-text parsing sit behind traits so callers
//! can substitute their own implementations; the only I/O is the optional
//! [`snapshot::SnapshotStore`].
//!
//! ## Modules
//!
//! - [`interval`] — closed time range `[start, end]`
//! - [`interval_set`] — normalized set of disjoint intervals (union, difference, clip, complement)
//! - [`recurrence`] — rule text and the [`RecurrenceEvaluator`] seam, backed by `rrule`
//! - [`event`] — single and recurring blackout events
//! - [`calendar`] — event collection projected onto a period
//! - [`ical`] — iCalendar text → event records
//! - [`job`] — jobs with fixed durations
//! - [`schedule`] — availability and greedy job-fit selection
//! - [`snapshot`] — JSON snapshot codec and atomic file store
//! - [`timestamp`] — UTC text forms used by snapshots
//! - [`error`] — Error types
//!
//! ## Example
//!
//! ```rust
//! use blackout_engine::{Interval, Job, Schedule};
//! use chrono::{Duration, TimeZone, Utc};
//!
//! let day = |h| Utc.with_ymd_and_hms(2024, 7, 1, h, 0, 0).unwrap();
//! let mut schedule = Schedule::new();
//! schedule.add_event(day(9), day(12), Some("maintenance".into()), None, None).unwrap();
//! schedule.add_job(Job::new("short", Duration::hours(1)).unwrap());
//! schedule.add_job(Job::new("long", Duration::hours(2)).unwrap());
//!
//! let options = schedule.scheduled_job_options(day(6)).unwrap();
//! assert_eq!(options.len(), 2);
//! assert!(schedule.scheduled_job_options(day(10)).unwrap().is_empty());
//!
//! let free = schedule.available_intervals(day(8), Duration::hours(6)).unwrap();
//! assert_eq!(free.intervals(), &[
//!     Interval::new(day(8), day(9)).unwrap(),
//!     Interval::new(day(12), day(14)).unwrap(),
//! ]);
//! ```

pub mod calendar;
pub mod error;
pub mod event;
pub mod ical;
pub mod interval;
pub mod interval_set;
pub mod job;
pub mod recurrence;
pub mod schedule;
pub mod snapshot;
pub mod timestamp;

pub use calendar::Calendar;
pub use error::{EngineError, Result};
pub use event::{CalendarEvent, NamedInterval, RecurringEvent, SingleEvent};
pub use ical::{CalendarImporter, EventRecord, IcsImporter};
pub use interval::Interval;
pub use interval_set::IntervalSet;
pub use job::{Job, JobId};
pub use recurrence::{RRuleEvaluator, RecurrenceEvaluator, RecurrenceRule};
pub use schedule::Schedule;
pub use snapshot::{Snapshot, SnapshotStore};
