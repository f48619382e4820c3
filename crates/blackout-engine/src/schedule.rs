//! The scheduling aggregate: calendar, exclusion overrides and jobs.
//!
//! Availability is computed as
//!
//! ```text
//! calendar blackout in period  -  exclusion overrides  ->  invert within period
//! ```
//!
//! so exclusions only ever reopen time the calendar blocks.
//!
//! `Schedule` does no locking. Callers sharing one across threads serialize
//! access themselves, e.g. with a `Mutex<Schedule>` held for each call.

use chrono::{DateTime, Duration, Utc};

use crate::calendar::Calendar;
use crate::error::Result;
use crate::event::NamedInterval;
use crate::interval::Interval;
use crate::interval_set::IntervalSet;
use crate::job::{Job, JobId};
use crate::recurrence::{RRuleEvaluator, RecurrenceEvaluator, RecurrenceRule};

#[derive(Debug, Clone)]
pub struct Schedule<E = RRuleEvaluator> {
    calendar: Calendar,
    exclusions: IntervalSet,
    jobs: Vec<Job>,
    /// Last id handed out. Ids are never reused, even after removal.
    last_job_id: JobId,
    evaluator: E,
}

impl Schedule<RRuleEvaluator> {
    pub fn new() -> Self {
        Self::with_evaluator(RRuleEvaluator)
    }
}

impl Default for Schedule<RRuleEvaluator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: RecurrenceEvaluator> Schedule<E> {
    /// An empty schedule expanding recurring events with `evaluator`.
    pub fn with_evaluator(evaluator: E) -> Self {
        Self {
            calendar: Calendar::new(),
            exclusions: IntervalSet::new(),
            jobs: Vec::new(),
            last_job_id: 0,
            evaluator,
        }
    }

    /// Reassemble a schedule from stored state. The id counter is raised to
    /// the largest registered id so restored ids are never handed out again.
    pub(crate) fn from_parts(
        calendar: Calendar,
        exclusions: IntervalSet,
        jobs: Vec<Job>,
        last_job_id: JobId,
        evaluator: E,
    ) -> Self {
        let highest = jobs.iter().map(|job| job.id).max().unwrap_or(0);
        Self {
            calendar,
            exclusions,
            jobs,
            last_job_id: last_job_id.max(highest),
            evaluator,
        }
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn exclusions(&self) -> &IntervalSet {
        &self.exclusions
    }

    /// Registered jobs in registration order.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn last_job_id(&self) -> JobId {
        self.last_job_id
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Replace the whole calendar.
    pub fn set_calendar(&mut self, calendar: Calendar) {
        tracing::debug!(events = calendar.len(), "calendar replaced");
        self.calendar = calendar;
    }

    /// Replace the calendar with one read from iCalendar text and return the
    /// number of imported events. On error the current calendar is kept.
    pub fn import_calendar(&mut self, text: &str) -> Result<usize> {
        let calendar = Calendar::from_ical(text)?;
        let count = calendar.len();
        self.set_calendar(calendar);
        Ok(count)
    }

    /// Append a blackout event; recurring when `rule` is given.
    pub fn add_event(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        name: Option<String>,
        rule: Option<RecurrenceRule>,
        stop_date: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let recurring = rule.is_some();
        self.calendar.add_event(start, end, name, rule, stop_date)?;
        tracing::debug!(%start, %end, recurring, "event added");
        Ok(())
    }

    /// Reopen `interval` even where the calendar blacks it out.
    pub fn add_exclusion_interval(&mut self, interval: Interval) {
        tracing::debug!(start = %interval.start(), end = %interval.end(), "exclusion added");
        self.exclusions.add(interval);
    }

    /// Exclusion overrides falling inside `period`, clipped to it.
    pub fn exclusions_within(&self, period: Interval) -> IntervalSet {
        self.exclusions.intersect_within(period)
    }

    /// Calendar blackout inside `period`, merged, before exclusions apply.
    pub fn blackout_within(&self, period: Interval) -> Result<IntervalSet> {
        self.calendar.project_onto(period, &self.evaluator)
    }

    /// Calendar occurrences inside `period` as named, unmerged entries.
    pub fn blackout_events(&self, period: Interval) -> Result<Vec<NamedInterval>> {
        self.calendar.project_as_named_events(period, &self.evaluator)
    }

    /// Free windows in `[start_time, start_time + max_duration]`.
    ///
    /// # Errors
    /// `EngineError::InvalidInterval` for a negative `max_duration`, and any
    /// error the recurrence evaluator reports.
    pub fn available_intervals(
        &self,
        start_time: DateTime<Utc>,
        max_duration: Duration,
    ) -> Result<IntervalSet> {
        let period = Interval::starting_at(start_time, max_duration)?;
        let blackout = self.calendar.project_onto(period, &self.evaluator)?;
        let effective = blackout.subtract(&self.exclusions);
        Ok(effective.invert_within(period))
    }

    /// Jobs that could start exactly at `start_time`, longest first.
    ///
    /// The window examined is the free interval beginning at `start_time`
    /// within the longest job's duration. If `start_time` is not free, nothing
    /// is offered. Each job is compared against the full window width on its
    /// own; accepted jobs do not use up capacity, so the result lists every job
    /// short enough to fit, not a set that fits back to back.
    pub fn scheduled_job_options(&self, start_time: DateTime<Utc>) -> Result<Vec<&Job>> {
        let mut ranked: Vec<&Job> = self.jobs.iter().collect();
        // Stable: equal durations keep registration order.
        ranked.sort_by(|a, b| b.duration.cmp(&a.duration));
        let Some(longest) = ranked.first().map(|job| job.duration) else {
            return Ok(Vec::new());
        };

        let available = self.available_intervals(start_time, longest)?;
        let Some(window) = available.first() else {
            return Ok(Vec::new());
        };
        if window.start() != start_time {
            return Ok(Vec::new());
        }

        let width = window.duration();
        Ok(ranked
            .into_iter()
            .filter(|job| job.duration <= width)
            .collect())
    }

    /// Register `job` under a fresh id and return the id.
    pub fn add_job(&mut self, mut job: Job) -> JobId {
        self.last_job_id += 1;
        job.id = self.last_job_id;
        tracing::debug!(job_id = job.id, name = %job.name, "job added");
        self.jobs.push(job);
        self.last_job_id
    }

    /// Remove the job with `id`, keeping the rest. Returns how many jobs were
    /// removed: 1 if found, otherwise 0.
    pub fn remove_job(&mut self, id: JobId) -> usize {
        let before = self.jobs.len();
        self.jobs.retain(|job| job.id != id);
        let removed = before - self.jobs.len();
        tracing::debug!(job_id = id, removed, "job removed");
        removed
    }

    /// Drop every exclusion override. Calendar and jobs are untouched.
    pub fn reset(&mut self) {
        tracing::debug!(cleared = self.exclusions.len(), "exclusions reset");
        self.exclusions = IntervalSet::new();
    }
}

impl<E> PartialEq for Schedule<E> {
    fn eq(&self, other: &Self) -> bool {
        self.calendar == other.calendar
            && self.exclusions == other.exclusions
            && self.jobs == other.jobs
            && self.last_job_id == other.last_job_id
    }
}
