//! Blackout event templates.
//!
//! A [`CalendarEvent`] is either a one-off [`SingleEvent`] or a
//! [`RecurringEvent`] whose first occurrence fixes the duration of every later
//! one. Both project onto a period as an [`IntervalSet`] of blackout time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::interval::{offset, Interval};
use crate::interval_set::IntervalSet;
use crate::recurrence::{RecurrenceEvaluator, RecurrenceRule};
use crate::timestamp;

/// One occurrence of an event, carrying the event's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedInterval {
    pub name: Option<String>,
    #[serde(flatten)]
    pub interval: Interval,
}

/// A blackout that happens once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSingleEvent")]
pub struct SingleEvent {
    #[serde(with = "timestamp::utc")]
    start: DateTime<Utc>,
    #[serde(with = "timestamp::utc")]
    end: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl SingleEvent {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, name: Option<String>) -> Result<Self> {
        Interval::new(start, end)?;
        Ok(Self { start, end, name })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The part of this event inside `period`.
    ///
    /// Overlap is tested half-open (`start < period.end && end > period.start`),
    /// so an event that only touches the period's edge yields nothing.
    pub fn project_onto(&self, period: Interval) -> IntervalSet {
        self.clipped_to(period).into_iter().collect()
    }

    fn clipped_to(&self, period: Interval) -> Option<Interval> {
        if self.start < period.end() && self.end > period.start() {
            Some(Interval::from_ordered(
                self.start.max(period.start()),
                self.end.min(period.end()),
            ))
        } else {
            None
        }
    }
}

/// A blackout repeating according to a recurrence rule.
///
/// `start`/`end` describe the first occurrence. `stop_date`, when set, caps
/// expansion in addition to whatever the rule itself says.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRecurringEvent")]
pub struct RecurringEvent {
    #[serde(with = "timestamp::utc")]
    start: DateTime<Utc>,
    #[serde(with = "timestamp::utc")]
    end: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    recurrence_rule: RecurrenceRule,
    #[serde(
        with = "timestamp::utc_option",
        skip_serializing_if = "Option::is_none"
    )]
    stop_date: Option<DateTime<Utc>>,
}

impl RecurringEvent {
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        name: Option<String>,
        recurrence_rule: RecurrenceRule,
        stop_date: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        Interval::new(start, end)?;
        Ok(Self {
            start,
            end,
            name,
            recurrence_rule,
            stop_date,
        })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn recurrence_rule(&self) -> &RecurrenceRule {
        &self.recurrence_rule
    }

    pub fn stop_date(&self) -> Option<DateTime<Utc>> {
        self.stop_date
    }

    /// Blackout time of every occurrence starting inside `period`.
    ///
    /// Occurrences keep their full duration even when they run past
    /// `period.end`; overlapping occurrences merge.
    pub fn project_onto<E: RecurrenceEvaluator + ?Sized>(
        &self,
        period: Interval,
        evaluator: &E,
    ) -> Result<IntervalSet> {
        Ok(self.occurrences(period, evaluator)?.into_iter().collect())
    }

    fn occurrences<E: RecurrenceEvaluator + ?Sized>(
        &self,
        period: Interval,
        evaluator: &E,
    ) -> Result<Vec<Interval>> {
        let effective_end = match self.stop_date {
            Some(stop) => stop.min(period.end()),
            None => period.end(),
        };
        if effective_end < period.start() {
            return Ok(Vec::new());
        }

        let duration = self.end - self.start;
        let starts = evaluator.occurrences_between(
            &self.recurrence_rule,
            self.start,
            period.start(),
            effective_end,
        )?;
        starts
            .into_iter()
            .map(|start| Ok(Interval::from_ordered(start, offset(start, duration)?)))
            .collect()
    }
}

/// A blackout template in a [`Calendar`](crate::calendar::Calendar).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalendarEvent {
    Single(SingleEvent),
    Recurring(RecurringEvent),
}

impl CalendarEvent {
    pub fn start(&self) -> DateTime<Utc> {
        match self {
            CalendarEvent::Single(event) => event.start(),
            CalendarEvent::Recurring(event) => event.start(),
        }
    }

    pub fn end(&self) -> DateTime<Utc> {
        match self {
            CalendarEvent::Single(event) => event.end(),
            CalendarEvent::Recurring(event) => event.end(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            CalendarEvent::Single(event) => event.name(),
            CalendarEvent::Recurring(event) => event.name(),
        }
    }

    /// Blackout time this event contributes to `period`.
    pub fn project_onto<E: RecurrenceEvaluator + ?Sized>(
        &self,
        period: Interval,
        evaluator: &E,
    ) -> Result<IntervalSet> {
        match self {
            CalendarEvent::Single(event) => Ok(event.project_onto(period)),
            CalendarEvent::Recurring(event) => event.project_onto(period, evaluator),
        }
    }

    /// Each occurrence inside `period` as its own named interval, unmerged.
    pub fn named_occurrences<E: RecurrenceEvaluator + ?Sized>(
        &self,
        period: Interval,
        evaluator: &E,
    ) -> Result<Vec<NamedInterval>> {
        let spans = match self {
            CalendarEvent::Single(event) => event.clipped_to(period).into_iter().collect(),
            CalendarEvent::Recurring(event) => event.occurrences(period, evaluator)?,
        };
        let name = self.name().map(str::to_string);
        Ok(spans
            .into_iter()
            .map(|interval| NamedInterval {
                name: name.clone(),
                interval,
            })
            .collect())
    }
}

impl From<SingleEvent> for CalendarEvent {
    fn from(event: SingleEvent) -> Self {
        CalendarEvent::Single(event)
    }
}

impl From<RecurringEvent> for CalendarEvent {
    fn from(event: RecurringEvent) -> Self {
        CalendarEvent::Recurring(event)
    }
}

#[derive(Deserialize)]
struct RawSingleEvent {
    #[serde(with = "timestamp::utc")]
    start: DateTime<Utc>,
    #[serde(with = "timestamp::utc")]
    end: DateTime<Utc>,
    #[serde(default)]
    name: Option<String>,
}

impl TryFrom<RawSingleEvent> for SingleEvent {
    type Error = EngineError;

    fn try_from(raw: RawSingleEvent) -> Result<Self> {
        SingleEvent::new(raw.start, raw.end, raw.name)
    }
}

#[derive(Deserialize)]
struct RawRecurringEvent {
    #[serde(with = "timestamp::utc")]
    start: DateTime<Utc>,
    #[serde(with = "timestamp::utc")]
    end: DateTime<Utc>,
    #[serde(default)]
    name: Option<String>,
    recurrence_rule: RecurrenceRule,
    #[serde(default, with = "timestamp::utc_option")]
    stop_date: Option<DateTime<Utc>>,
}

impl TryFrom<RawRecurringEvent> for RecurringEvent {
    type Error = EngineError;

    fn try_from(raw: RawRecurringEvent) -> Result<Self> {
        RecurringEvent::new(
            raw.start,
            raw.end,
            raw.name,
            raw.recurrence_rule,
            raw.stop_date,
        )
    }
}
