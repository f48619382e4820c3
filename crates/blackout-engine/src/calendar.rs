//! Ordered collections of blackout events and their projection onto a period.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::event::{CalendarEvent, NamedInterval, RecurringEvent, SingleEvent};
use crate::ical::{CalendarImporter, EventRecord, IcsImporter};
use crate::interval::Interval;
use crate::interval_set::IntervalSet;
use crate::recurrence::{RecurrenceEvaluator, RecurrenceRule};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    #[serde(default)]
    events: Vec<CalendarEvent>,
}

impl Calendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: Vec<CalendarEvent>) -> Self {
        Self { events }
    }

    /// Build a calendar from iCalendar text with the bundled [`IcsImporter`].
    ///
    /// # Errors
    /// Returns `EngineError::CalendarParse` if the text cannot be read.
    pub fn from_ical(text: &str) -> Result<Self> {
        Self::import(text, &IcsImporter)
    }

    /// Build a calendar from text with any importer. Events are ordered by
    /// start; events sharing a start keep their source order.
    pub fn import<I: CalendarImporter + ?Sized>(text: &str, importer: &I) -> Result<Self> {
        let mut events = importer
            .import(text)?
            .into_iter()
            .map(CalendarEvent::try_from)
            .collect::<Result<Vec<_>>>()?;
        events.sort_by_key(CalendarEvent::start);
        Ok(Self { events })
    }

    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn push(&mut self, event: impl Into<CalendarEvent>) {
        self.events.push(event.into());
    }

    /// Append a single event, or a recurring one when `rule` is given.
    /// `stop_date` only applies to recurring events.
    pub fn add_event(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        name: Option<String>,
        rule: Option<RecurrenceRule>,
        stop_date: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let event: CalendarEvent = match rule {
            Some(rule) => RecurringEvent::new(start, end, name, rule, stop_date)?.into(),
            None => SingleEvent::new(start, end, name)?.into(),
        };
        self.events.push(event);
        Ok(())
    }

    /// All blackout time in `period`, merged across events.
    pub fn project_onto<E: RecurrenceEvaluator + ?Sized>(
        &self,
        period: Interval,
        evaluator: &E,
    ) -> Result<IntervalSet> {
        let mut blackout = IntervalSet::new();
        for event in &self.events {
            blackout.extend(&event.project_onto(period, evaluator)?);
        }
        Ok(blackout)
    }

    /// Every occurrence in `period` with its event's name, ordered by start.
    ///
    /// Nothing is merged, so overlapping events stay separate entries.
    pub fn project_as_named_events<E: RecurrenceEvaluator + ?Sized>(
        &self,
        period: Interval,
        evaluator: &E,
    ) -> Result<Vec<NamedInterval>> {
        let mut named = Vec::new();
        for event in &self.events {
            named.extend(event.named_occurrences(period, evaluator)?);
        }
        named.sort_by_key(|occurrence| occurrence.interval);
        Ok(named)
    }
}

impl TryFrom<EventRecord> for CalendarEvent {
    type Error = EngineError;

    fn try_from(record: EventRecord) -> Result<Self> {
        Ok(match record.recurrence_rule {
            Some(rule) => RecurringEvent::new(
                record.start,
                record.end,
                record.name,
                RecurrenceRule::new(rule),
                None,
            )?
            .into(),
            None => SingleEvent::new(record.start, record.end, record.name)?.into(),
        })
    }
}
