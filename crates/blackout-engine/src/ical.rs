//! Calendar-text import.
//!
//! [`CalendarImporter`] is the seam between raw calendar text and structured
//! [`EventRecord`]s. [`IcsImporter`] is a small line-based reader for the
//! subset of RFC 5545 a blackout calendar needs: `VEVENT` components with
//! `DTSTART`, `DTEND` or `DURATION`, `RRULE` and `SUMMARY`. Other components and
//! properties are skipped.
//!
//! Date-times are read as UTC wall-clock values. A `TZID` parameter is
//! accepted but not applied. `VALUE=DATE` values start at midnight, and an
//! all-day event with no end lasts one day.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

use crate::error::{EngineError, Result};

/// One event as read from calendar text, before it becomes a
/// [`CalendarEvent`](crate::event::CalendarEvent).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Rule text without the `RRULE:` prefix.
    pub recurrence_rule: Option<String>,
    pub name: Option<String>,
}

/// Turns calendar-exchange text into event records, in source order.
pub trait CalendarImporter {
    /// # Errors
    /// Returns `EngineError::CalendarParse` if the text cannot be tokenized or
    /// validated.
    fn import(&self, text: &str) -> Result<Vec<EventRecord>>;
}

/// Line-based iCalendar reader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IcsImporter;

impl CalendarImporter for IcsImporter {
    fn import(&self, text: &str) -> Result<Vec<EventRecord>> {
        let mut records = Vec::new();
        // (component name, line it began on)
        let mut stack: Vec<(String, usize)> = Vec::new();
        let mut saw_calendar = false;
        let mut pending: Option<PendingEvent> = None;

        for line in unfold(text) {
            let property = ContentLine::parse(&line)?;
            match property.name.as_str() {
                "BEGIN" => {
                    let component = property.value.trim().to_ascii_uppercase();
                    if stack.is_empty() {
                        if component != "VCALENDAR" {
                            return Err(parse_error(
                                line.number,
                                format!("expected BEGIN:VCALENDAR, found BEGIN:{}", component),
                            ));
                        }
                        saw_calendar = true;
                    }
                    if component == "VEVENT" && stack.len() == 1 {
                        pending = Some(PendingEvent::new(line.number));
                    }
                    stack.push((component, line.number));
                }
                "END" => {
                    let component = property.value.trim().to_ascii_uppercase();
                    match stack.pop() {
                        Some((open, _)) if open == component => {}
                        _ => {
                            return Err(parse_error(
                                line.number,
                                format!("END:{} without matching BEGIN", component),
                            ))
                        }
                    }
                    if component == "VEVENT" && stack.len() == 1 {
                        if let Some(event) = pending.take() {
                            records.push(event.finish(line.number)?);
                        }
                    }
                }
                _ => {
                    if stack.is_empty() {
                        return Err(parse_error(
                            line.number,
                            format!("{} outside of VCALENDAR", property.name),
                        ));
                    }
                    let in_event = stack.len() == 2 && stack[1].0 == "VEVENT";
                    if in_event {
                        if let Some(event) = pending.as_mut() {
                            event.apply(&property, line.number)?;
                        }
                    }
                }
            }
        }

        if let Some((open, begun)) = stack.pop() {
            return Err(parse_error(begun, format!("unterminated {}", open)));
        }
        if !saw_calendar {
            return Err(parse_error(1, "missing BEGIN:VCALENDAR"));
        }
        Ok(records)
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> EngineError {
    EngineError::CalendarParse {
        line,
        message: message.into(),
    }
}

/// A logical content line after unfolding, with the physical line it began on.
struct Line {
    number: usize,
    text: String,
}

/// Join folded continuation lines (those starting with a space or tab) onto
/// their predecessor and drop blank lines.
fn unfold(text: &str) -> Vec<Line> {
    let mut lines: Vec<Line> = Vec::new();
    for (index, raw) in text.split('\n').enumerate() {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        if let Some(continuation) = raw.strip_prefix([' ', '\t']) {
            if let Some(last) = lines.last_mut() {
                last.text.push_str(continuation);
                continue;
            }
        }
        if raw.trim().is_empty() {
            continue;
        }
        lines.push(Line {
            number: index + 1,
            text: raw.to_string(),
        });
    }
    lines
}

/// `NAME;PARAM=VALUE;...:value`
struct ContentLine {
    name: String,
    params: Vec<(String, String)>,
    value: String,
}

impl ContentLine {
    fn parse(line: &Line) -> Result<Self> {
        // The value starts at the first colon outside a quoted parameter value.
        let mut in_quotes = false;
        let mut split_at = None;
        for (i, ch) in line.text.char_indices() {
            match ch {
                '"' => in_quotes = !in_quotes,
                ':' if !in_quotes => {
                    split_at = Some(i);
                    break;
                }
                _ => {}
            }
        }
        let split_at = split_at.ok_or_else(|| {
            parse_error(line.number, format!("expected NAME:VALUE, found {:?}", line.text))
        })?;

        let (head, value) = (&line.text[..split_at], &line.text[split_at + 1..]);
        let mut parts = head.split(';');
        let name = parts.next().unwrap_or_default().trim().to_ascii_uppercase();
        if name.is_empty() {
            return Err(parse_error(line.number, "missing property name"));
        }
        let params = parts
            .map(|param| match param.split_once('=') {
                Some((key, val)) => (key.trim().to_ascii_uppercase(), val.trim_matches('"').to_string()),
                None => (param.trim().to_ascii_uppercase(), String::new()),
            })
            .collect();

        Ok(Self {
            name,
            params,
            value: value.to_string(),
        })
    }

    fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A date or date-time property value.
#[derive(Clone, Copy)]
struct DateValue {
    instant: DateTime<Utc>,
    all_day: bool,
}

fn parse_date_value(property: &ContentLine, line: usize) -> Result<DateValue> {
    let raw = property.value.trim();
    let is_date = property
        .param("VALUE")
        .map(|v| v.eq_ignore_ascii_case("DATE"))
        .unwrap_or(raw.len() == 8);

    let parsed = if is_date {
        NaiveDate::parse_from_str(raw, "%Y%m%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
    } else {
        let raw = raw.strip_suffix(['Z', 'z']).unwrap_or(raw);
        NaiveDateTime::parse_from_str(raw, "%Y%m%dT%H%M%S").ok()
    };

    parsed
        .map(|naive| DateValue {
            instant: naive.and_utc(),
            all_day: is_date,
        })
        .ok_or_else(|| {
            parse_error(
                line,
                format!("invalid {} value {:?}", property.name, property.value),
            )
        })
}

/// Parse an RFC 5545 duration such as `PT1H30M`, `P1D` or `-P2W`.
fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let (negative, rest) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };
    let rest = rest.strip_prefix(['P', 'p'])?;

    let mut total = Duration::zero();
    let mut number = String::new();
    let mut in_time = false;
    let mut saw_component = false;
    for ch in rest.chars() {
        match ch.to_ascii_uppercase() {
            digit @ '0'..='9' => number.push(digit),
            'T' if !in_time && number.is_empty() => in_time = true,
            unit @ ('W' | 'D' | 'H' | 'M' | 'S') => {
                let n: i64 = number.parse().ok()?;
                number.clear();
                let part = match (unit, in_time) {
                    ('W', false) => Duration::try_weeks(n)?,
                    ('D', false) => Duration::try_days(n)?,
                    ('H', true) => Duration::try_hours(n)?,
                    ('M', true) => Duration::try_minutes(n)?,
                    ('S', true) => Duration::try_seconds(n)?,
                    _ => return None,
                };
                total = total.checked_add(&part)?;
                saw_component = true;
            }
            _ => return None,
        }
    }
    if !number.is_empty() || !saw_component {
        return None;
    }
    Some(if negative { -total } else { total })
}

/// Undo RFC 5545 TEXT escaping.
fn unescape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Properties collected between `BEGIN:VEVENT` and `END:VEVENT`.
struct PendingEvent {
    begun: usize,
    start: Option<DateValue>,
    end: Option<DateValue>,
    duration: Option<Duration>,
    recurrence_rule: Option<String>,
    name: Option<String>,
}

impl PendingEvent {
    fn new(begun: usize) -> Self {
        Self {
            begun,
            start: None,
            end: None,
            duration: None,
            recurrence_rule: None,
            name: None,
        }
    }

    fn apply(&mut self, property: &ContentLine, line: usize) -> Result<()> {
        match property.name.as_str() {
            "DTSTART" => self.start = Some(parse_date_value(property, line)?),
            "DTEND" => self.end = Some(parse_date_value(property, line)?),
            "DURATION" => {
                self.duration = Some(parse_duration(&property.value).ok_or_else(|| {
                    parse_error(line, format!("invalid DURATION value {:?}", property.value))
                })?)
            }
            "RRULE" => {
                if self.recurrence_rule.is_none() {
                    self.recurrence_rule = Some(property.value.trim().to_string());
                }
            }
            "SUMMARY" => self.name = Some(unescape_text(&property.value)),
            _ => {}
        }
        Ok(())
    }

    fn finish(self, line: usize) -> Result<EventRecord> {
        let start = self
            .start
            .ok_or_else(|| parse_error(self.begun, "VEVENT without DTSTART"))?;
        let end = match (self.end, self.duration) {
            (Some(end), _) => end.instant,
            (None, Some(duration)) => start
                .instant
                .checked_add_signed(duration)
                .ok_or_else(|| parse_error(line, "DURATION out of range"))?,
            (None, None) if start.all_day => start
                .instant
                .checked_add_signed(Duration::days(1))
                .ok_or_else(|| parse_error(line, "all-day event out of range"))?,
            (None, None) => start.instant,
        };
        if end < start.instant {
            return Err(parse_error(line, "VEVENT ends before it starts"));
        }
        Ok(EventRecord {
            start: start.instant,
            end,
            recurrence_rule: self.recurrence_rule,
            name: self.name,
        })
    }
}
