//! Recurrence rules and the evaluator seam.
//!
//! The calendar never interprets rule text itself. It hands a
//! [`RecurrenceRule`] plus an anchor instant to a [`RecurrenceEvaluator`] and
//! receives concrete occurrence starts back. [`RRuleEvaluator`] is the default
//! implementation, wrapping the `rrule` crate; tests substitute deterministic
//! stubs.

use std::fmt;

use chrono::{DateTime, Utc};
use rrule::{RRuleSet, Tz};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Upper bound on occurrences produced by a single evaluation.
const MAX_OCCURRENCES: u16 = 10_000;

/// Opaque RFC 5545 rule text in canonical form (`FREQ=DAILY;INTERVAL=1`),
/// without the `RRULE:` property prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RecurrenceRule(String);

impl RecurrenceRule {
    /// Wrap rule text, trimming whitespace and a leading `RRULE:` if present.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let trimmed = text.trim();
        let body = match trimmed.get(..6) {
            Some(prefix) if prefix.eq_ignore_ascii_case("RRULE:") => &trimmed[6..],
            _ => trimmed,
        };
        Self(body.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RecurrenceRule {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<&str> for RecurrenceRule {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<RecurrenceRule> for String {
    fn from(rule: RecurrenceRule) -> Self {
        rule.0
    }
}

/// Expands a recurrence rule into concrete occurrence starts.
pub trait RecurrenceEvaluator {
    /// Every occurrence start of `rule` anchored at `anchor` that lies within
    /// `[from, to]`, both ends inclusive, ascending and without duplicates.
    ///
    /// # Errors
    /// Returns `EngineError::RecurrenceEvaluation` if the rule is malformed.
    fn occurrences_between(
        &self,
        rule: &RecurrenceRule,
        anchor: DateTime<Utc>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>>;
}

impl<E: RecurrenceEvaluator + ?Sized> RecurrenceEvaluator for &E {
    fn occurrences_between(
        &self,
        rule: &RecurrenceRule,
        anchor: DateTime<Utc>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>> {
        (**self).occurrences_between(rule, anchor, from, to)
    }
}

/// Evaluates rules with the `rrule` crate, anchoring `DTSTART` in UTC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RRuleEvaluator;

impl RecurrenceEvaluator for RRuleEvaluator {
    fn occurrences_between(
        &self,
        rule: &RecurrenceRule,
        anchor: DateTime<Utc>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>> {
        if rule.as_str().is_empty() {
            return Err(EngineError::RecurrenceEvaluation(
                "empty recurrence rule".to_string(),
            ));
        }
        if from > to {
            return Ok(Vec::new());
        }

        let rrule_text = format!(
            "DTSTART:{}\nRRULE:{}",
            anchor.format("%Y%m%dT%H%M%SZ"),
            utc_until(rule.as_str())
        );
        let rrule_set: RRuleSet = rrule_text
            .parse()
            .map_err(|e| EngineError::RecurrenceEvaluation(format!("{}: {}", rule, e)))?;

        let result = rrule_set
            .after(from.with_timezone(&Tz::UTC))
            .before(to.with_timezone(&Tz::UTC))
            .all(MAX_OCCURRENCES);
        if result.limited {
            tracing::warn!(
                rule = %rule,
                limit = MAX_OCCURRENCES,
                "recurrence expansion truncated"
            );
        }

        let mut occurrences: Vec<DateTime<Utc>> = result
            .dates
            .into_iter()
            .map(|dt| dt.with_timezone(&Utc))
            .filter(|dt| from <= *dt && *dt <= to)
            .collect();
        occurrences.sort();
        occurrences.dedup();
        Ok(occurrences)
    }
}

/// Rewrite a floating or date-only `UNTIL` as UTC to match the UTC `DTSTART`.
///
/// The `rrule` crate requires `UNTIL` and `DTSTART` to share a timezone.
/// Calendars written for floating or all-day starts carry `UNTIL=20240705T100000`
/// or `UNTIL=20240729`, which are read as UTC wall clock like the starts are.
fn utc_until(rule: &str) -> String {
    rule.split(';')
        .map(|part| match part.split_once('=') {
            Some((key, value)) if key.trim().eq_ignore_ascii_case("UNTIL") => {
                let value = value.trim();
                if value.ends_with(['Z', 'z']) {
                    format!("UNTIL={}", value)
                } else if value.len() == 8 {
                    format!("UNTIL={}T000000Z", value)
                } else {
                    format!("UNTIL={}Z", value)
                }
            }
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}
