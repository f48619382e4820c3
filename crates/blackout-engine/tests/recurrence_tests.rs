//! Tests for rule text handling and the rrule-backed evaluator.

use blackout_engine::{EngineError, RRuleEvaluator, RecurrenceEvaluator, RecurrenceRule};
use chrono::{DateTime, TimeZone, Utc};

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, day, hour, 0, 0).unwrap()
}

#[test]
fn rule_text_drops_property_prefix() {
    assert_eq!(RecurrenceRule::new("RRULE:FREQ=DAILY").as_str(), "FREQ=DAILY");
    assert_eq!(RecurrenceRule::new("  rrule:FREQ=WEEKLY \r\n").as_str(), "FREQ=WEEKLY");
    assert_eq!(RecurrenceRule::new("FREQ=MONTHLY").to_string(), "FREQ=MONTHLY");
}

#[test]
fn rule_serializes_as_plain_string() {
    let rule = RecurrenceRule::new("FREQ=DAILY;INTERVAL=2");
    assert_eq!(serde_json::to_string(&rule).unwrap(), r#""FREQ=DAILY;INTERVAL=2""#);

    let back: RecurrenceRule = serde_json::from_str(r#""RRULE:FREQ=DAILY""#).unwrap();
    assert_eq!(back.as_str(), "FREQ=DAILY");
}

#[test]
fn bounds_are_inclusive() {
    let rule = RecurrenceRule::new("FREQ=DAILY");
    let occurrences = RRuleEvaluator
        .occurrences_between(&rule, at(1, 10), at(2, 10), at(4, 10))
        .unwrap();

    assert_eq!(occurrences, vec![at(2, 10), at(3, 10), at(4, 10)]);
}

#[test]
fn anchor_is_first_occurrence() {
    let rule = RecurrenceRule::new("FREQ=DAILY;COUNT=3");
    let occurrences = RRuleEvaluator
        .occurrences_between(&rule, at(1, 10), at(1, 0), at(31, 0))
        .unwrap();

    assert_eq!(occurrences, vec![at(1, 10), at(2, 10), at(3, 10)]);
}

#[test]
fn window_before_anchor_is_empty() {
    let rule = RecurrenceRule::new("FREQ=DAILY");
    let occurrences = RRuleEvaluator
        .occurrences_between(&rule, at(10, 10), at(1, 0), at(5, 0))
        .unwrap();

    assert!(occurrences.is_empty());
}

#[test]
fn reversed_window_is_empty() {
    let rule = RecurrenceRule::new("FREQ=DAILY");
    let occurrences = RRuleEvaluator
        .occurrences_between(&rule, at(1, 10), at(5, 0), at(2, 0))
        .unwrap();

    assert!(occurrences.is_empty());
}

#[test]
fn malformed_rule_is_an_evaluation_error() {
    let rule = RecurrenceRule::new("FREQ=SOMETIMES");
    let err = RRuleEvaluator
        .occurrences_between(&rule, at(1, 10), at(1, 0), at(5, 0))
        .unwrap_err();

    assert!(matches!(err, EngineError::RecurrenceEvaluation(_)), "got {err}");
}

#[test]
fn empty_rule_is_an_evaluation_error() {
    let rule = RecurrenceRule::new("   ");
    let err = RRuleEvaluator
        .occurrences_between(&rule, at(1, 10), at(1, 0), at(5, 0))
        .unwrap_err();

    assert!(matches!(err, EngineError::RecurrenceEvaluation(_)));
}

#[test]
fn evaluator_works_through_a_reference() {
    fn count<E: RecurrenceEvaluator>(evaluator: E) -> usize {
        evaluator
            .occurrences_between(
                &RecurrenceRule::new("FREQ=HOURLY"),
                at(1, 0),
                at(1, 0),
                at(1, 5),
            )
            .map(|o| o.len())
            .unwrap_or(0)
    }

    assert_eq!(count(&RRuleEvaluator), 6);
}

#[test]
fn date_only_until_is_read_as_utc_midnight() {
    let rule = RecurrenceRule::new("FREQ=DAILY;UNTIL=20240703");
    let occurrences = RRuleEvaluator
        .occurrences_between(&rule, at(1, 10), at(1, 0), at(31, 0))
        .unwrap();

    assert_eq!(occurrences, vec![at(1, 10), at(2, 10)]);
}

#[test]
fn floating_until_is_read_as_utc() {
    let rule = RecurrenceRule::new("FREQ=DAILY;UNTIL=20240703T100000");
    let occurrences = RRuleEvaluator
        .occurrences_between(&rule, at(1, 10), at(1, 0), at(31, 0))
        .unwrap();

    assert_eq!(occurrences, vec![at(1, 10), at(2, 10), at(3, 10)]);
}
