//! Tests for the lenient UTC timestamp reader and the snapshot text form.

use chrono::{TimeZone, Utc};
use blackout_engine::timestamp::{format_utc, parse_utc};

#[test]
fn naive_forms_are_read_as_utc() {
    let expected = Utc.with_ymd_and_hms(2024, 7, 1, 10, 0, 0).unwrap();
    assert_eq!(parse_utc("2024-07-01T10:00:00"), Some(expected));
    assert_eq!(parse_utc("2024-07-01T10:00"), Some(expected));
    assert_eq!(parse_utc("2024-07-01 10:00:00"), Some(expected));
    assert_eq!(parse_utc("2024-07-01T10:00:00.000"), Some(expected));
}

#[test]
fn offsets_are_converted_to_utc() {
    let expected = Utc.with_ymd_and_hms(2024, 7, 1, 8, 0, 0).unwrap();
    assert_eq!(parse_utc("2024-07-01T10:00:00+02:00"), Some(expected));
    assert_eq!(parse_utc("2024-07-01T08:00:00Z"), Some(expected));
    assert_eq!(parse_utc("2024-07-01T08:00:00.000Z"), Some(expected));
}

#[test]
fn date_only_is_midnight() {
    assert_eq!(
        parse_utc("2024-07-01"),
        Some(Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap())
    );
}

#[test]
fn garbage_is_rejected() {
    assert_eq!(parse_utc("next tuesday"), None);
    assert_eq!(parse_utc(""), None);
    assert_eq!(parse_utc("2024-13-01T00:00:00"), None);
}

#[test]
fn whole_seconds_format_without_fraction() {
    let dt = Utc.with_ymd_and_hms(2024, 7, 1, 10, 0, 0).unwrap();
    assert_eq!(format_utc(&dt), "2024-07-01T10:00:00Z");
}

#[test]
fn formatted_value_parses_back() {
    let dt = Utc.with_ymd_and_hms(2031, 12, 31, 23, 59, 59).unwrap();
    assert_eq!(parse_utc(&format_utc(&dt)), Some(dt));
}
