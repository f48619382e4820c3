//! Text forms for instants and durations.
//!
//! Every instant is written in UTC as RFC 3339 (`2024-07-01T10:00:00Z`).
//! Reading is lenient: an offset-qualified timestamp is converted to UTC, and a
//! naive timestamp (`2024-07-01T10:00:00`, `2024-07-01T10:00`, `2024-07-01`) is
//! taken to already be in UTC.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a timestamp, assuming UTC when no zone information is present.
///
/// Returns `None` when `raw` matches none of the accepted forms.
pub fn parse_utc(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Format an instant the way snapshots store it.
pub fn format_utc(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// `#[serde(with = "timestamp::utc")]` for `DateTime<Utc>` fields.
pub mod utc {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_utc(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_utc(&raw)
            .ok_or_else(|| de::Error::custom(format!("unrecognized timestamp: {raw:?}")))
    }
}

/// `#[serde(with = "timestamp::utc_option")]` for `Option<DateTime<Utc>>` fields.
pub mod utc_option {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        dt: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match dt {
            Some(dt) => serializer.serialize_some(&super::format_utc(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => super::parse_utc(&raw)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("unrecognized timestamp: {raw:?}"))),
            None => Ok(None),
        }
    }
}

/// `#[serde(with = "timestamp::seconds")]` for non-negative `Duration` fields,
/// stored as whole seconds.
pub mod seconds {
    use chrono::Duration;
    use serde::{de, ser, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        if duration.subsec_nanos() != 0 {
            return Err(ser::Error::custom(format!(
                "duration {duration} is not a whole number of seconds"
            )));
        }
        serializer.serialize_i64(duration.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = i64::deserialize(deserializer)?;
        if secs < 0 {
            return Err(de::Error::custom(format!("negative duration: {secs}s")));
        }
        super::duration_from_seconds(secs)
            .ok_or_else(|| de::Error::custom(format!("duration out of range: {secs}s")))
    }
}

/// Checked conversion from whole seconds.
pub fn duration_from_seconds(secs: i64) -> Option<Duration> {
    Duration::try_seconds(secs)
}
