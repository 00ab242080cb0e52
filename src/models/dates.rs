//! Date and timestamp codecs
//!
//! The backend takes calendar dates as `DD-MM-YYYY`, and has been seen to
//! return them either that way or as ISO 8601. Readers accept both.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Calendar date format used on the wire
pub const WIRE_FORMAT: &str = "%d-%m-%Y";
/// Calendar date format used for display
pub const DISPLAY_FORMAT: &str = "%d/%m/%Y";

pub fn format_wire(date: NaiveDate) -> String {
    date.format(WIRE_FORMAT).to_string()
}

pub fn format_display(date: NaiveDate) -> String {
    date.format(DISPLAY_FORMAT).to_string()
}

/// Parse a calendar date in wire, ISO or full timestamp form
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, WIRE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
        .or_else(|| parse_timestamp(raw).map(|ts| ts.date_naive()))
}

/// Parse an RFC 3339 timestamp, or a naive one taken as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// Serde codec for `Option<NaiveDate>` written as `DD-MM-YYYY`
pub mod wire_date_option {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => serializer.serialize_str(&super::format_wire(*date)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => super::parse_date(&raw)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid date: {}", raw))),
        }
    }
}

/// Serde codec for a required timestamp
pub mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw)))
    }
}

/// Serde codec for an optional timestamp
pub mod timestamp_option {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => super::parse_timestamp(&raw)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw))),
        }
    }
}
