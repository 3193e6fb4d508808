//! Date arguments accepted by the query builders.
//!
//! A date is either an absolute point in time or a relative ISO-8601
//! duration (`P7D`, `PT12H`, ...). Absolute dates are sent to the API as
//! millisecond-precision UTC strings (`2023-01-01T00:00:00.000Z`).

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use std::sync::OnceLock;

use crate::error::{IncydrError, Result};

/// Naive formats tried, in order, after RFC 3339. Naive values are UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

fn duration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^P(\d+Y)?(\d+M)?(\d+W)?(\d+D)?(T(\d+H)?(\d+M)?(\d+(\.\d+)?S)?)?$")
            .expect("duration pattern is valid")
    })
}

fn shorthand_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)([dhm])$").expect("shorthand pattern is valid"))
}

/// Returns `true` for a well-formed ISO-8601 duration with at least one
/// component.
pub fn is_iso_duration(value: &str) -> bool {
    value != "P" && !value.ends_with('T') && duration_regex().is_match(value)
}

/// Formats a timestamp the way the Incydr search APIs expect.
pub fn format_ms_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Parses an API timestamp (RFC 3339, any precision).
pub fn parse_api_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// A start or end date for a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateInput {
    /// A point in time.
    Absolute(DateTime<Utc>),
    /// An ISO-8601 duration counted back from now, e.g. `P7D`.
    Relative(String),
}

impl DateInput {
    /// Parses a duration (`P30D`) or a date string (`2023-01-01`,
    /// `2023-01-01 12:00:00`, RFC 3339).
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.starts_with('P') {
            if is_iso_duration(value) {
                return Ok(DateInput::Relative(value.to_string()));
            }
            return Err(date_error(value, "not a valid ISO-8601 duration"));
        }
        parse_absolute(value).map(DateInput::Absolute)
    }

    /// Like `parse`, but also accepts the CLI shorthand `30d`, `12h`, `15m`.
    pub fn parse_with_shorthand(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if let Some(caps) = shorthand_regex().captures(trimmed) {
            let amount = &caps[1];
            let iso = match &caps[2] {
                "d" => format!("P{amount}D"),
                "h" => format!("PT{amount}H"),
                _ => format!("PT{amount}M"),
            };
            return Ok(DateInput::Relative(iso));
        }
        Self::parse(trimmed)
    }

    /// Epoch seconds with fractional milliseconds.
    pub fn from_epoch_secs(secs: f64) -> Result<Self> {
        if !secs.is_finite() {
            return Err(date_error(&secs.to_string(), "epoch value is not finite"));
        }
        let millis = (secs * 1000.0).round() as i64;
        Utc.timestamp_millis_opt(millis)
            .single()
            .map(DateInput::Absolute)
            .ok_or_else(|| date_error(&secs.to_string(), "epoch value out of range"))
    }

    pub fn is_relative(&self) -> bool {
        matches!(self, DateInput::Relative(_))
    }

    /// Resolves a relative date against `now`. Years count as 365 days and
    /// months as 30.
    pub fn to_absolute(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        match self {
            DateInput::Absolute(dt) => Ok(*dt),
            DateInput::Relative(iso) => {
                let span = iso_duration_to_chrono(iso)
                    .ok_or_else(|| date_error(iso, "not a valid ISO-8601 duration"))?;
                now.checked_sub_signed(span)
                    .ok_or_else(|| date_error(iso, "duration reaches before the epoch range"))
            }
        }
    }

    /// The value placed in a filter: the duration itself, or a millisecond
    /// timestamp.
    pub fn to_filter_value(&self) -> String {
        match self {
            DateInput::Absolute(dt) => format_ms_timestamp(dt),
            DateInput::Relative(duration) => duration.clone(),
        }
    }
}

impl From<DateTime<Utc>> for DateInput {
    fn from(dt: DateTime<Utc>) -> Self {
        DateInput::Absolute(dt)
    }
}

impl From<NaiveDate> for DateInput {
    fn from(date: NaiveDate) -> Self {
        DateInput::Absolute(date.and_time(chrono::NaiveTime::MIN).and_utc())
    }
}

/// Epoch seconds.
impl TryFrom<i64> for DateInput {
    type Error = IncydrError;

    fn try_from(secs: i64) -> Result<Self> {
        Utc.timestamp_opt(secs, 0)
            .single()
            .map(DateInput::Absolute)
            .ok_or_else(|| date_error(&secs.to_string(), "epoch value out of range"))
    }
}

impl TryFrom<&str> for DateInput {
    type Error = IncydrError;

    fn try_from(value: &str) -> Result<Self> {
        DateInput::parse(value)
    }
}

impl TryFrom<f64> for DateInput {
    type Error = IncydrError;

    fn try_from(secs: f64) -> Result<Self> {
        DateInput::from_epoch_secs(secs)
    }
}

/// A positive duration becomes `P{n}D` for whole days, else `PT{n}S`.
impl TryFrom<chrono::Duration> for DateInput {
    type Error = IncydrError;

    fn try_from(duration: chrono::Duration) -> Result<Self> {
        let secs = duration.num_seconds();
        if secs <= 0 {
            return Err(date_error(
                &duration.to_string(),
                "relative duration must be positive",
            ));
        }
        let iso = if secs % 86_400 == 0 {
            format!("P{}D", secs / 86_400)
        } else {
            format!("PT{secs}S")
        };
        Ok(DateInput::Relative(iso))
    }
}

fn parse_absolute(value: &str) -> Result<DateTime<Utc>> {
    if let Some(dt) = parse_api_timestamp(value) {
        return Ok(dt);
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
    }
    Err(date_error(
        value,
        "expected yyyy-MM-dd, yyyy-MM-dd HH:MM:SS, RFC 3339 or an ISO-8601 duration",
    ))
}

fn iso_duration_to_chrono(value: &str) -> Option<chrono::Duration> {
    if !is_iso_duration(value) {
        return None;
    }
    let caps = duration_regex().captures(value)?;
    let whole = |idx: usize| -> i64 {
        caps.get(idx)
            .and_then(|m| m.as_str()[..m.as_str().len() - 1].parse().ok())
            .unwrap_or(0)
    };
    let seconds: f64 = caps
        .get(8)
        .and_then(|m| m.as_str().trim_end_matches('S').parse().ok())
        .unwrap_or(0.0);
    let days = whole(1) * 365 + whole(2) * 30 + whole(3) * 7 + whole(4);
    let span = chrono::Duration::days(days)
        + chrono::Duration::hours(whole(6))
        + chrono::Duration::minutes(whole(7))
        + chrono::Duration::milliseconds((seconds * 1000.0).round() as i64);
    Some(span)
}

fn date_error(input: &str, reason: &str) -> IncydrError {
    IncydrError::DateParse {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}
