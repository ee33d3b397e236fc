use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::RawTimestamp;

// Below this magnitude a numeric string is epoch seconds and a raw number is a
// stopwatch reading rather than a wall-clock instant.
const SECONDS_OR_MILLIS_CUTOFF: f64 = 10_000_000.0;

const MS_PER_DAY: i64 = 86_400_000;

static CLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,3}):(\d{2})(?::(\d{2}))?\s*([AaPp])\.?[Mm]\.?$|^(\d{1,3}):(\d{2})(?::(\d{2}))?$")
        .expect("clock pattern is valid")
});

const DATETIME_FORMATS: [&str; 8] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// A parsed event time. All variants carry milliseconds; they differ in what the
/// value is measured from, which decides how it is labelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stamp {
    /// Time since kick-off ("mm:ss" or a small raw number).
    Elapsed(i64),
    /// Milliseconds since midnight ("HH:MM:SS", "7:05 PM").
    TimeOfDay(i64),
    /// Unix epoch milliseconds.
    Absolute(i64),
}

impl Stamp {
    pub fn millis(self) -> i64 {
        match self {
            Stamp::Elapsed(ms) | Stamp::TimeOfDay(ms) | Stamp::Absolute(ms) => ms,
        }
    }

    /// "m:ss" for elapsed time, "HH:MM" (UTC) for anything on a clock.
    pub fn label(self) -> String {
        match self {
            Stamp::Elapsed(ms) => {
                let secs = ms.max(0) / 1000;
                format!("{}:{:02}", secs / 60, secs % 60)
            }
            Stamp::TimeOfDay(ms) => {
                let ms = ms.rem_euclid(MS_PER_DAY);
                format!("{:02}:{:02}", ms / 3_600_000, (ms / 60_000) % 60)
            }
            Stamp::Absolute(ms) => match DateTime::<Utc>::from_timestamp_millis(ms) {
                Some(dt) => format!("{:02}:{:02}", dt.hour(), dt.minute()),
                None => String::new(),
            },
        }
    }
}

type Matcher = fn(&str) -> Option<Stamp>;

// Tried in order; the first matcher that recognises the text wins.
const TEXT_MATCHERS: [Matcher; 3] = [numeric_text, clock_text, calendar_text];

pub fn parse_timestamp(raw: &RawTimestamp) -> Option<Stamp> {
    match raw {
        RawTimestamp::Millis(ms) => from_raw_millis(*ms),
        RawTimestamp::Text(text) => parse_text(text),
    }
}

pub fn parse_text(raw: &str) -> Option<Stamp> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    TEXT_MATCHERS.iter().find_map(|matcher| matcher(s))
}

fn from_raw_millis(ms: f64) -> Option<Stamp> {
    if !ms.is_finite() {
        return None;
    }
    let rounded = ms.round() as i64;
    if ms.abs() < SECONDS_OR_MILLIS_CUTOFF {
        Some(Stamp::Elapsed(rounded))
    } else {
        Some(Stamp::Absolute(rounded))
    }
}

fn numeric_text(s: &str) -> Option<Stamp> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    let n = s.parse::<f64>().ok().filter(|n| n.is_finite())?;
    if n.abs() < SECONDS_OR_MILLIS_CUTOFF {
        Some(Stamp::Absolute((n * 1000.0).round() as i64))
    } else {
        Some(Stamp::Absolute(n.round() as i64))
    }
}

fn clock_text(s: &str) -> Option<Stamp> {
    let caps = CLOCK_RE.captures(s)?;
    if let Some(meridiem) = caps.get(4) {
        let hour = caps.get(1)?.as_str().parse::<i64>().ok()?;
        let minute = caps.get(2)?.as_str().parse::<i64>().ok()?;
        let second = caps
            .get(3)
            .and_then(|m| m.as_str().parse::<i64>().ok())
            .unwrap_or(0);
        if !(1..=12).contains(&hour) {
            return None;
        }
        let pm = meridiem.as_str().eq_ignore_ascii_case("p");
        let hour = hour % 12 + if pm { 12 } else { 0 };
        return time_of_day(hour, minute, second);
    }

    let first = caps.get(5)?.as_str().parse::<i64>().ok()?;
    let second_part = caps.get(6)?.as_str().parse::<i64>().ok()?;
    match caps.get(7) {
        Some(third) => {
            let third = third.as_str().parse::<i64>().ok()?;
            time_of_day(first, second_part, third)
        }
        None => {
            if second_part >= 60 {
                return None;
            }
            Some(Stamp::Elapsed((first * 60 + second_part) * 1000))
        }
    }
}

fn time_of_day(hour: i64, minute: i64, second: i64) -> Option<Stamp> {
    if hour >= 24 || minute >= 60 || second >= 60 {
        return None;
    }
    Some(Stamp::TimeOfDay(
        ((hour * 60 + minute) * 60 + second) * 1000,
    ))
}

fn calendar_text(s: &str) -> Option<Stamp> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(Stamp::Absolute(dt.timestamp_millis()));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Stamp::Absolute(dt.and_utc().timestamp_millis()));
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            let dt = d.and_hms_opt(0, 0, 0)?;
            return Some(Stamp::Absolute(dt.and_utc().timestamp_millis()));
        }
    }
    None
}

/// Epoch milliseconds for a match-level date field (`dateISO`, `date`, ...).
pub fn parse_date_millis(raw: &RawTimestamp) -> Option<i64> {
    match raw {
        RawTimestamp::Millis(ms) if ms.is_finite() => Some(ms.round() as i64),
        RawTimestamp::Millis(_) => None,
        RawTimestamp::Text(text) => match parse_text(text)? {
            Stamp::Absolute(ms) => Some(ms),
            Stamp::Elapsed(_) | Stamp::TimeOfDay(_) => None,
        },
    }
}
