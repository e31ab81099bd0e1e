//! Parsing for the dashboard's custom timestamp format,
//! e.g. `"Sat, 22/FEB, 21:29:26"` or `"Sat, 22/FEB/2025, 21:29:26"`.
//!
//! The short form carries no year, so the caller supplies one. The weekday is
//! ignored: it is not cross-checked against the resolved date. The text is a
//! wall-clock reading in the zone of the process that wrote the log, given
//! here as a [`SourceZone`].

use crate::error::{Error, Result};
use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use log::warn;
use std::fmt;
use std::str::FromStr;
use std::sync::Once;

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

static IMPLIED_YEAR_WARNING: Once = Once::new();

/// Year used for timestamps without one: the configured year if any,
/// otherwise the current UTC year.
pub fn resolve_year(configured: Option<i32>) -> i32 {
    match configured {
        Some(year) => year,
        None => {
            let year = Utc::now().year();
            IMPLIED_YEAR_WARNING.call_once(|| {
                warn!(
                    "No explicit year configured; assuming {} for timestamps without a year. \
                     Data spanning a year boundary will be misplaced.",
                    year
                );
            });
            year
        }
    }
}

/// Zone the log timestamps were written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceZone {
    /// The zone of the machine reading the logs, DST included.
    #[default]
    Local,
    Fixed(FixedOffset),
}

impl SourceZone {
    pub fn utc() -> Self {
        SourceZone::Fixed(Utc.fix())
    }

    /// Converts a wall-clock reading to an instant. Ambiguous readings (DST
    /// fall-back) resolve to the earlier instant; readings inside a DST gap
    /// do not exist and yield `None`.
    pub fn to_utc(&self, wall_clock: &NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            SourceZone::Local => Local
                .from_local_datetime(wall_clock)
                .earliest()
                .map(|at| at.with_timezone(&Utc)),
            SourceZone::Fixed(offset) => offset
                .from_local_datetime(wall_clock)
                .single()
                .map(|at| at.with_timezone(&Utc)),
        }
    }
}

impl FromStr for SourceZone {
    type Err = Error;

    /// Accepts `local`, `utc`/`z`, or an offset such as `+05:30`, `-05:00`
    /// or `-5`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "local" => return Ok(SourceZone::Local),
            "utc" | "z" => return Ok(SourceZone::utc()),
            _ => {}
        }

        let invalid = || Error::InvalidInput(format!("invalid UTC offset '{}', expected e.g. +05:00", s));
        let (sign, rest) = match s.chars().next() {
            Some('+') => (1, &s[1..]),
            Some('-') => (-1, &s[1..]),
            _ => return Err(invalid()),
        };
        let (hours, minutes) = match rest.split_once(':') {
            Some((h, m)) => (h, m),
            None => (rest, "0"),
        };
        let hours: i32 = hours.parse().map_err(|_| invalid())?;
        let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
        if !(0..60).contains(&minutes) {
            return Err(invalid());
        }
        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(SourceZone::Fixed)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for SourceZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceZone::Local => write!(f, "local"),
            SourceZone::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

fn month_from_name(name: &str) -> Option<u32> {
    if name.len() < 3 || !name.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let prefix = name[..3].to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == prefix)
        .map(|idx| idx as u32 + 1)
}

/// Parses `"<DayOfWeek>, <Day>/<Month>[/<Year>], <HH>:<MM>:<SS>"` read as a
/// wall-clock time in `zone`. `default_year` applies when the text has no
/// year. Returns `None` for anything malformed or for impossible dates such
/// as `31/FEB`.
pub fn parse_custom_date(raw: &str, default_year: i32, zone: SourceZone) -> Option<DateTime<Utc>> {
    let mut parts = raw.trim().splitn(3, ',');
    let weekday = parts.next()?.trim();
    let date_part = parts.next()?.trim();
    let time_part = parts.next()?.trim();

    if weekday.is_empty() || !weekday.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }

    let mut date_fields = date_part.split('/');
    let day: u32 = date_fields.next()?.trim().parse().ok()?;
    let month = month_from_name(date_fields.next()?.trim())?;
    let year = match date_fields.next() {
        Some(year) => year.trim().parse().ok()?,
        None => default_year,
    };
    if date_fields.next().is_some() {
        return None;
    }

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let time = NaiveTime::parse_from_str(time_part, "%H:%M:%S").ok()?;
    zone.to_utc(&date.and_time(time))
}
