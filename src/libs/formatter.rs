//! Date input and output for the command line.
//!
//! Due dates are accepted in these forms:
//!
//! - RFC 3339 (`2026-01-08T15:00:00+02:00`), keeping its own offset
//! - Local wall time: `2026-01-08 15:00`, `2026-01-08T15:00`, `2026-01-08 15:00:30`
//! - A bare local date, `2026-01-08`, meaning 23:59 that day
//! - Relative phrases: `in 90 minutes`, `in 2 days`, `in 1 week`
//! - Day words with an optional time: `today`, `tomorrow at 5pm`, `next Friday at 3:30pm`
//! - A bare clock time (`5pm`, `17:30`), today if still ahead, otherwise tomorrow

use crate::libs::messages::Message;
use crate::msg_bail_anyhow;
use anyhow::Result;
use chrono::{DateTime, Datelike, Duration, FixedOffset, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;

pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M %:z";

const LOCAL_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

static RELATIVE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^in\s+(\d+)\s*(minutes?|mins?|hours?|hrs?|days?|weeks?)$").expect("valid relative regex"));
static DAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(today|tomorrow|(?:next\s+)?(?:mon|tues|wednes|thurs|fri|satur|sun)day)(?:\s+at\s+(.+))?$").expect("valid day regex")
});
static CLOCK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(?:at\s+)?(\d{1,2})(?::(\d{2}))?\s*(am|pm)?$").expect("valid clock regex"));

/// Parses a due date typed on the command line, relative to the local clock.
///
/// See the module docs for the accepted forms.
pub fn parse_when(value: &str) -> Result<DateTime<FixedOffset>> {
    parse_when_in(value, &Local::now())
}

/// Parses a due date with wall-clock forms read in the timezone of `now`.
///
/// Relative phrases and day words are resolved against `now` and always
/// land after it, except for an explicit `today`.
///
/// # Arguments
///
/// * `value` - The text typed by the user
/// * `now` - Reference instant, also supplying the timezone
///
/// # Examples
///
/// ```
/// use chrono::{FixedOffset, TimeZone};
/// use rekur::libs::formatter::parse_when_in;
///
/// let now = FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2026, 3, 5, 10, 0, 0).unwrap();
/// let due = parse_when_in("tomorrow at 5pm", &now).unwrap();
/// assert_eq!(due.to_rfc3339(), "2026-03-06T17:00:00+00:00");
/// ```
pub fn parse_when_in<Tz: TimeZone>(value: &str, now: &DateTime<Tz>) -> Result<DateTime<FixedOffset>> {
    let value = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Ok(date);
    }

    let absolute = LOCAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok().map(|d| d.and_time(end_of_day())));

    let resolved = match absolute {
        Some(naive) => resolve(&now.timezone(), naive),
        None => parse_natural(value, now),
    };
    match resolved {
        Some(date) => Ok(date),
        None => msg_bail_anyhow!(Message::InvalidDate(value.to_string())),
    }
}

fn parse_natural<Tz: TimeZone>(value: &str, now: &DateTime<Tz>) -> Option<DateTime<FixedOffset>> {
    if let Some(caps) = RELATIVE_RE.captures(value) {
        let amount: i64 = caps[1].parse().ok()?;
        let offset = match caps[2].to_ascii_lowercase().chars().next()? {
            'm' => Duration::try_minutes(amount)?,
            'h' => Duration::try_hours(amount)?,
            'd' => Duration::try_days(amount)?,
            _ => Duration::try_weeks(amount)?,
        };
        return now.clone().checked_add_signed(offset).map(|date| date.fixed_offset());
    }

    let today = now.date_naive();
    let naive = if let Some(caps) = DAY_RE.captures(value) {
        let word = caps[1].to_ascii_lowercase();
        let date = match word.as_str() {
            "today" => today,
            "tomorrow" => today.succ_opt()?,
            _ => {
                let weekday: Weekday = word.split_whitespace().last()?.parse().ok()?;
                following(today, weekday)?
            }
        };
        let time = match caps.get(2) {
            Some(clock) => parse_clock(clock.as_str())?,
            None => end_of_day(),
        };
        date.and_time(time)
    } else {
        let time = parse_clock(value)?;
        let date = if time > now.time() { today } else { today.succ_opt()? };
        date.and_time(time)
    };

    resolve(&now.timezone(), naive)
}

/// First `weekday` strictly after `from`.
fn following(from: NaiveDate, weekday: Weekday) -> Option<NaiveDate> {
    let ahead = (7 + weekday.num_days_from_monday() - from.weekday().num_days_from_monday()) % 7;
    let ahead = if ahead == 0 { 7 } else { ahead };
    from.checked_add_days(chrono::Days::new(u64::from(ahead)))
}

/// `5pm`, `3:30pm`, `12am`, `17:30`. A bare hour needs `am` or `pm`.
fn parse_clock(value: &str) -> Option<NaiveTime> {
    let caps = CLOCK_RE.captures(value.trim())?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };

    let hour = match caps.get(3).map(|m| m.as_str().to_ascii_lowercase()) {
        Some(meridiem) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            hour % 12 + if meridiem == "pm" { 12 } else { 0 }
        }
        None if caps.get(2).is_some() => hour,
        None => return None,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN)
}

fn resolve<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(date) => Some(date.fixed_offset()),
        // Falls back on the earlier of the two instants when clocks go back.
        LocalResult::Ambiguous(earliest, _) => Some(earliest.fixed_offset()),
        LocalResult::None => None,
    }
}

pub fn format_date(date: &DateTime<FixedOffset>) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// `90` minutes becomes `1h 30m`.
pub fn format_offset(offset: &Duration) -> String {
    let days = offset.num_days();
    let hours = offset.num_hours() % 24;
    let mins = offset.num_minutes() % 60;

    let parts: Vec<String> = [(days, "d"), (hours, "h"), (mins, "m")]
        .iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{}{}", value, unit))
        .collect();

    if parts.is_empty() {
        "0m".to_string()
    } else {
        parts.join(" ")
    }
}
