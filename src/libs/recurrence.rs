//! Recurrence patterns and next-occurrence arithmetic.
//!
//! A recurring task is a chain of task instances sharing one [`RecurrenceRule`].
//! When an instance is completed, the next one is due at
//! [`RecurrenceRule::next_after`] the completed instance's due date.
//!
//! ## Patterns
//!
//! | Pattern   | Step                  | Interval range |
//! |-----------|-----------------------|----------------|
//! | `daily`   | `interval` days       | 1–365          |
//! | `weekly`  | `7 * interval` days   | 1–52           |
//! | `monthly` | `interval` months     | 1–12           |
//!
//! Monthly steps use calendar arithmetic: the day of month is kept and clipped
//! to the last day of shorter months, so January 31st is followed by
//! February 28th (or 29th), never by March 3rd. All arithmetic happens in the
//! anchor's own UTC offset.
//!
//! ## Usage
//!
//! ```rust
//! use chrono::DateTime;
//! use rekur::libs::recurrence::{next_occurrence, Pattern};
//!
//! let anchor = DateTime::parse_from_rfc3339("2026-01-31T09:00:00Z").unwrap();
//! let next = next_occurrence(Pattern::Monthly, 1, anchor).unwrap();
//! assert_eq!(next.to_rfc3339(), "2026-02-28T09:00:00+00:00");
//! ```

use chrono::{DateTime, Datelike, Days, FixedOffset, Months, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

static EVERY_N_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bevery\s+(\d+)\s*(day|week|month)s?\b").expect("valid every-n regex"));
static EVERY_UNIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bevery\s+(day|week|month)\b").expect("valid every-unit regex"));
static ADVERB_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(daily|weekly|monthly)\b").expect("valid adverb regex"));

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecurrenceError {
    #[error("Invalid recurrence pattern '{0}'. Must be one of: daily, weekly, monthly")]
    UnknownPattern(String),
    #[error("{pattern} interval must be {min}-{max}, got {interval}")]
    IntervalOutOfRange { pattern: Pattern, interval: u32, min: u32, max: u32 },
    #[error("A recurrence interval needs a pattern (daily, weekly or monthly)")]
    IntervalWithoutPattern,
    #[error("Next occurrence after {0} is out of the supported date range")]
    OutOfRange(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pattern {
    Daily,
    Weekly,
    Monthly,
}

impl Pattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pattern::Daily => "daily",
            Pattern::Weekly => "weekly",
            Pattern::Monthly => "monthly",
        }
    }

    /// Inclusive bounds for the interval of this pattern.
    pub fn interval_range(&self) -> (u32, u32) {
        match self {
            Pattern::Daily => (1, 365),
            Pattern::Weekly => (1, 52),
            Pattern::Monthly => (1, 12),
        }
    }

    fn from_unit(unit: &str) -> Option<Self> {
        match unit.to_lowercase().as_str() {
            "day" | "daily" => Some(Pattern::Daily),
            "week" | "weekly" => Some(Pattern::Weekly),
            "month" | "monthly" => Some(Pattern::Monthly),
            _ => None,
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pattern {
    type Err = RecurrenceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Pattern::from_unit(value.trim()).ok_or_else(|| RecurrenceError::UnknownPattern(value.to_string()))
    }
}

/// Extracts a pattern and, when the phrase states one, an interval.
///
/// Accepts `daily`/`weekly`/`monthly`, `every day|week|month` and
/// `every N days|weeks|months`, case-insensitively and anywhere in the phrase.
/// Returns `None` when nothing matches.
pub fn parse_pattern(phrase: &str) -> Option<(Pattern, Option<u32>)> {
    if let Some(caps) = EVERY_N_RE.captures(phrase) {
        let interval = caps[1].parse::<u32>().ok()?;
        return Pattern::from_unit(&caps[2]).map(|pattern| (pattern, Some(interval)));
    }
    if let Some(caps) = EVERY_UNIT_RE.captures(phrase) {
        return Pattern::from_unit(&caps[1]).map(|pattern| (pattern, None));
    }
    if let Some(caps) = ADVERB_RE.captures(phrase) {
        return Pattern::from_unit(&caps[1]).map(|pattern| (pattern, None));
    }
    None
}

pub fn validate_interval(pattern: Pattern, interval: u32) -> Result<(), RecurrenceError> {
    let (min, max) = pattern.interval_range();
    if interval < min || interval > max {
        return Err(RecurrenceError::IntervalOutOfRange { pattern, interval, min, max });
    }
    Ok(())
}

/// A validated pattern and interval pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceSpec {
    pub pattern: Pattern,
    pub interval: u32,
}

impl RecurrenceSpec {
    pub fn new(pattern: Pattern, interval: u32) -> Result<Self, RecurrenceError> {
        validate_interval(pattern, interval)?;
        Ok(Self { pattern, interval })
    }

    /// Builds a spec from loosely supplied request fields.
    ///
    /// An explicit `interval` wins over one embedded in the phrase; when neither
    /// is given the interval is 1. An interval without a pattern is rejected.
    pub fn resolve(pattern: Option<&str>, interval: Option<u32>) -> Result<Option<Self>, RecurrenceError> {
        let phrase = match pattern.map(str::trim).filter(|p| !p.is_empty()) {
            Some(phrase) => phrase,
            None if interval.is_some() => return Err(RecurrenceError::IntervalWithoutPattern),
            None => return Ok(None),
        };

        let (pattern, embedded) = parse_pattern(phrase).ok_or_else(|| RecurrenceError::UnknownPattern(phrase.to_string()))?;
        let interval = interval.or(embedded).unwrap_or(1);

        Self::new(pattern, interval).map(Some)
    }
}

impl fmt::Display for RecurrenceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.pattern, self.interval) {
            (pattern, 1) => write!(f, "{}", pattern),
            (Pattern::Daily, n) => write!(f, "every {} days", n),
            (Pattern::Weekly, n) => write!(f, "every {} weeks", n),
            (Pattern::Monthly, n) => write!(f, "every {} months", n),
        }
    }
}

/// Computes the due date that follows `anchor`.
///
/// The result is always strictly later than `anchor` and keeps its offset.
pub fn next_occurrence(pattern: Pattern, interval: u32, anchor: DateTime<FixedOffset>) -> Result<DateTime<FixedOffset>, RecurrenceError> {
    validate_interval(pattern, interval)?;

    let next = match pattern {
        Pattern::Daily => anchor.checked_add_days(Days::new(u64::from(interval))),
        Pattern::Weekly => anchor.checked_add_days(Days::new(7 * u64::from(interval))),
        Pattern::Monthly => anchor.checked_add_months(Months::new(interval)),
    };

    next.ok_or_else(|| RecurrenceError::OutOfRange(anchor.to_rfc3339()))
}

/// Pattern details captured when the rule is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekday: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u32>,
}

impl RuleMetadata {
    pub fn capture(pattern: Pattern, anchor: &DateTime<FixedOffset>) -> Self {
        match pattern {
            Pattern::Daily => Self::default(),
            Pattern::Weekly => Self {
                weekday: Some(anchor.format("%A").to_string()),
                day_of_month: None,
            },
            Pattern::Monthly => Self {
                weekday: None,
                day_of_month: Some(anchor.day()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub id: Uuid,
    pub user_id: String,
    pub pattern: Pattern,
    pub interval: u32,
    pub metadata: RuleMetadata,
    pub created_at: DateTime<Utc>,
}

impl RecurrenceRule {
    pub fn new(user_id: &str, spec: RecurrenceSpec, anchor: &DateTime<FixedOffset>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            pattern: spec.pattern,
            interval: spec.interval,
            metadata: RuleMetadata::capture(spec.pattern, anchor),
            created_at: Utc::now(),
        }
    }

    pub fn spec(&self) -> Result<RecurrenceSpec, RecurrenceError> {
        RecurrenceSpec::new(self.pattern, self.interval)
    }

    /// Next due date of this chain after `anchor`.
    ///
    /// Monthly rules re-pin the day of month captured at creation, so a chain
    /// started on the 31st returns to the 31st after passing a shorter month.
    pub fn next_after(&self, anchor: DateTime<FixedOffset>) -> Result<DateTime<FixedOffset>, RecurrenceError> {
        let next = next_occurrence(self.pattern, self.interval, anchor)?;

        match (self.pattern, self.metadata.day_of_month) {
            (Pattern::Monthly, Some(pinned)) if pinned > next.day() => {
                let day = pinned.min(days_in_month(next.year(), next.month()));
                Ok(next.with_day(day).unwrap_or(next))
            }
            _ => Ok(next),
        }
    }

    /// The next `count` due dates of this chain after `anchor`.
    ///
    /// Each step re-anchors on the previous result through [`Self::next_after`],
    /// so the preview matches the instances completion would create one by one.
    ///
    /// ```rust
    /// use chrono::DateTime;
    /// use rekur::libs::recurrence::{Pattern, RecurrenceRule, RecurrenceSpec};
    ///
    /// let due = DateTime::parse_from_rfc3339("2026-01-31T09:00:00Z").unwrap();
    /// let rule = RecurrenceRule::new("user-1", RecurrenceSpec::new(Pattern::Monthly, 1).unwrap(), &due);
    /// let dates = rule.occurrences(due, 2).unwrap();
    /// assert_eq!(dates[1].to_rfc3339(), "2026-03-31T09:00:00+00:00");
    /// ```
    pub fn occurrences(&self, anchor: DateTime<FixedOffset>, count: usize) -> Result<Vec<DateTime<FixedOffset>>, RecurrenceError> {
        let mut dates = Vec::with_capacity(count);
        let mut current = anchor;
        for _ in 0..count {
            current = self.next_after(current)?;
            dates.push(current);
        }
        Ok(dates)
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(value: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(value).unwrap()
    }

    #[test]
    fn test_daily_next_day() {
        let next = next_occurrence(Pattern::Daily, 1, at("2026-01-07T09:00:00Z")).unwrap();
        assert_eq!(next, at("2026-01-08T09:00:00Z"));

        let next = next_occurrence(Pattern::Daily, 3, at("2026-01-06T10:00:00Z")).unwrap();
        assert_eq!(next, at("2026-01-09T10:00:00Z"));
    }

    #[test]
    fn test_weekly_steps_whole_weeks() {
        let next = next_occurrence(Pattern::Weekly, 1, at("2026-01-06T10:00:00Z")).unwrap();
        assert_eq!(next, at("2026-01-13T10:00:00Z"));

        let next = next_occurrence(Pattern::Weekly, 2, at("2026-01-06T10:00:00Z")).unwrap();
        assert_eq!(next, at("2026-01-20T10:00:00Z"));
    }

    #[test]
    fn test_monthly_clips_to_month_end() {
        assert_eq!(next_occurrence(Pattern::Monthly, 1, at("2026-01-31T09:00:00Z")).unwrap(), at("2026-02-28T09:00:00Z"));
        assert_eq!(next_occurrence(Pattern::Monthly, 1, at("2024-01-31T09:00:00Z")).unwrap(), at("2024-02-29T09:00:00Z"));
        assert_eq!(next_occurrence(Pattern::Monthly, 1, at("2024-02-29T10:00:00Z")).unwrap(), at("2024-03-29T10:00:00Z"));
        assert_eq!(next_occurrence(Pattern::Monthly, 3, at("2026-01-15T10:00:00Z")).unwrap(), at("2026-04-15T10:00:00Z"));
    }

    #[test]
    fn test_monthly_crosses_year_boundary() {
        let next = next_occurrence(Pattern::Monthly, 1, at("2025-12-15T10:00:00Z")).unwrap();
        assert_eq!(next, at("2026-01-15T10:00:00Z"));
    }

    #[test]
    fn test_offset_and_time_are_preserved() {
        let next = next_occurrence(Pattern::Monthly, 1, at("2026-03-31T14:30:45+05:30")).unwrap();
        assert_eq!(next.to_rfc3339(), "2026-04-30T14:30:45+05:30");
    }

    #[test]
    fn test_next_is_always_after_anchor() {
        let anchors = ["2026-01-31T23:59:59Z", "2024-02-29T00:00:00-08:00", "2025-12-31T12:00:00+14:00", "2026-06-15T09:00:00+02:00"];
        for pattern in [Pattern::Daily, Pattern::Weekly, Pattern::Monthly] {
            let (min, max) = pattern.interval_range();
            for interval in min..=max {
                for anchor in anchors {
                    let anchor = at(anchor);
                    let next = next_occurrence(pattern, interval, anchor).unwrap();
                    assert!(next > anchor, "{pattern} x{interval} from {anchor} gave {next}");
                }
            }
        }
    }

    #[test]
    fn test_interval_bounds() {
        assert!(validate_interval(Pattern::Daily, 365).is_ok());
        assert!(validate_interval(Pattern::Weekly, 52).is_ok());
        assert!(validate_interval(Pattern::Monthly, 12).is_ok());
        assert!(matches!(validate_interval(Pattern::Daily, 0), Err(RecurrenceError::IntervalOutOfRange { .. })));
        assert!(matches!(validate_interval(Pattern::Weekly, 53), Err(RecurrenceError::IntervalOutOfRange { .. })));
        assert!(matches!(
            next_occurrence(Pattern::Monthly, 13, at("2026-01-01T00:00:00Z")),
            Err(RecurrenceError::IntervalOutOfRange { max: 12, .. })
        ));
    }

    #[test]
    fn test_parse_pattern_phrases() {
        assert_eq!(parse_pattern("daily"), Some((Pattern::Daily, None)));
        assert_eq!(parse_pattern("Weekly"), Some((Pattern::Weekly, None)));
        assert_eq!(parse_pattern("every month"), Some((Pattern::Monthly, None)));
        assert_eq!(parse_pattern("every 2 weeks"), Some((Pattern::Weekly, Some(2))));
        assert_eq!(parse_pattern("repeat EVERY 3 Days please"), Some((Pattern::Daily, Some(3))));
        assert_eq!(parse_pattern("every 1 month"), Some((Pattern::Monthly, Some(1))));
        assert_eq!(parse_pattern("yearly"), None);
        assert_eq!(parse_pattern("0 9 * * 1"), None);
        assert_eq!(parse_pattern(""), None);
    }

    #[test]
    fn test_resolve_defaults_interval_to_one() {
        let spec = RecurrenceSpec::resolve(Some("daily"), None).unwrap().unwrap();
        assert_eq!(spec, RecurrenceSpec { pattern: Pattern::Daily, interval: 1 });

        let spec = RecurrenceSpec::resolve(Some("every 2 weeks"), None).unwrap().unwrap();
        assert_eq!(spec.interval, 2);

        let spec = RecurrenceSpec::resolve(Some("every 2 weeks"), Some(4)).unwrap().unwrap();
        assert_eq!(spec.interval, 4);
    }

    #[test]
    fn test_resolve_rejections() {
        assert_eq!(RecurrenceSpec::resolve(None, None), Ok(None));
        assert_eq!(RecurrenceSpec::resolve(None, Some(2)), Err(RecurrenceError::IntervalWithoutPattern));
        assert!(matches!(RecurrenceSpec::resolve(Some("fortnightly"), None), Err(RecurrenceError::UnknownPattern(_))));
        assert!(matches!(RecurrenceSpec::resolve(Some("monthly"), Some(24)), Err(RecurrenceError::IntervalOutOfRange { .. })));
    }

    #[test]
    fn test_rule_metadata_capture() {
        let anchor = at("2026-01-05T09:00:00Z");
        assert_eq!(RuleMetadata::capture(Pattern::Weekly, &anchor).weekday.as_deref(), Some("Monday"));
        assert_eq!(RuleMetadata::capture(Pattern::Monthly, &anchor).day_of_month, Some(5));
        assert_eq!(RuleMetadata::capture(Pattern::Daily, &anchor), RuleMetadata::default());
    }

    #[test]
    fn test_monthly_rule_returns_to_pinned_day() {
        let start = at("2026-01-31T09:00:00Z");
        let rule = RecurrenceRule::new("user", RecurrenceSpec::new(Pattern::Monthly, 1).unwrap(), &start);

        let feb = rule.next_after(start).unwrap();
        assert_eq!(feb, at("2026-02-28T09:00:00Z"));
        let mar = rule.next_after(feb).unwrap();
        assert_eq!(mar, at("2026-03-31T09:00:00Z"));
        let apr = rule.next_after(mar).unwrap();
        assert_eq!(apr, at("2026-04-30T09:00:00Z"));
    }

    #[test]
    fn test_occurrences_chain() {
        let start = at("2026-01-05T09:00:00Z");
        let rule = RecurrenceRule::new("user", RecurrenceSpec::new(Pattern::Weekly, 2).unwrap(), &start);
        let dates = rule.occurrences(start, 3).unwrap();
        assert_eq!(dates, vec![at("2026-01-19T09:00:00Z"), at("2026-02-02T09:00:00Z"), at("2026-02-16T09:00:00Z")]);
    }

    #[test]
    fn test_monthly_occurrences_follow_pinned_day() {
        let start = at("2026-01-31T09:00:00Z");
        let rule = RecurrenceRule::new("user", RecurrenceSpec::new(Pattern::Monthly, 1).unwrap(), &start);

        let dates = rule.occurrences(start, 3).unwrap();
        assert_eq!(dates, vec![at("2026-02-28T09:00:00Z"), at("2026-03-31T09:00:00Z"), at("2026-04-30T09:00:00Z")]);

        let mut chained = start;
        for date in &dates {
            chained = rule.next_after(chained).unwrap();
            assert_eq!(&chained, date);
        }
    }

    #[test]
    fn test_spec_display() {
        assert_eq!(RecurrenceSpec::new(Pattern::Daily, 1).unwrap().to_string(), "daily");
        assert_eq!(RecurrenceSpec::new(Pattern::Weekly, 2).unwrap().to_string(), "every 2 weeks");
    }
}
