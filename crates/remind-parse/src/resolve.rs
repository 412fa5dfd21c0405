//! Natural-language date resolution.
//!
//! Resolves a free-text time phrase to an absolute future instant, or
//! rejects it. The grammar is fixed and small: relative offsets, weekday
//! names, month-day dates, and `tomorrow`, each with an optional time of
//! day. Anything the grammar does not recognize is a rejection, as is any
//! phrase that resolves to the present or the past.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, Utc, Weekday};
use regex::Regex;
use std::sync::LazyLock;

// =============================================================================
// Compiled phrase patterns (compiled once, reused across calls)
// =============================================================================

struct PhrasePatterns {
    filler: Regex,
    relative_in: Regex,
    relative_from: Regex,
    tomorrow: Regex,
    weekday: Regex,
    time_on_weekday: Regex,
    month_day: Regex,
    day_of_month: Regex,
}

static PHRASE_PATTERNS: LazyLock<PhrasePatterns> = LazyLock::new(|| PhrasePatterns {
    // Leading "at"/"on" are filler in this grammar ("on saturday", "at 6pm").
    filler: Regex::new(r"^(?i)(?:at|on)[ \t]+").unwrap(),
    relative_in: Regex::new(
        r"^(?i)in[ \t]+(\d{1,6}|an?)[ \t]+(second|minute|hour|day|week|month|year)s?$",
    )
    .unwrap(),
    relative_from: Regex::new(
        r"^(?i)(\d{1,6}|an?)[ \t]+(second|minute|hour|day|week|month|year)s?[ \t]+from[ \t]+(?:now|today)$",
    )
    .unwrap(),
    tomorrow: Regex::new(r"^(?i)tomorrow(?:[ \t]+at[ \t]+(.+))?$").unwrap(),
    weekday: Regex::new(
        r"^(?i)(monday|tuesday|wednesday|thursday|friday|saturday|sunday)(?:[ \t]+at[ \t]+(.+))?$",
    )
    .unwrap(),
    time_on_weekday: Regex::new(
        r"^(?i)(.+?)[ \t]+on[ \t]+(monday|tuesday|wednesday|thursday|friday|saturday|sunday)$",
    )
    .unwrap(),
    month_day: Regex::new(
        r"^(?i)(january|february|march|april|may|june|july|august|september|october|november|december)[ \t]+(\d{1,2})(?:st|nd|rd|th)?(?:,?[ \t]+(\d{4}))?(?:[ \t]+at[ \t]+(.+))?$",
    )
    .unwrap(),
    day_of_month: Regex::new(r"^(?i)the[ \t]+(\d{1,2})(?:st|nd|rd|th)?$").unwrap(),
});

static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i)(\d{1,2})(?::(\d{2}))?[ \t]*(am|pm)?$").unwrap());

// =============================================================================
// DateResolver
// =============================================================================

/// Rule-based resolver from time phrases to future instants.
///
/// All arithmetic is in UTC. The current time is passed in explicitly so
/// tests can pin it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateResolver;

impl DateResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a phrase to an instant strictly after `now`.
    ///
    /// Returns `None` both when the grammar does not recognize the phrase
    /// and when the recognized phrase lands at or before `now` (a bare
    /// weekday naming today resolves to today 00:00 and is rejected here,
    /// never silently shifted a week out).
    pub fn resolve(&self, phrase: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let p = &*PHRASE_PATTERNS;
        let trimmed = phrase.trim();
        let stripped = p.filler.replace(trimmed, "");
        let candidate = self.parse(stripped.trim(), now)?;
        (candidate > now).then_some(candidate)
    }

    fn parse(&self, text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let p = &*PHRASE_PATTERNS;
        let today = now.date_naive();

        // "in 2 hours", "in a week"
        if let Some(caps) = p.relative_in.captures(text) {
            let n = parse_count(&caps[1])?;
            return apply_offset(now, n, &caps[2].to_lowercase());
        }

        // "3 weeks from now", "a year from today"
        if let Some(caps) = p.relative_from.captures(text) {
            let n = parse_count(&caps[1])?;
            return apply_offset(now, n, &caps[2].to_lowercase());
        }

        // "tomorrow", "tomorrow at 9am"
        if let Some(caps) = p.tomorrow.captures(text) {
            let time = optional_time(caps.get(1).map(|m| m.as_str()))?;
            let date = today + Duration::days(1);
            return Some(date.and_time(time).and_utc());
        }

        // "6:00pm on wednesday" (the leading "at" was already stripped)
        if let Some(caps) = p.time_on_weekday.captures(text) {
            if let Some(time) = parse_time_of_day(&caps[1]) {
                let date = next_weekday(today, weekday_from_name(&caps[2])?);
                return Some(date.and_time(time).and_utc());
            }
        }

        // "saturday", "saturday at 6pm"
        if let Some(caps) = p.weekday.captures(text) {
            let time = optional_time(caps.get(2).map(|m| m.as_str()))?;
            let date = next_weekday(today, weekday_from_name(&caps[1])?);
            return Some(date.and_time(time).and_utc());
        }

        // "July 4th", "july 4 2017", "december 24th at 8pm"
        if let Some(caps) = p.month_day.captures(text) {
            let month = month_from_name(&caps[1])?;
            let day: u32 = caps[2].parse().ok()?;
            let time = optional_time(caps.get(4).map(|m| m.as_str()))?;

            if let Some(year_match) = caps.get(3) {
                let year: i32 = year_match.as_str().parse().ok()?;
                let date = NaiveDate::from_ymd_opt(year, month, day)?;
                return Some(date.and_time(time).and_utc());
            }

            // No year: future-biased, roll to next year if already past.
            let this_year = NaiveDate::from_ymd_opt(today.year(), month, day)
                .map(|d| d.and_time(time).and_utc());
            if let Some(candidate) = this_year {
                if candidate > now {
                    return Some(candidate);
                }
            }
            let date = NaiveDate::from_ymd_opt(today.year() + 1, month, day)?;
            return Some(date.and_time(time).and_utc());
        }

        // "the 5th": next calendar occurrence of that day of month.
        if let Some(caps) = p.day_of_month.captures(text) {
            let day: u32 = caps[1].parse().ok()?;
            let (mut year, mut month) = (today.year(), today.month());
            for _ in 0..=12 {
                if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                    let candidate = date.and_time(NaiveTime::MIN).and_utc();
                    if candidate > now {
                        return Some(candidate);
                    }
                }
                month += 1;
                if month > 12 {
                    month = 1;
                    year += 1;
                }
            }
            return None;
        }

        None
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_count(text: &str) -> Option<u32> {
    match text.to_lowercase().as_str() {
        "a" | "an" => Some(1),
        n => n.parse().ok(),
    }
}

fn apply_offset(now: DateTime<Utc>, n: u32, unit: &str) -> Option<DateTime<Utc>> {
    let n64 = i64::from(n);
    match unit {
        "second" => now.checked_add_signed(Duration::try_seconds(n64)?),
        "minute" => now.checked_add_signed(Duration::try_minutes(n64)?),
        "hour" => now.checked_add_signed(Duration::try_hours(n64)?),
        "day" => now.checked_add_signed(Duration::try_days(n64)?),
        "week" => now.checked_add_signed(Duration::try_weeks(n64)?),
        "month" => now.checked_add_months(Months::new(n)),
        "year" => now.checked_add_months(Months::new(n.checked_mul(12)?)),
        _ => None,
    }
}

/// Next calendar occurrence of `target`, where today counts as zero days
/// ahead. The caller's future-only check handles the same-day case.
fn next_weekday(today: NaiveDate, target: Weekday) -> NaiveDate {
    let days_ahead = (i64::from(target.num_days_from_monday())
        - i64::from(today.weekday().num_days_from_monday())
        + 7)
        % 7;
    today + Duration::days(days_ahead)
}

fn weekday_from_name(name: &str) -> Option<Weekday> {
    match name.to_lowercase().as_str() {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

fn month_from_name(name: &str) -> Option<u32> {
    match name.to_lowercase().as_str() {
        "january" => Some(1),
        "february" => Some(2),
        "march" => Some(3),
        "april" => Some(4),
        "may" => Some(5),
        "june" => Some(6),
        "july" => Some(7),
        "august" => Some(8),
        "september" => Some(9),
        "october" => Some(10),
        "november" => Some(11),
        "december" => Some(12),
        _ => None,
    }
}

/// Parse an optional `at <time>` suffix; absent means midnight. A present
/// but malformed time fails the whole phrase.
fn optional_time(text: Option<&str>) -> Option<NaiveTime> {
    match text {
        Some(t) => parse_time_of_day(t),
        None => Some(NaiveTime::MIN),
    }
}

fn parse_time_of_day(text: &str) -> Option<NaiveTime> {
    let caps = TIME_RE.captures(text.trim())?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    match caps.get(3).map(|m| m.as_str().to_lowercase()) {
        Some(meridiem) => {
            if hour == 0 || hour > 12 {
                return None;
            }
            let h24 = match (meridiem.as_str(), hour) {
                ("am", 12) => 0,
                ("am", h) => h,
                ("pm", 12) => 12,
                ("pm", h) => h + 12,
                _ => return None,
            };
            NaiveTime::from_hms_opt(h24, minute, 0)
        }
        None => NaiveTime::from_hms_opt(hour, minute, 0),
    }
}
