//! Parsing of LeekDuck date text into timezone-resolved instants.
//!
//! The site writes dates in a handful of textual shapes:
//!   "Monday, October 13, 2025, at 6:00 PM Local Time"
//!   "Mon, Oct 13, at 7:00 PM Local Time"
//!   "Starts: ... Ends: ..."
//!   "Sunday, October 12" together with "10:00 AM to 1:00 PM"
//! All results land in the configured timezone. Dates without a year get
//! the current year, rolled forward when that would put them in the past;
//! `now` is a parameter so the parser is a pure function and tests are
//! deterministic.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;

/// Shared datetime pattern: optional weekday, month name, day, optional
/// year, "at", 12-hour time. Groups: month, day, year?, hour, minute, am/pm.
const DT_PAT: &str = r"(?:[A-Za-z]+,\s+)?([A-Za-z]{3,9})\.?\s+(\d{1,2})(?:,\s*(\d{4}))?,?\s+at\s+(\d{1,2}):(\d{2})\s*([APap][Mm])";

static DATETIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\b{DT_PAT}")).unwrap());

static STARTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i:\bStarts?:)\s*{DT_PAT}")).unwrap());

static ENDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i:\bEnds?:)\s*{DT_PAT}")).unwrap());

static TIME_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(\d{1,2}):(\d{2})\s*([APap][Mm])\s*(?:to|until|[-–—])\s*(\d{1,2}):(\d{2})\s*([APap][Mm])",
    )
    .unwrap()
});

static DATE_ONLY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:[A-Za-z]+day,\s+)?([A-Za-z]{3,9})\.?\s+(\d{1,2})(?:,\s*(\d{4}))?\b").unwrap()
});

/// Start and optional end, both in the target timezone.
#[derive(Debug, Clone, PartialEq)]
pub struct EventTimes {
    pub start: DateTime<Tz>,
    pub end: Option<DateTime<Tz>>,
}

/// Parse the date text of one event block.
///
/// Returns `None` when no start time can be recovered; the caller skips
/// the block. An end that would precede the start is discarded so the
/// `start <= end` invariant always holds.
pub fn parse_event_times(text: &str, tz: Tz, now: DateTime<Utc>) -> Option<EventTimes> {
    let text = text.replace("Local Time", "");

    // Labeled "Starts:" / "Ends:" take precedence when present.
    if let Some(caps) = STARTS_RE.captures(&text) {
        let start = datetime_from_caps(&caps, tz, now)?;
        let end = ENDS_RE
            .captures(&text)
            .and_then(|c| datetime_from_caps(&c, tz, now))
            .filter(|end| *end >= start);
        return Some(EventTimes { start, end });
    }

    // Otherwise every full datetime in the block: first is the start, the
    // last is the end when there is more than one.
    let stamps: Vec<DateTime<Tz>> = DATETIME_RE
        .captures_iter(&text)
        .filter_map(|caps| datetime_from_caps(&caps, tz, now))
        .collect();

    if let Some(&start) = stamps.first() {
        let end = stamps
            .last()
            .filter(|_| stamps.len() >= 2)
            .copied()
            .filter(|end| *end >= start);
        return Some(EventTimes { start, end });
    }

    // Same-day shape: a bare date somewhere plus a time-of-day range.
    let caps = TIME_RANGE_RE.captures(&text)?;
    let date = find_bare_date(&text, tz, now)?;

    let start_naive = date.and_hms_opt(
        hour24(caps[1].parse().ok()?, &caps[3])?,
        caps[2].parse().ok()?,
        0,
    )?;
    let mut end_naive = date.and_hms_opt(
        hour24(caps[4].parse().ok()?, &caps[6])?,
        caps[5].parse().ok()?,
        0,
    )?;

    // "10:00 PM to 1:00 AM" crosses midnight.
    if end_naive <= start_naive {
        end_naive += Duration::days(1);
    }

    let start = resolve_local(tz, start_naive)?;
    let end = resolve_local(tz, end_naive).filter(|end| *end >= start);

    Some(EventTimes { start, end })
}

fn datetime_from_caps(
    caps: &regex::Captures<'_>,
    tz: Tz,
    now: DateTime<Utc>,
) -> Option<DateTime<Tz>> {
    let month = month_number(&caps[1])?;
    let day: u32 = caps[2].parse().ok()?;
    let year: Option<i32> = caps.get(3).and_then(|m| m.as_str().parse().ok());
    let hour = hour24(caps[4].parse().ok()?, &caps[6])?;
    let minute: u32 = caps[5].parse().ok()?;

    let build = |y: i32| -> Option<DateTime<Tz>> {
        let naive = NaiveDate::from_ymd_opt(y, month, day)?.and_hms_opt(hour, minute, 0)?;
        resolve_local(tz, naive)
    };

    match year {
        Some(y) => build(y),
        None => {
            // No year stated: current year, or next year when that already
            // lies in the past (events are announced ahead of time).
            let current = now.with_timezone(&tz).year();
            match build(current) {
                Some(dt) if dt >= now.with_timezone(&tz) => Some(dt),
                _ => build(current + 1),
            }
        }
    }
}

/// First bare month-name date in the text, year-inferred like datetimes.
fn find_bare_date(text: &str, tz: Tz, now: DateTime<Utc>) -> Option<NaiveDate> {
    for caps in DATE_ONLY_RE.captures_iter(text) {
        let Some(month) = month_number(&caps[1]) else {
            continue;
        };
        let Ok(day) = caps[2].parse::<u32>() else {
            continue;
        };

        if let Some(year) = caps.get(3).and_then(|m| m.as_str().parse::<i32>().ok()) {
            return NaiveDate::from_ymd_opt(year, month, day);
        }

        let today = now.with_timezone(&tz).date_naive();
        let candidate = NaiveDate::from_ymd_opt(today.year(), month, day)
            .filter(|d| *d >= today)
            .or_else(|| NaiveDate::from_ymd_opt(today.year() + 1, month, day));
        if candidate.is_some() {
            return candidate;
        }
    }

    None
}

/// Resolve a naive local time in `tz`. Ambiguous times (DST fold) take the
/// earlier offset; nonexistent times (spring-forward gap) shift forward an
/// hour.
fn resolve_local(tz: Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earlier, _) => Some(earlier),
        LocalResult::None => tz.from_local_datetime(&(naive + Duration::hours(1))).earliest(),
    }
}

fn hour24(hour12: u32, ampm: &str) -> Option<u32> {
    if hour12 == 0 || hour12 > 12 {
        return None;
    }
    let pm = ampm.eq_ignore_ascii_case("pm");
    Some(match (hour12, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, false) => h,
        (h, true) => h + 12,
    })
}

fn month_number(name: &str) -> Option<u32> {
    let prefix = name.get(..3)?.to_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}
