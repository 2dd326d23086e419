//! Lenient date handling for feed timestamps and episode titles.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::sync::LazyLock;

static NUMERIC_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(20\d{2})[-/.](\d{1,2})[-/.](\d{1,2})").expect("numeric date regex should compile")
});
static CJK_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(20\d{2})年(\d{1,2})月(\d{1,2})日").expect("cjk date regex should compile")
});
static MONTH_NAME_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sept?(?:ember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})\b",
    )
    .expect("month name date regex should compile")
});

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

fn ymd(y: &str, m: &str, d: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?)
}

fn month_name_date(text: &str) -> Option<NaiveDate> {
    let caps = MONTH_NAME_DATE.captures(text)?;
    let prefix: String = caps[1].to_lowercase().chars().take(3).collect();
    let month = MONTHS.iter().position(|m| *m == prefix)? as u32 + 1;
    NaiveDate::from_ymd_opt(caps[3].parse().ok()?, month, caps[2].parse().ok()?)
}

/// Find a calendar date embedded in an episode or article title.
///
/// Tries `YYYY-MM-DD` style numbers (any of `-`, `/`, `.`), then
/// `YYYY年M月D日`, then English month names with day and year.
pub fn extract_date_from_title(title: &str) -> Option<NaiveDate> {
    if let Some(date) = NUMERIC_DATE
        .captures(title)
        .and_then(|c| ymd(&c[1], &c[2], &c[3]))
    {
        return Some(date);
    }
    if let Some(date) = CJK_DATE.captures(title).and_then(|c| ymd(&c[1], &c[2], &c[3])) {
        return Some(date);
    }
    month_name_date(title)
}

/// Parse a timestamp in any of the formats feeds and state files carry.
///
/// Naive values are taken as UTC.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| month_name_date(s))?;
    Some(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}

/// [`parse_datetime`], falling back to `now`.
pub fn parse_datetime_or(raw: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    parse_datetime(raw).unwrap_or(now)
}

/// Move `dt` onto `date`, keeping its time of day.
pub fn with_date(dt: DateTime<Utc>, date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(dt.time()))
}

/// Serde helper for state files written by older versions.
pub(crate) fn deserialize_lenient<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(parse_datetime_or(&raw, Utc::now()))
}
