//! UTC calendar-month normalization
//!
//! Every series operation compares months by string or `DateTime` equality,
//! so all dates are collapsed to UTC midnight on the first day of their
//! month before they are compared.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Formats accepted for naive date-times. Naive inputs are read as UTC.
const NAIVE_DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Parse a date-ish string and return UTC midnight on the first of its month.
///
/// Time of day is discarded. Inputs carrying an offset are converted to UTC
/// before the month is taken, so the result never depends on the local
/// timezone of the host.
///
/// # Examples
///
/// ```
/// use month_forecast::dates::{month_iso, to_utc_month};
///
/// let month = to_utc_month("2025-03-17T22:15:00Z").unwrap();
/// assert_eq!(month_iso(month), "2025-03-01");
/// ```
pub fn to_utc_month(s: &str) -> Result<DateTime<Utc>> {
    let date = parse_calendar_date(s.trim())?;
    month_start(date.year(), date.month())
}

/// UTC midnight, day 1, of the UTC month of `d`.
pub fn first_of_month_utc(d: DateTime<Utc>) -> DateTime<Utc> {
    let date = d.date_naive();
    let first = date.with_day(1).unwrap_or(date);
    first.and_time(NaiveTime::default()).and_utc()
}

/// First-of-month `delta` calendar months away from the month of `d`.
///
/// `delta` may be negative; year boundaries roll over in both directions.
pub fn add_months_utc(d: DateTime<Utc>, delta: i32) -> Result<DateTime<Utc>> {
    let total = d.year() * 12 + d.month0() as i32 + delta;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;
    month_start(year, month)
}

/// Reduce a `YYYY-MM[-DD...]` string to the `YYYY-MM-01` label of its month.
///
/// Only the year and month components are read, the day is ignored. This
/// keeps end-of-month labels such as `2025-02-29` or `2025-01-31` in their
/// own month instead of letting a calendar parser reject or roll them.
pub fn normalize_to_month_iso(s: &str) -> Result<String> {
    let (year, month) = split_year_month(s)?;
    Ok(month_iso(month_start(year, month)?))
}

/// Format a date as its `YYYY-MM-DD` calendar-day prefix.
pub fn month_iso(d: DateTime<Utc>) -> String {
    d.format("%Y-%m-%d").to_string()
}

fn month_start(year: i32, month: u32) -> Result<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| ForecastError::DateError(format!("invalid month {year}-{month:02}")))
}

fn split_year_month(s: &str) -> Result<(i32, u32)> {
    let mut parts = s.trim().split('-');
    let year = parts
        .next()
        .and_then(|p| p.trim().parse::<i32>().ok())
        .ok_or_else(|| ForecastError::DateError(format!("missing year in '{s}'")))?;
    let month = parts
        .next()
        .and_then(|p| p.trim().parse::<u32>().ok())
        .ok_or_else(|| ForecastError::DateError(format!("missing month in '{s}'")))?;
    Ok((year, month))
}

fn parse_calendar_date(s: &str) -> Result<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc).date_naive());
    }

    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    // YYYY-MM, or a YYYY-MM-DD whose day overflows the month (2025-02-30)
    if let Some(date) = overflowing_day(s) {
        return Ok(date);
    }

    Err(ForecastError::DateError(format!("unrecognized date '{s}'")))
}

fn overflowing_day(s: &str) -> Option<NaiveDate> {
    let mut parts = s.splitn(3, '-');
    let year = parts.next()?;
    let month = parts.next()?;
    if year.len() != 4 || month.len() != 2 {
        return None;
    }
    if let Some(day) = parts.next() {
        let day: u32 = day.get(..2)?.parse().ok()?;
        if !(1..=31).contains(&day) {
            return None;
        }
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
}
