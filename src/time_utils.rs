// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, Local, NaiveDate, TimeZone};

use crate::error::{AppError, Result};

/// Format an ISO-8601 instant as a `YYYY-MM-DD` date in the local time zone.
pub fn format_date(iso: &str) -> Result<String> {
    format_date_in(iso, &Local)
}

/// Format an ISO-8601 instant as a `YYYY-MM-DD` date in `tz`.
pub fn format_date_in<Tz: TimeZone>(iso: &str, tz: &Tz) -> Result<String>
where
    Tz::Offset: std::fmt::Display,
{
    let instant = DateTime::parse_from_rfc3339(iso)
        .map_err(|e| AppError::conversion("start_date", iso, e))?;
    Ok(instant.with_timezone(tz).format("%Y-%m-%d").to_string())
}

/// Format a whole number of seconds as `MM:SS`, or `HH:MM:SS` from one hour up.
pub fn format_duration(seconds: &str) -> Result<String> {
    let total: u64 = seconds
        .parse()
        .map_err(|e| AppError::conversion("elapsed_time", seconds, e))?;

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        Ok(format!("{:02}:{:02}:{:02}", hours, minutes, secs))
    } else {
        Ok(format!("{:02}:{:02}", minutes, secs))
    }
}

/// Unix timestamp of local midnight today.
pub fn start_of_today() -> i64 {
    start_of_day_timestamp(Local::now().date_naive(), &Local)
}

/// Unix timestamp of midnight on `date` in `tz`.
///
/// When midnight falls into a DST gap the first valid instant after it is used.
pub fn start_of_day_timestamp<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> i64 {
    let midnight = date.and_time(chrono::NaiveTime::MIN);
    match tz.from_local_datetime(&midnight).earliest() {
        Some(dt) => dt.timestamp(),
        None => {
            // Skip forward through the gap, one hour at a time.
            (1..=24)
                .find_map(|h| {
                    tz.from_local_datetime(&(midnight + chrono::Duration::hours(h)))
                        .earliest()
                })
                .map(|dt| dt.timestamp())
                .unwrap_or_else(|| midnight.and_utc().timestamp())
        }
    }
}
