// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity list to CSV conversion.
//!
//! Handles:
//! - Field extraction from the raw Strava activity list
//! - Filtering by activity type (case-insensitive)
//! - Unit conversion (meters to miles, seconds to H:MM:SS, instant to local date)
//! - CSV escaping of the free-text name column
//!
//! All rows are converted before the output file is opened, so a malformed
//! activity can never leave a half-written file behind.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{CsvRow, RawActivity};
use crate::time_utils::{format_date, format_duration};

/// Fixed header row of every CSV document.
pub const CSV_HEADER: [&str; 6] = [
    "Activity Date",
    "Elevation Gain",
    "Activity Time",
    "Activity Type",
    "Comment",
    "Distance (Miles)",
];

const METERS_PER_MILE: f64 = 1609.34;

/// What to do with a qualifying activity whose fields cannot be converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversionPolicy {
    /// Fail the whole export; nothing is written.
    #[default]
    Abort,
    /// Log the row, leave it out and keep going.
    SkipRow,
}

impl FromStr for ConversionPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(ConversionPolicy::Abort),
            "skip" | "skip-row" | "skip_row" => Ok(ConversionPolicy::SkipRow),
            other => Err(format!("unknown conversion policy: {}", other)),
        }
    }
}

/// Export settings.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Only activities of this type are exported (compared ignoring case).
    pub activity_type: String,
    pub conversion_policy: ConversionPolicy,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            activity_type: "run".to_string(),
            conversion_policy: ConversionPolicy::Abort,
        }
    }
}

/// Rows produced from one activity payload.
#[derive(Debug, Default)]
pub struct RowSet {
    pub rows: Vec<CsvRow>,
    /// Number of elements in the payload array
    pub activities_seen: usize,
    /// Qualifying activities dropped under [`ConversionPolicy::SkipRow`]
    pub skipped: usize,
}

/// Result of a CSV export.
#[derive(Debug)]
pub struct ExportSummary {
    /// File written, or `None` when the payload held no activities.
    pub path: Option<PathBuf>,
    pub rows_written: usize,
    pub rows_skipped: usize,
    pub activities_seen: usize,
}

/// Convert the raw activity list into CSV rows without touching the disk.
pub fn build_rows(payload: &str, options: &ExportOptions) -> Result<RowSet> {
    let value: Value = serde_json::from_str(payload.trim())
        .map_err(|e| AppError::Payload(format!("invalid JSON: {}", e)))?;

    let Value::Array(items) = value else {
        return Err(AppError::Payload(
            "expected a JSON array of activities".to_string(),
        ));
    };

    let mut set = RowSet {
        activities_seen: items.len(),
        ..Default::default()
    };

    for (index, item) in items.iter().enumerate() {
        let activity = RawActivity::from_value(item);
        if !activity.is_type(&options.activity_type) {
            tracing::debug!(
                index,
                activity_type = %activity.activity_type,
                "Skipping activity of another type"
            );
            continue;
        }

        match to_csv_row(activity) {
            Ok(row) => set.rows.push(row),
            Err(e) if options.conversion_policy == ConversionPolicy::SkipRow => {
                tracing::warn!(index, error = %e, "Skipping activity with malformed fields");
                set.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(set)
}

/// Convert the activity payload and write it to `output_path`.
///
/// An empty activity list is not an error: nothing is written, not even the
/// header, and the summary has no path.
pub fn write_csv(
    payload: &str,
    output_path: &Path,
    options: &ExportOptions,
) -> Result<ExportSummary> {
    let set = build_rows(payload, options)?;

    if set.activities_seen == 0 {
        tracing::info!("No activities recorded today, no CSV written");
        return Ok(ExportSummary {
            path: None,
            rows_written: 0,
            rows_skipped: 0,
            activities_seen: 0,
        });
    }

    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(output_path)?;

    if let Err(e) = write_rows(&mut writer, &set.rows) {
        // Never leave a truncated file that looks complete.
        drop(writer);
        if let Err(rm) = std::fs::remove_file(output_path) {
            tracing::warn!(
                path = %output_path.display(),
                error = %rm,
                "Could not remove partial CSV"
            );
        }
        return Err(e);
    }

    tracing::info!(
        path = %output_path.display(),
        rows = set.rows.len(),
        skipped = set.skipped,
        activities = set.activities_seen,
        "CSV written"
    );

    Ok(ExportSummary {
        path: Some(output_path.to_path_buf()),
        rows_written: set.rows.len(),
        rows_skipped: set.skipped,
        activities_seen: set.activities_seen,
    })
}

/// Write header and rows. The comment column is pre-escaped, so the writer
/// itself never quotes.
fn write_rows<W: std::io::Write>(writer: &mut csv::Writer<W>, rows: &[CsvRow]) -> Result<()> {
    writer.write_record(CSV_HEADER)?;

    for row in rows {
        let comment = escape_csv(&row.comment);
        writer.write_record([
            row.activity_date.as_str(),
            row.elevation_gain.as_str(),
            row.activity_time.as_str(),
            row.activity_type.as_str(),
            comment.as_str(),
            row.distance_miles.as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Normalise one qualifying activity.
fn to_csv_row(activity: RawActivity) -> Result<CsvRow> {
    Ok(CsvRow {
        activity_date: format_date(&activity.start_date)?,
        activity_time: format_duration(&activity.elapsed_time)?,
        distance_miles: meters_to_miles(&activity.distance)?,
        elevation_gain: activity.total_elevation_gain,
        activity_type: activity.activity_type,
        comment: activity.name,
    })
}

/// Convert a distance in meters to miles with two decimals.
pub fn meters_to_miles(meters: &str) -> Result<String> {
    let value: f64 = meters
        .trim()
        .parse()
        .map_err(|e| AppError::conversion("distance", meters, e))?;

    if !value.is_finite() {
        return Err(AppError::conversion("distance", meters, "not a finite number"));
    }

    Ok(format!("{:.2}", value / METERS_PER_MILE))
}

/// Quote a field if it contains a comma or a double quote, doubling any
/// embedded quotes.
pub fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
