// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Strava activity records, before and after CSV normalisation.

use serde_json::{Map, Value};

/// The fields of one Strava activity that end up in the CSV.
///
/// Every field is kept as the raw text Strava sent; absent fields are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawActivity {
    /// Start date/time (ISO 8601, UTC)
    pub start_date: String,
    /// Elapsed time in seconds
    pub elapsed_time: String,
    /// Elevation gain in meters (passed through unconverted)
    pub total_elevation_gain: String,
    /// Activity type (Ride, Run, Hike, etc.)
    pub activity_type: String,
    /// Activity name/title
    pub name: String,
    /// Distance in meters
    pub distance: String,
}

impl RawActivity {
    /// Extract the CSV fields from one element of the activity list.
    ///
    /// Non-object elements yield an activity with every field empty.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        Self {
            start_date: extract_field(obj, "start_date"),
            elapsed_time: extract_field(obj, "elapsed_time"),
            total_elevation_gain: extract_field(obj, "total_elevation_gain"),
            activity_type: extract_field(obj, "type"),
            name: extract_field(obj, "name"),
            distance: extract_field(obj, "distance"),
        }
    }

    /// Whether this activity's type matches `wanted`, ignoring case.
    pub fn is_type(&self, wanted: &str) -> bool {
        self.activity_type.eq_ignore_ascii_case(wanted)
    }
}

/// Render a top-level scalar field as text.
///
/// Strings are returned unquoted, numbers and booleans as their JSON text.
/// Missing fields, `null` and nested values give an empty string.
pub fn extract_field(obj: &Map<String, Value>, key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// One normalised CSV output row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    /// Local calendar date (`YYYY-MM-DD`)
    pub activity_date: String,
    pub elevation_gain: String,
    /// `MM:SS` or `HH:MM:SS`
    pub activity_time: String,
    pub activity_type: String,
    /// Activity name, unescaped
    pub comment: String,
    /// Miles with two decimals
    pub distance_miles: String,
}
