// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types.

use std::net::SocketAddr;
use std::time::Duration;

/// Errors that can end a run.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to bind callback listener on {addr}: {source}")]
    ListenerBind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Callback listener stopped before an authorization code arrived")]
    ListenerClosed,

    #[error("No authorization code received within {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Token exchange failed (HTTP {status}): {body}")]
    TokenExchange { status: u16, body: String },

    #[error("Activity fetch failed (HTTP {status}): {body}")]
    Fetch { status: u16, body: String },

    #[error("Strava request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed activity payload: {0}")]
    Payload(String),

    #[error("Cannot convert {field} value {value:?}: {reason}")]
    Conversion {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl AppError {
    /// Build a conversion error for one field value.
    pub fn conversion(
        field: &'static str,
        value: impl Into<String>,
        reason: impl std::fmt::Display,
    ) -> Self {
        AppError::Conversion {
            field,
            value: value.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error was caused by a single malformed activity row.
    pub fn is_conversion_error(&self) -> bool {
        matches!(self, AppError::Conversion { .. })
    }

    /// HTTP status reported by Strava, if the error came from a response.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            AppError::TokenExchange { status, .. } | AppError::Fetch { status, .. } => {
                Some(*status)
            }
            AppError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AppError>;
