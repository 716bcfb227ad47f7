// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod browser;
pub mod callback;
pub mod csv_export;
pub mod oauth;
pub mod strava;

pub use browser::{BrowserLauncher, SystemBrowser};
pub use callback::{CallbackListener, ListenerState};
pub use csv_export::{write_csv, ConversionPolicy, ExportOptions, ExportSummary};
pub use oauth::{OAuthOrchestrator, OAuthResult};
pub use strava::StravaClient;
