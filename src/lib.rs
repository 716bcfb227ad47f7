// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! strava-run-log: export today's Strava runs to CSV
//!
//! This crate authorizes against Strava with the OAuth authorization code
//! flow, fetches the activities recorded since local midnight and writes
//! the ones of the chosen type to a date-stamped CSV file.

pub mod config;
pub mod error;
pub mod models;
pub mod runner;
pub mod services;
pub mod time_utils;

pub use runner::{App, RunOutcome};
