// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! strava-run-log
//!
//! Authorizes with Strava in the browser, then writes today's runs to
//! `<OUTPUT_PREFIX><YYYY-MM-DD>.csv`.

use std::process::ExitCode;
use std::sync::Arc;

use strava_run_log::{config::Config, services::SystemBrowser, App};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_logging(false);
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    init_logging(config.json_logs);

    tracing::info!(
        output_prefix = %config.output_prefix,
        activity_type = %config.activity_type,
        "Starting Strava export"
    );

    let app = App::new(config, Arc::new(SystemBrowser));
    match app.run().await {
        Ok(outcome) => {
            if let Some(warning) = &outcome.browser_warning {
                tracing::warn!(warning = %warning, "Browser launch failed during authorization");
            }
            match &outcome.export.path {
                Some(path) => println!(
                    "Wrote {} row(s) to {}",
                    outcome.export.rows_written,
                    path.display()
                ),
                None => println!("No activities recorded today"),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Export failed");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging: JSON lines when requested, compact text otherwise.
fn init_logging(json: bool) {
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(false)
            .with_current_span(true)
            .flatten_event(true)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().compact().with_target(false));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("strava_run_log=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(json_layer)
        .with(text_layer)
        .init();
}
