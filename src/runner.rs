// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! One complete run: authorize, fetch today's activities, write the CSV.

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::services::{
    write_csv, BrowserLauncher, ExportSummary, OAuthOrchestrator, OAuthResult, StravaClient,
};

/// Application wiring for a single run.
pub struct App {
    pub config: Config,
    pub strava: StravaClient,
    pub browser: Arc<dyn BrowserLauncher>,
}

/// What a successful run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub export: ExportSummary,
    pub browser_warning: Option<String>,
}

impl App {
    pub fn new(config: Config, browser: Arc<dyn BrowserLauncher>) -> Self {
        let strava = StravaClient::new(&config);
        Self {
            config,
            strava,
            browser,
        }
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        let oauth = OAuthOrchestrator::new(&self.config, self.strava.clone(), self.browser.clone());
        let OAuthResult {
            access_token,
            browser_warning,
        } = oauth.run().await?;

        let payload = self.strava.fetch_today(access_token).await?;

        let output_path = self.config.output_path(chrono::Local::now().date_naive());
        let export = write_csv(&payload, &output_path, &self.config.export_options())?;

        Ok(RunOutcome {
            export,
            browser_warning,
        })
    }
}
