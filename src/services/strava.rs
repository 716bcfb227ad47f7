// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava API client.
//!
//! Handles:
//! - Authorization URL construction
//! - Authorization code exchange
//! - Fetching today's activity list as raw JSON

use serde::Deserialize;
use serde_json::Value;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{AccessToken, AuthorizationCode};
use crate::time_utils::start_of_today;

/// Page size for the activity list; only the first page is fetched.
pub const ACTIVITIES_PER_PAGE: u32 = 50;

/// Strava API client.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    auth_url: String,
    token_url: String,
    base_url: String,
    client_id: String,
    client_secret: String,
}

impl StravaClient {
    /// Create a new Strava client with OAuth credentials and endpoints from `config`.
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            auth_url: config.auth_url.clone(),
            token_url: config.token_url.clone(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            client_id: config.strava_client_id.clone(),
            client_secret: config.strava_client_secret.clone(),
        }
    }

    /// URL of the consent page the user is sent to.
    pub fn authorization_url(&self, redirect_uri: &str, scope: &str) -> String {
        format!(
            "{}?client_id={}&response_type=code&redirect_uri={}&scope={}",
            self.auth_url,
            self.client_id,
            urlencoding::encode(redirect_uri),
            scope
        )
    }

    /// Exchange an authorization code for an access token.
    ///
    /// The code is consumed whether or not the exchange succeeds.
    pub async fn exchange_code(&self, code: AuthorizationCode) -> Result<AccessToken> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "Strava token exchange failed");
            return Err(AppError::TokenExchange {
                status: status.as_u16(),
                body,
            });
        }

        let parsed = serde_json::from_str::<TokenExchangeResponse>(&body).ok();
        let token = parsed
            .as_ref()
            .and_then(|r| r.access_token.as_deref())
            .filter(|t| !t.is_empty());

        match token {
            Some(token) => {
                tracing::info!(
                    athlete_id = parsed
                        .as_ref()
                        .and_then(|r| r.athlete.get("id"))
                        .and_then(serde_json::Value::as_u64),
                    "Authorization code exchanged for access token"
                );
                Ok(AccessToken::new(token))
            }
            None => {
                tracing::error!(body = %body, "Token response has no access_token");
                Err(AppError::TokenExchange {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }

    /// Fetch the first page of activities started since local midnight.
    ///
    /// Returns the raw response body.
    pub async fn fetch_today(&self, access_token: AccessToken) -> Result<String> {
        self.list_activities_after(access_token, start_of_today(), ACTIVITIES_PER_PAGE)
            .await
    }

    /// Fetch one page of activities started after `after` (Unix timestamp).
    pub async fn list_activities_after(
        &self,
        access_token: AccessToken,
        after: i64,
        per_page: u32,
    ) -> Result<String> {
        let url = format!("{}/athlete/activities", self.base_url);

        tracing::debug!(after, per_page, "Fetching activities");

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token.as_str())
            .query(&[("after", after.to_string()), ("per_page", per_page.to_string())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status != reqwest::StatusCode::OK {
            if status.as_u16() == 429 {
                tracing::warn!("Strava rate limit hit (429)");
            }
            tracing::error!(status = %status, body = %body, "Activity request failed");
            return Err(AppError::Fetch {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(body = %body, "Today's activities");
        Ok(body)
    }
}

/// Token exchange response from Strava OAuth.
///
/// Only `access_token` is read; the athlete summary is kept loosely typed
/// because it is only logged.
#[derive(Debug, Deserialize)]
struct TokenExchangeResponse {
    access_token: Option<String>,
    #[serde(default)]
    athlete: Value,
}
