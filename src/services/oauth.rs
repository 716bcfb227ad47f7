// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Interactive OAuth authorization code flow.
//!
//! 1. Start the local callback listener
//! 2. Open the Strava consent page in the browser
//! 3. Wait for the redirect to deliver an authorization code
//! 4. Stop the listener and exchange the code for an access token

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::Result;
use crate::models::AccessToken;
use crate::services::browser::BrowserLauncher;
use crate::services::callback::CallbackListener;
use crate::services::strava::StravaClient;

/// Drives one authorization code handshake.
pub struct OAuthOrchestrator {
    client: StravaClient,
    browser: Arc<dyn BrowserLauncher>,
    redirect_uri: String,
    scope: String,
    bind_addr: std::net::SocketAddr,
    callback_path: String,
    timeout: Option<Duration>,
}

/// Result of a completed handshake.
#[derive(Debug)]
pub struct OAuthResult {
    pub access_token: AccessToken,
    /// Set when the browser could not be opened and the user had to
    /// navigate to the authorization URL by hand.
    pub browser_warning: Option<String>,
}

impl OAuthOrchestrator {
    pub fn new(config: &Config, client: StravaClient, browser: Arc<dyn BrowserLauncher>) -> Self {
        Self {
            client,
            browser,
            redirect_uri: config.redirect_uri.clone(),
            scope: config.scope.clone(),
            bind_addr: config.callback_bind_addr,
            callback_path: config.callback_path.clone(),
            timeout: config.auth_timeout,
        }
    }

    /// URL of the Strava consent page for this configuration.
    pub fn authorization_url(&self) -> String {
        self.client
            .authorization_url(&self.redirect_uri, &self.scope)
    }

    /// Run the full handshake and return an access token.
    pub async fn run(&self) -> Result<OAuthResult> {
        let auth_url = self.authorization_url();

        // The listener must be accepting before the user can finish consent.
        let mut listener = CallbackListener::new(self.bind_addr, self.callback_path.as_str());
        listener.start().await?;

        tracing::info!("Opening browser for Strava authorization");
        let browser_warning = match self.browser.open(&auth_url) {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    url = %auth_url,
                    "Could not open a browser, open the URL manually"
                );
                Some(format!("Failed to open browser: {}", e))
            }
        };

        let code = listener.wait_for_code(self.timeout).await;
        listener.stop().await;
        let code = code?;

        let access_token = self.client.exchange_code(code).await?;

        Ok(OAuthResult {
            access_token,
            browser_warning,
        })
    }
}
