//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honoured for local use.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::services::csv_export::{ConversionPolicy, ExportOptions};

const DEFAULT_REDIRECT_URI: &str = "http://localhost:8000/callback";
const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 300;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Strava application ---
    /// Strava OAuth client ID (public)
    pub strava_client_id: String,
    /// Strava OAuth client secret
    pub strava_client_secret: String,
    /// Redirect URI registered with Strava; must point at the callback listener
    pub redirect_uri: String,
    /// Comma-joined OAuth scopes
    pub scope: String,

    // --- Endpoints ---
    pub auth_url: String,
    pub token_url: String,
    pub api_base_url: String,

    // --- Callback listener ---
    pub callback_bind_addr: SocketAddr,
    pub callback_path: String,
    /// How long to wait for the browser redirect. `None` waits forever.
    pub auth_timeout: Option<Duration>,

    // --- Export ---
    /// Prefix of the output file; the local date and `.csv` are appended.
    pub output_prefix: String,
    pub activity_type: String,
    pub conversion_policy: ConversionPolicy,

    /// Emit JSON log lines instead of human-readable ones
    pub json_logs: bool,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            strava_client_id: "test_client_id".to_string(),
            strava_client_secret: "test_secret".to_string(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scope: "read,activity:read".to_string(),
            auth_url: "https://www.strava.com/oauth/authorize".to_string(),
            token_url: "https://www.strava.com/oauth/token".to_string(),
            api_base_url: "https://www.strava.com/api/v3".to_string(),
            callback_bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            callback_path: "/callback".to_string(),
            auth_timeout: Some(Duration::from_secs(DEFAULT_AUTH_TIMEOUT_SECS)),
            output_prefix: String::new(),
            activity_type: "run".to_string(),
            conversion_policy: ConversionPolicy::Abort,
            json_logs: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Self::default();

        let callback_bind_addr = match env::var("CALLBACK_BIND_ADDR") {
            Ok(v) => v
                .parse()
                .map_err(|_| ConfigError::Invalid("CALLBACK_BIND_ADDR", v))?,
            Err(_) => defaults.callback_bind_addr,
        };

        let auth_timeout = match env::var("AUTH_TIMEOUT_SECS") {
            Ok(v) => parse_timeout(&v).ok_or(ConfigError::Invalid("AUTH_TIMEOUT_SECS", v))?,
            Err(_) => defaults.auth_timeout,
        };

        let conversion_policy = match env::var("CONVERSION_POLICY") {
            Ok(v) => v
                .parse()
                .map_err(|_| ConfigError::Invalid("CONVERSION_POLICY", v))?,
            Err(_) => defaults.conversion_policy,
        };

        Ok(Self {
            strava_client_id: env::var("STRAVA_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("STRAVA_CLIENT_ID"))?,
            strava_client_secret: env::var("STRAVA_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("STRAVA_CLIENT_SECRET"))?,
            redirect_uri: env::var("STRAVA_REDIRECT_URI").unwrap_or(defaults.redirect_uri),
            scope: env::var("STRAVA_SCOPE").unwrap_or(defaults.scope),
            auth_url: env::var("STRAVA_AUTH_URL").unwrap_or(defaults.auth_url),
            token_url: env::var("STRAVA_TOKEN_URL").unwrap_or(defaults.token_url),
            api_base_url: env::var("STRAVA_API_URL").unwrap_or(defaults.api_base_url),
            callback_bind_addr,
            callback_path: env::var("CALLBACK_PATH").unwrap_or(defaults.callback_path),
            auth_timeout,
            output_prefix: env::var("OUTPUT_PREFIX").unwrap_or(defaults.output_prefix),
            activity_type: env::var("ACTIVITY_TYPE").unwrap_or(defaults.activity_type),
            conversion_policy,
            json_logs: env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")),
        })
    }

    /// Output path for a run on `date`: `<prefix><YYYY-MM-DD>.csv`.
    pub fn output_path(&self, date: chrono::NaiveDate) -> PathBuf {
        PathBuf::from(format!("{}{}.csv", self.output_prefix, date.format("%Y-%m-%d")))
    }

    /// Export settings for the CSV pipeline.
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            activity_type: self.activity_type.clone(),
            conversion_policy: self.conversion_policy,
        }
    }
}

/// `0` disables the timeout; anything else is a number of seconds.
fn parse_timeout(value: &str) -> Option<Option<Duration>> {
    let secs: u64 = value.trim().parse().ok()?;
    Some((secs > 0).then(|| Duration::from_secs(secs)))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
