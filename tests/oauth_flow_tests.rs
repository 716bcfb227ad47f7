// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end tests of the authorization handshake and a full run.
//!
//! A mock server stands in for Strava and a fake browser follows the
//! consent redirect back to the local callback listener.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{free_port, redirect_uri_of, test_config, BrokenBrowser, ConsentingBrowser, IdleBrowser};
use strava_run_log::error::AppError;
use strava_run_log::services::{OAuthOrchestrator, StravaClient};
use strava_run_log::App;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_token_endpoint(server: &MockServer, code: &str) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains(format!("code={}", code)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token_type": "Bearer",
            "access_token": "access-for-today",
            "refresh_token": "unused",
            "expires_at": 1714550400
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_handshake_returns_access_token() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "Cq7Tn3").await;

    let config = test_config(&server.uri(), free_port(), String::new());
    let browser = Arc::new(ConsentingBrowser::new("Cq7Tn3"));
    let orchestrator =
        OAuthOrchestrator::new(&config, StravaClient::new(&config), browser.clone());

    let result = orchestrator.run().await.unwrap();

    assert_eq!(result.access_token.as_str(), "access-for-today");
    assert!(result.browser_warning.is_none());

    let opened = browser.opened_urls();
    assert_eq!(opened.len(), 1);
    assert!(opened[0].starts_with(&format!("{}/oauth/authorize?client_id=test_client_id&response_type=code&redirect_uri=http%3A%2F%2F127.0.0.1", server.uri())));
    assert!(opened[0].ends_with("&scope=read,activity:read"));
    assert_eq!(redirect_uri_of(&opened[0]), Some(config.redirect_uri.clone()));

    // The listener is gone once the handshake finishes.
    tokio::net::TcpListener::bind(config.callback_bind_addr)
        .await
        .expect("callback port should be released");
}

#[tokio::test]
async fn test_browser_failure_is_only_a_warning() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "manual42").await;

    let config = test_config(&server.uri(), free_port(), String::new());
    let orchestrator =
        OAuthOrchestrator::new(&config, StravaClient::new(&config), Arc::new(BrokenBrowser));

    // The user pastes the URL by hand and consents.
    let callback = format!("{}?code=manual42", config.redirect_uri);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        let _ = reqwest::get(callback).await;
    });

    let result = orchestrator.run().await.unwrap();
    assert_eq!(result.access_token.as_str(), "access-for-today");
    let warning = result.browser_warning.expect("warning should be reported");
    assert!(warning.contains("xdg-open not found"));
}

#[tokio::test]
async fn test_bind_failure_happens_before_browser_launch() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = taken.local_addr().unwrap().port();

    let config = test_config("http://127.0.0.1:9", port, String::new());
    let browser = Arc::new(IdleBrowser::default());
    let orchestrator = OAuthOrchestrator::new(&config, StravaClient::new(&config), browser.clone());

    let err = orchestrator.run().await.unwrap_err();

    assert!(matches!(err, AppError::ListenerBind { .. }));
    assert!(browser.opened.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_no_redirect_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri(), free_port(), String::new());
    config.auth_timeout = Some(Duration::from_millis(300));
    let browser = Arc::new(IdleBrowser::default());
    let orchestrator = OAuthOrchestrator::new(&config, StravaClient::new(&config), browser.clone());

    let err = orchestrator.run().await.unwrap_err();

    assert!(matches!(err, AppError::Timeout(d) if d == Duration::from_millis(300)));
    assert_eq!(browser.opened.lock().unwrap().len(), 1);
    tokio::net::TcpListener::bind(config.callback_bind_addr)
        .await
        .expect("callback port should be released after timeout");
}

#[tokio::test]
async fn test_failed_token_exchange_ends_run() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"message":"Bad client"}"#))
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), free_port(), String::new());
    let orchestrator = OAuthOrchestrator::new(
        &config,
        StravaClient::new(&config),
        Arc::new(ConsentingBrowser::new("whatever")),
    );

    let err = orchestrator.run().await.unwrap_err();
    assert!(matches!(err, AppError::TokenExchange { status: 401, .. }));
}

#[tokio::test]
async fn test_full_run_writes_todays_csv() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "E2Ecode").await;

    Mock::given(method("GET"))
        .and(path("/api/v3/athlete/activities"))
        .and(header("authorization", "Bearer access-for-today"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[{"name":"Ride to work","type":"Ride","start_date":"2024-05-01T07:00:00Z","elapsed_time":1500,"distance":8000.0,"total_elevation_gain":12.0},
               {"name":"Morning Run","type":"Run","start_date":"2024-05-01T12:00:00Z","elapsed_time":1800,"distance":5000.0,"total_elevation_gain":50.0}]"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let prefix = format!("{}/runs-", dir.path().display());
    let config = test_config(&server.uri(), free_port(), prefix);
    let expected_path = config.output_path(chrono::Local::now().date_naive());

    let app = App::new(config, Arc::new(ConsentingBrowser::new("E2Ecode")));
    let outcome = app.run().await.unwrap();

    assert_eq!(outcome.export.rows_written, 1);
    assert_eq!(outcome.export.activities_seen, 2);
    assert_eq!(outcome.export.path.as_deref(), Some(expected_path.as_path()));

    let contents = std::fs::read_to_string(&expected_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].ends_with(",50.0,30:00,Run,Morning Run,3.11"), "{}", lines[1]);
}

#[tokio::test]
async fn test_full_run_with_no_activities() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "Quiet1").await;

    Mock::given(method("GET"))
        .and(path("/api/v3/athlete/activities"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let prefix = format!("{}/runs-", dir.path().display());
    let config = test_config(&server.uri(), free_port(), prefix);

    let app = App::new(config, Arc::new(ConsentingBrowser::new("Quiet1")));
    let outcome = app.run().await.unwrap();

    assert!(outcome.export.path.is_none());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_full_run_fetch_failure_writes_nothing() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "Fail503").await;

    Mock::given(method("GET"))
        .and(path("/api/v3/athlete/activities"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let prefix = format!("{}/runs-", dir.path().display());
    let config = test_config(&server.uri(), free_port(), prefix);

    let app = App::new(config, Arc::new(ConsentingBrowser::new("Fail503")));
    let err = app.run().await.unwrap_err();

    assert!(matches!(err, AppError::Fetch { status: 503, .. }));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
