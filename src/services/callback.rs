// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Short-lived local HTTP endpoint that receives the OAuth redirect.
//!
//! Lifecycle: `Idle -> Listening -> CodeReceived -> Stopped`. The first
//! authorization code seen is handed to the waiting orchestrator over a
//! one-shot channel; later callbacks are answered but otherwise ignored.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    routing::any,
    Router,
};
use tokio::sync::{oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::error::{AppError, Result};
use crate::models::AuthorizationCode;

/// Body returned for every callback request.
pub const SUCCESS_BODY: &str = "Authorization successful! You may return to the application.";

/// How long `stop()` waits for in-flight requests before aborting the server.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Observable listener state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Idle,
    Listening,
    CodeReceived,
    Stopped,
}

/// State shared with the request handler.
struct CallbackShared {
    /// Taken by the first request carrying a code.
    code_tx: Mutex<Option<oneshot::Sender<AuthorizationCode>>>,
    state: watch::Sender<ListenerState>,
}

/// Local redirect endpoint for the authorization code flow.
pub struct CallbackListener {
    bind_addr: SocketAddr,
    path: String,
    shared: Arc<CallbackShared>,
    code_rx: Option<oneshot::Receiver<AuthorizationCode>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server: Option<JoinHandle<()>>,
    local_addr: Option<SocketAddr>,
}

impl CallbackListener {
    /// Create an idle listener for `path` on `bind_addr`.
    pub fn new(bind_addr: SocketAddr, path: impl Into<String>) -> Self {
        let mut path = path.into();
        if !path.starts_with('/') {
            path.insert(0, '/');
        }

        let (code_tx, code_rx) = oneshot::channel();
        let (state, _) = watch::channel(ListenerState::Idle);

        Self {
            bind_addr,
            path,
            shared: Arc::new(CallbackShared {
                code_tx: Mutex::new(Some(code_tx)),
                state,
            }),
            code_rx: Some(code_rx),
            shutdown_tx: None,
            server: None,
            local_addr: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ListenerState {
        *self.shared.state.borrow()
    }

    /// Address actually bound, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Router serving the callback path. Any HTTP method is accepted.
    pub fn router(&self) -> Router {
        Router::new()
            .route(&self.path, any(handle_callback))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                    .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
            )
            .with_state(self.shared.clone())
    }

    /// Bind the port and start serving in the background.
    ///
    /// Returns the bound address. Calling `start` on a running listener is a
    /// no-op; a stopped listener cannot be restarted.
    pub async fn start(&mut self) -> Result<SocketAddr> {
        if let Some(addr) = self.local_addr {
            if self.state() == ListenerState::Stopped {
                return Err(AppError::ListenerClosed);
            }
            return Ok(addr);
        }

        let listener = tokio::net::TcpListener::bind(self.bind_addr)
            .await
            .map_err(|source| AppError::ListenerBind {
                addr: self.bind_addr,
                source,
            })?;
        let local_addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = self.router();
        let shared = self.shared.clone();

        let server = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = result {
                tracing::error!(error = %e, "Callback listener failed");
            }
            // No more callbacks can arrive; wake any waiter.
            shared.code_tx.lock().await.take();
        });

        self.local_addr = Some(local_addr);
        self.shutdown_tx = Some(shutdown_tx);
        self.server = Some(server);
        self.shared.state.send_replace(ListenerState::Listening);

        tracing::info!(
            address = %local_addr,
            path = %self.path,
            "Listening for OAuth callback"
        );
        Ok(local_addr)
    }

    /// Wait for the first authorization code.
    ///
    /// With `timeout: None` this waits until a code arrives, however long
    /// that takes. On timeout the listener is stopped.
    pub async fn wait_for_code(&mut self, timeout: Option<Duration>) -> Result<AuthorizationCode> {
        let rx = self.code_rx.take().ok_or(AppError::ListenerClosed)?;

        let received = match timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(received) => received,
                Err(_) => {
                    tracing::warn!(
                        timeout_secs = limit.as_secs(),
                        "Timed out waiting for authorization code"
                    );
                    self.stop().await;
                    return Err(AppError::Timeout(limit));
                }
            },
            None => rx.await,
        };

        received.map_err(|_| AppError::ListenerClosed)
    }

    /// Shut the server down and release the port. Safe to call repeatedly.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(mut server) = self.server.take() {
            if tokio::time::timeout(SHUTDOWN_GRACE, &mut server)
                .await
                .is_err()
            {
                tracing::warn!("Callback listener did not shut down in time, aborting");
                server.abort();
            }
        }

        if self.state() != ListenerState::Stopped {
            self.shared.state.send_replace(ListenerState::Stopped);
            tracing::debug!("Callback listener stopped");
        }
    }
}

impl Drop for CallbackListener {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Redirect handler: capture `code` and answer with a fixed success page.
async fn handle_callback(
    State(shared): State<Arc<CallbackShared>>,
    RawQuery(query): RawQuery,
) -> (StatusCode, &'static str) {
    let params = parse_query_params(query.as_deref());

    if let Some(error) = params.get("error") {
        tracing::warn!(error = %error, "OAuth error from Strava");
    }

    match params.get("code") {
        Some(code) => match shared.code_tx.lock().await.take() {
            Some(tx) => {
                if tx.send(AuthorizationCode::new(code.as_str())).is_ok() {
                    shared.state.send_replace(ListenerState::CodeReceived);
                    tracing::info!("Authorization code received");
                } else {
                    tracing::debug!("Authorization code arrived after the wait ended");
                }
            }
            None => tracing::debug!("Authorization code already received, ignoring callback"),
        },
        None => tracing::warn!("Callback request without an authorization code"),
    }

    (StatusCode::OK, SUCCESS_BODY)
}

/// Split a raw query string into key/value pairs.
///
/// Values are not percent-decoded. A pair must split on `=` into exactly a
/// key and a value (trailing empty pieces ignored), so `code=` and `a=b=c`
/// are both dropped. Later duplicates overwrite earlier ones.
pub fn parse_query_params(query: Option<&str>) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let Some(query) = query else {
        return params;
    };

    for pair in query.split('&') {
        let mut parts: Vec<&str> = pair.split('=').collect();
        while parts.last().is_some_and(|p| p.is_empty()) {
            parts.pop();
        }
        if let [key, value] = parts.as_slice() {
            params.insert(key.to_string(), value.to_string());
        }
    }

    params
}
