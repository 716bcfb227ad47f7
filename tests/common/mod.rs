// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use std::io;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;

use strava_run_log::config::Config;
use strava_run_log::services::BrowserLauncher;

/// Reserve a free local port for the callback listener.
#[allow(dead_code)]
pub fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|l| l.local_addr())
        .map(|a| a.port())
        .expect("Failed to reserve a local port")
}

/// Config pointing every Strava endpoint at `server_uri` and the callback at `port`.
#[allow(dead_code)]
pub fn test_config(server_uri: &str, port: u16, output_prefix: String) -> Config {
    Config {
        redirect_uri: format!("http://127.0.0.1:{}/callback", port),
        callback_bind_addr: SocketAddr::from(([127, 0, 0, 1], port)),
        auth_url: format!("{}/oauth/authorize", server_uri),
        token_url: format!("{}/oauth/token", server_uri),
        api_base_url: format!("{}/api/v3", server_uri),
        auth_timeout: Some(Duration::from_secs(5)),
        output_prefix,
        ..Config::default()
    }
}

/// Pull the decoded `redirect_uri` out of an authorization URL.
#[allow(dead_code)]
pub fn redirect_uri_of(auth_url: &str) -> Option<String> {
    let query = auth_url.split_once('?')?.1;
    let encoded = query
        .split('&')
        .find_map(|pair| pair.strip_prefix("redirect_uri="))?;
    urlencoding::decode(encoded).ok().map(|s| s.into_owned())
}

/// Browser stand-in that plays the part of Strava: after "showing" the
/// consent page it redirects to the callback with a fixed code.
#[allow(dead_code)]
pub struct ConsentingBrowser {
    pub code: String,
    pub opened: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl ConsentingBrowser {
    pub fn new(code: &str) -> Self {
        Self {
            code: code.to_string(),
            opened: Mutex::new(Vec::new()),
        }
    }

    pub fn opened_urls(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl BrowserLauncher for ConsentingBrowser {
    fn open(&self, url: &str) -> io::Result<()> {
        self.opened.lock().unwrap().push(url.to_string());

        let redirect = redirect_uri_of(url)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no redirect_uri"))?;
        let callback = format!("{}?state=&code={}&scope=read,activity:read", redirect, self.code);

        tokio::spawn(async move {
            let _ = reqwest::get(callback).await;
        });
        Ok(())
    }
}

/// Browser stand-in that records the URL and never redirects.
#[allow(dead_code)]
#[derive(Default)]
pub struct IdleBrowser {
    pub opened: Mutex<Vec<String>>,
}

impl BrowserLauncher for IdleBrowser {
    fn open(&self, url: &str) -> io::Result<()> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

/// Browser stand-in that always fails to launch.
#[allow(dead_code)]
pub struct BrokenBrowser;

impl BrowserLauncher for BrokenBrowser {
    fn open(&self, _url: &str) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::NotFound, "xdg-open not found"))
    }
}
