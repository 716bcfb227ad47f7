// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Opening the authorization page in the user's browser.

use std::io;
use std::process::{Command, Stdio};

/// Something that can show a URL to the user.
///
/// Launching is best effort: callers treat an error as a warning.
pub trait BrowserLauncher: Send + Sync {
    fn open(&self, url: &str) -> io::Result<()>;
}

/// Launches the platform's default browser without waiting for it.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) -> io::Result<()> {
        open_command(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_child| ())
    }
}

#[cfg(target_os = "macos")]
fn open_command(url: &str) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(url);
    cmd
}

#[cfg(windows)]
fn open_command(url: &str) -> Command {
    // The empty argument is the window title `start` expects first.
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", ""]).arg(url.replace('&', "^&"));
    cmd
}

#[cfg(not(any(target_os = "macos", windows)))]
fn open_command(url: &str) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(url);
    cmd
}
