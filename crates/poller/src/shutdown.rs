// SPDX-FileCopyrightText: 2026 Poller Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process shutdown: SIGINT or SIGTERM cancels the token the webserver (or
//! the idle `serve` loop) waits on.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Cancel the returned token on SIGINT or SIGTERM.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    cancel_when(token.clone(), wait_for_signal());
    token
}

/// Spawn a task that cancels `token` once `trigger` resolves.
///
/// The task ends early, without logging, if `token` is cancelled elsewhere.
fn cancel_when<F>(token: CancellationToken, trigger: F)
where
    F: Future<Output = &'static str> + Send + 'static,
{
    tokio::spawn(async move {
        tokio::select! {
            signal = trigger => {
                info!(signal, "shutdown requested");
                token.cancel();
            }
            _ = token.cancelled() => {
                debug!("shutdown token cancelled before any signal");
            }
        }
    });
}

/// Resolves with the name of the first termination signal received.
#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => "SIGINT",
                _ = sigterm.recv() => "SIGTERM",
            }
        }
        Err(e) => {
            warn!(error = %e, "cannot install SIGTERM handler, waiting for Ctrl+C only");
            ctrl_c_or_pending().await
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    ctrl_c_or_pending().await
}

/// A Ctrl+C handler that fails to install never fires.
async fn ctrl_c_or_pending() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    "SIGINT"
}
